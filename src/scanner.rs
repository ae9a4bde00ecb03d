//! Module `scanner` implements a one‑pass, streaming lexer for the Lox language.
//!
//! It transforms source text into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, LoxError>` on each `.next()`, where `Ok(token)` is a
//!   scanned token and `Err` reports a lexing error with line information.
//!   Errors never stop the scan: the offending input is skipped and the next
//!   call resumes after it.
//!
//! - `Scanner::scan_tokens(reporter)`
//!   Batch form: forwards every lexing error to an [`ErrorReporter`] and
//!   returns the well‑formed tokens, always ending in `EOF`.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`.
//! - Two‑character operators (maximal munch): `!=`, `==`, `<=`, `>=`.
//! - Comments: `//` to end of line, `/* … */` blocks (may span lines).
//! - String literals: `"` … `"`, allowing multi‑line; unterminated strings are
//!   reported and produce no token.
//! - Numeric literals: digits with an optional `.` followed by at least one digit.
//! - Identifiers/keywords: alphanumeric/_ runs, resolved via a perfect‑hash
//!   `KEYWORDS` map.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let scanner = Scanner::new("print 123; // example");
//! for result in scanner {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::reporter::ErrorReporter;
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"break"  => TokenType::BREAK,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a str,               // entire source text
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    /// Drain the scanner, reporting every lexical error and returning the
    /// recognised tokens (the last one is always `EOF`).
    pub fn scan_tokens(self, reporter: &mut dyn ErrorReporter) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();

        for result in self {
            match result {
                Ok(token) => tokens.push(token),

                Err(LoxError::Lex { message, line }) => reporter.at_line(line, &message),

                Err(other) => unreachable!("scanner produced a non-lexical error: {}", other),
            }
        }

        info!("Scanned {} tokens", tokens.len());

        tokens
    }

    // ───────────────────────────── byte cursor ──────────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Byte `offset` positions past the cursor, or `0` beyond the input.
    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes().get(self.curr + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    /// Consume one byte.  Callers check [`is_at_end`](Self::is_at_end) first.
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b: u8 = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Consume bytes while `keep` holds; stops at end of input.
    #[inline(always)]
    fn advance_while(&mut self, keep: impl Fn(u8) -> bool) {
        while !self.is_at_end() && keep(self.peek()) {
            self.curr += 1;
        }
    }

    /// Pick `matched` and consume the `=` if one follows, else `single`.
    #[inline(always)]
    fn with_equal(&mut self, matched: TokenType, single: TokenType) -> TokenType {
        if self.peek() == b'=' {
            self.curr += 1;
            matched
        } else {
            single
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan one lexeme starting at `self.start`.  A recognised token kind is
    /// left in `self.pending`; whitespace and comments leave it `None`.
    fn scan_token(&mut self) -> Result<()> {
        use TokenType::*;

        let kind: TokenType = match self.advance() {
            b'(' => LEFT_PAREN,
            b')' => RIGHT_PAREN,
            b'{' => LEFT_BRACE,
            b'}' => RIGHT_BRACE,
            b',' => COMMA,
            b'.' => DOT,
            b'-' => MINUS,
            b'+' => PLUS,
            b';' => SEMICOLON,
            b'*' => STAR,

            b'!' => self.with_equal(BANG_EQUAL, BANG),
            b'=' => self.with_equal(EQUAL_EQUAL, EQUAL),
            b'<' => self.with_equal(LESS_EQUAL, LESS),
            b'>' => self.with_equal(GREATER_EQUAL, GREATER),

            b'/' if self.peek() == b'/' => {
                // Line comment: jump to the newline (or EOF) with memchr.
                let rest: &[u8] = &self.bytes()[self.curr..];
                self.curr += memchr(b'\n', rest).unwrap_or(rest.len());
                return Ok(());
            }
            b'/' if self.peek() == b'*' => {
                self.curr += 1;
                return self.skip_block_comment();
            }
            b'/' => SLASH,

            b' ' | b'\r' | b'\t' => return Ok(()),
            b'\n' => {
                self.line += 1;
                return Ok(());
            }

            b'"' => return self.parse_string(),
            b'0'..=b'9' => self.parse_number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            _ => {
                // Skip the whole UTF‑8 sequence so the next lexeme starts on
                // a char boundary.
                let c: char = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.curr = self.start + c.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: '{}'", c),
                ));
            }
        };

        self.pending = Some(kind);

        Ok(())
    }

    /// Skip a `/* … */` comment.  `self.curr` is just past the opening `/*`.
    /// The comment ends at the first `*/` pair.
    fn skip_block_comment(&mut self) -> Result<()> {
        let rest: &[u8] = &self.bytes()[self.curr..];

        let end: Option<usize> = memchr_iter(b'*', rest).find(|&i| rest.get(i + 1) == Some(&b'/'));

        let consumed: usize = end.map_or(rest.len(), |i| i + 2);
        self.line += memchr_iter(b'\n', &rest[..consumed]).count();
        self.curr += consumed;

        match end {
            Some(_) => Ok(()),
            None => Err(LoxError::lex(self.line, "Unterminated block comment.")),
        }
    }

    /// String literal; `self.start` is on the opening quote.  Strings may
    /// span lines and have no escape sequences.
    fn parse_string(&mut self) -> Result<()> {
        let body: &[u8] = &self.bytes()[self.curr..];

        let Some(close) = memchr(b'"', body) else {
            self.line += memchr_iter(b'\n', body).count();
            self.curr = self.src.len();
            return Err(LoxError::lex(self.line, "Unterminated string."));
        };

        self.line += memchr_iter(b'\n', &body[..close]).count();
        self.curr += close + 1;

        // Both quotes are ASCII, so these are char boundaries.
        let contents: &str = &self.src[self.start + 1..self.curr - 1];
        self.pending = Some(TokenType::STRING(contents.to_owned()));

        Ok(())
    }

    /// Number literal: digits, then optionally `.` and at least one digit.
    /// A trailing `.` is left for the next token.
    fn parse_number(&mut self) -> TokenType {
        self.advance_while(|b| b.is_ascii_digit());

        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.curr += 1;
            self.advance_while(|b| b.is_ascii_digit());
        }

        let text: &str = &self.src[self.start..self.curr];
        // ASCII digits with at most one interior dot always parse.
        let value: f64 = text.parse::<f64>().unwrap_or_default();

        TokenType::NUMBER(value)
    }

    /// Identifier or keyword.
    fn parse_identifier(&mut self) -> TokenType {
        self.advance_while(|b| b.is_ascii_alphanumeric() || b == b'_');

        let word: &[u8] = &self.bytes()[self.start..self.curr];

        KEYWORDS
            .get(word)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let lex: &str = &self.src[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lex, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
