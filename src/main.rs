use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast::Stmt;
use rox::ast_printer::AstPrinter;
use rox::console::{LineSource, Output, StdOutput, StdinSource};
use rox::lox::{self, Lox, RunStatus};
use rox::reporter::{BufferedErrorReporter, ErrorReporter};
use rox::scanner::Scanner;
use rox::token::Token;

/// Words that end a REPL session.
const QUIT_WORDS: [&str; 4] = ["quit", "exit", "q", ":q"];

/// Stack for the thread that runs a session; sized so that
/// `DEFAULT_MAX_CALL_DEPTH` nested calls fit in an unoptimised build.
const SESSION_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a Lox program and prints the AST of each statement
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive session (the default)
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // `[module:line] - message`, written to app.log
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print every buffered diagnostic as one block on stderr.
fn flush_errors(output: &dyn Output, reporter: &BufferedErrorReporter) {
    if !reporter.is_empty() {
        output.print_error(&reporter.messages().join("\n"));
    }
}

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");

    let source: String = read_file(filename)?;
    let mut reporter = BufferedErrorReporter::new();
    let tokens: Vec<Token> = Scanner::new(&source).scan_tokens(&mut reporter);

    if json {
        let rendered: String =
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    } else {
        for token in &tokens {
            debug!("Scanned token: {}", token);
            println!("{}", token);
        }
    }

    flush_errors(&StdOutput, &reporter);

    if reporter.had_error() {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(RunStatus::SyntaxError.exit_code());
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: PathBuf) -> Result<()> {
    info!("Running Parse subcommand");

    let source: String = read_file(filename)?;
    let mut reporter = BufferedErrorReporter::new();
    let statements: Vec<Stmt> = lox::parse(&source, &mut reporter);

    if reporter.had_error() {
        flush_errors(&StdOutput, &reporter);
        std::process::exit(RunStatus::SyntaxError.exit_code());
    }

    for stmt in &statements {
        let ast_str: String = AstPrinter::print_stmt(stmt);
        debug!("AST: {}", ast_str);
        println!("{}", ast_str);
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run(filename: PathBuf) -> Result<()> {
    info!("Running Run subcommand");

    let source: String = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let output: Rc<dyn Output> = Rc::new(StdOutput);
    let mut session = Lox::new(Rc::clone(&output));
    let mut reporter = BufferedErrorReporter::new();

    let status: RunStatus = session.run(&source, &mut reporter);
    flush_errors(output.as_ref(), &reporter);

    if status != RunStatus::Ok {
        debug!("Run finished with {:?}", status);
        std::process::exit(status.exit_code());
    }

    info!("Program executed successfully");
    Ok(())
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let output: Rc<dyn Output> = Rc::new(StdOutput);
    let input = StdinSource;
    let mut session = Lox::new(Rc::clone(&output));
    let mut reporter = BufferedErrorReporter::new();
    let mut buffer: String = String::new();

    output.print("Lox REPL, type quit to quit.");

    loop {
        output.prompt(if buffer.is_empty() { "> " } else { ". " });

        let Some(line) = input.read_line().context("Failed to read from stdin")? else {
            break;
        };

        if buffer.is_empty() && QUIT_WORDS.contains(&line.trim()) {
            break;
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&line);

        // Lexical errors are reported when the unit actually runs.
        let tokens: Vec<Token> =
            Scanner::new(&buffer).scan_tokens(&mut BufferedErrorReporter::new());

        if !lox::is_complete_unit(&tokens) {
            continue;
        }

        let status: RunStatus = session.run(&buffer, &mut reporter);
        debug!("REPL unit finished with {:?}", status);

        flush_errors(output.as_ref(), &reporter);
        reporter.clear();
        buffer.clear();
    }

    output.print("Bye!");

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(64);
        }
        Err(e) => e.exit(),
    };

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let session = thread::Builder::new()
        .name("lox-session".to_string())
        .stack_size(SESSION_STACK_SIZE)
        .spawn(move || match args.commands {
            Some(Commands::Tokenize { filename, json }) => tokenize(filename, json),
            Some(Commands::Parse { filename }) => parse(filename),
            Some(Commands::Run { filename }) => run(filename),
            Some(Commands::Repl) | None => repl(),
        })
        .context("Failed to start the session thread")?;

    match session.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
