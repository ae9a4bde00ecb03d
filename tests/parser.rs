#[cfg(test)]
mod parser_tests {
    use rox::ast::{Expr, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::lox::parse;
    use rox::reporter::{BufferedErrorReporter, ErrorReporter};

    /// Parse `source`, asserting that it is error free.
    fn parse_ok(source: &str) -> Vec<Stmt> {
        let mut reporter = BufferedErrorReporter::new();
        let statements = parse(source, &mut reporter);

        assert!(
            !reporter.had_error(),
            "unexpected errors: {:?}",
            reporter.messages()
        );

        statements
    }

    fn printed(source: &str) -> Vec<String> {
        parse_ok(source).iter().map(AstPrinter::print_stmt).collect()
    }

    fn errors(source: &str) -> Vec<String> {
        let mut reporter = BufferedErrorReporter::new();
        parse(source, &mut reporter);
        reporter.messages()
    }

    #[test]
    fn test_binary_operators_are_left_associative() {
        assert_eq!(printed("1 - 2 - 3;"), vec!["(; (- (- 1.0 2.0) 3.0))"]);
        assert_eq!(printed("8 / 4 / 2;"), vec!["(; (/ (/ 8.0 4.0) 2.0))"]);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            printed("print 1 + 2 * 3 == 7 and !false or nil;"),
            vec!["(print (or (and (== (+ 1.0 (* 2.0 3.0)) 7.0) (! false)) nil))"]
        );
        assert_eq!(printed("-(1 + 2);"), vec!["(; (- (group (+ 1.0 2.0))))"]);
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 3;"), vec!["(; (= a (= b 3.0)))"]);
    }

    #[test]
    fn test_calls_and_properties() {
        assert_eq!(
            printed("a.b(1, \"x\").c = d;"),
            vec!["(; (.= (call (. a b) 1.0 x) c d))"]
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );

        // Missing clauses: no initializer block, condition defaults to `true`.
        assert_eq!(
            printed("for (;;) break;"),
            vec!["(while true (break))"]
        );
    }

    #[test]
    fn test_class_and_function_declarations() {
        assert_eq!(
            printed("class B < A { init(x) { this.x = x; } get() { return super.get(); } }"),
            vec!["(class B < A (init(x) (; (.= this x x))) (get() (return (call (super get)))))"]
        );
        assert_eq!(
            printed("fun add(a, b) { return a + b; }"),
            vec!["(fun add(a b) (return (+ a b)))"]
        );
    }

    #[test]
    fn test_variable_nodes_get_distinct_ids() {
        let statements = parse_ok("a; a;");

        let ids: Vec<_> = statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => Some(*id),
                _ => None,
            })
            .collect();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_invalid_assignment_target_is_not_fatal() {
        let mut reporter = BufferedErrorReporter::new();
        let statements = parse("1 + 2 = 3; print 4;", &mut reporter);

        assert_eq!(
            reporter.messages(),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_synchronize_reports_every_statement_error() {
        let source = "var = 1;\nprint 2;\nprint (3;\nvar ok = 4;";

        assert_eq!(
            errors(source),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect ')' after expression.",
            ]
        );

        let mut reporter = BufferedErrorReporter::new();
        let statements = parse(source, &mut reporter);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(
            errors("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_argument_and_parameter_cap() {
        let eight = "f(1, 2, 3, 4, 5, 6, 7, 8);";
        assert!(errors(eight).is_empty());

        let nine = "f(1, 2, 3, 4, 5, 6, 7, 8, 9);";
        assert_eq!(
            errors(nine),
            vec!["[line 1] Error at '9': Cannot have more than 8 arguments."]
        );

        let params = "fun f(a, b, c, d, e, f, g, h, i) {}";
        assert_eq!(
            errors(params),
            vec!["[line 1] Error at 'i': Cannot have more than 8 parameters."]
        );
    }

    #[test]
    fn test_missing_superclass_method_name() {
        assert_eq!(
            errors("print super.;"),
            vec!["[line 1] Error at ';': Expect superclass method name."]
        );
    }
}
