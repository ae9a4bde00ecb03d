#[cfg(test)]
mod resolver_tests {
    use std::rc::Rc;

    use rox::ast::{Expr, ExprId, Stmt};
    use rox::console::BufferedOutput;
    use rox::interpreter::Interpreter;
    use rox::lox::parse;
    use rox::reporter::{BufferedErrorReporter, ErrorReporter};
    use rox::resolver::Resolver;

    /// Parse and resolve `source`, returning the interpreter holding the
    /// recorded distances, the statements, and every resolution message.
    fn resolve(source: &str) -> (Interpreter, Vec<Stmt>, Vec<String>) {
        let mut reporter = BufferedErrorReporter::new();
        let statements = parse(source, &mut reporter);
        assert!(!reporter.had_error(), "syntax errors: {:?}", reporter.messages());

        let mut interpreter = Interpreter::new(Rc::new(BufferedOutput::new()));
        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

        (interpreter, statements, reporter.messages())
    }

    fn errors(source: &str) -> Vec<String> {
        resolve(source).2
    }

    /// Ids of every `name` read found in blocks, expression and print
    /// statements.
    fn reads_of(statements: &[Stmt], name: &str) -> Vec<ExprId> {
        let mut ids = Vec::new();

        for stmt in statements {
            match stmt {
                Stmt::Block(inner) => ids.extend(reads_of(inner, name)),
                Stmt::Expression(Expr::Variable { id, name: token })
                | Stmt::Print(Expr::Variable { id, name: token })
                    if token.lexeme == name =>
                {
                    ids.push(*id)
                }
                _ => {}
            }
        }

        ids
    }

    #[test]
    fn test_distance_counts_enclosing_blocks() {
        let (interpreter, statements, errors) = resolve("{ var a = 1; { { print a; } } }");
        assert!(errors.is_empty());

        let ids = reads_of(&statements, "a");
        assert_eq!(ids.len(), 1);
        assert_eq!(interpreter.resolved_depth(ids[0]), Some(2));
    }

    #[test]
    fn test_shadowing_changes_distance() {
        let (interpreter, statements, _) =
            resolve("{ var a = 1; { var a = 2; { print a; } } }");

        let ids = reads_of(&statements, "a");
        assert_eq!(interpreter.resolved_depth(ids[0]), Some(1));
    }

    #[test]
    fn test_globals_are_not_recorded() {
        let (interpreter, statements, _) = resolve("var g = 1; print g; { print g; }");

        for id in reads_of(&statements, "g") {
            assert_eq!(interpreter.resolved_depth(id), None);
        }
    }

    #[test]
    fn test_self_reference_in_initializer() {
        assert!(errors("var a = 1; { var a = a; }").is_empty());
        assert!(errors("var a = 1; var a = a;").is_empty());
        assert!(errors("{ var clock = clock; }").is_empty());

        assert_eq!(
            errors("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Cannot read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_initializer_reads_the_enclosing_binding() {
        let (interpreter, statements, errors) =
            resolve("{ var a = 1; { var a = a; print a; } }");
        assert!(errors.is_empty());

        let inner: &Stmt = match &statements[0] {
            Stmt::Block(outer) => &outer[1],
            other => panic!("expected block, got {:?}", other),
        };

        let Stmt::Block(inner) = inner else {
            panic!("expected inner block");
        };

        let Stmt::Var {
            initializer: Some(Expr::Variable { id, .. }),
            ..
        } = &inner[0]
        else {
            panic!("expected var with variable initializer");
        };

        assert_eq!(interpreter.resolved_depth(*id), Some(1));
        assert_eq!(interpreter.resolved_depth(reads_of(inner, "a")[0]), Some(0));
    }

    #[test]
    fn test_duplicate_local_declaration() {
        assert_eq!(
            errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Variable with this name already declared in this scope."]
        );
        assert_eq!(
            errors("fun f(x, x) {}"),
            vec!["[line 1] Error at 'x': Variable with this name already declared in this scope."]
        );
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(
            errors("return 1;"),
            vec!["[line 1] Error at 'return': Cannot return from top-level code."]
        );
    }

    #[test]
    fn test_initializer_cannot_return_a_value() {
        assert_eq!(
            errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Cannot return a value from a constructor."]
        );

        assert!(errors("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            errors("print this;"),
            vec!["[line 1] Error at 'this': Cannot use 'this' outside of a class."]
        );
        assert_eq!(
            errors("fun f() { return this; }"),
            vec!["[line 1] Error at 'this': Cannot use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_super_misuse() {
        assert_eq!(
            errors("fun f() { super.m(); }"),
            vec!["[line 1] Error at 'super': Cannot use 'super' outside of a class."]
        );
        assert_eq!(
            errors("class A { m() { super.m(); } }"),
            vec!["[line 1] Error at 'super': Cannot use 'super' in a class with no superclass."]
        );
        assert!(errors("class A {} class B < A { m() { super.m(); } }").is_empty());
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(
            errors("break;"),
            vec!["[line 1] Error at 'break': Cannot break outside of a loop."]
        );
        assert!(errors("while (true) { if (true) break; }").is_empty());
        assert!(errors("for (;;) { { break; } }").is_empty());
    }

    #[test]
    fn test_break_does_not_cross_function_boundary() {
        assert_eq!(
            errors("while (true) { fun f() { break; } }"),
            vec!["[line 1] Error at 'break': Cannot break outside of a loop."]
        );
    }

    #[test]
    fn test_every_error_is_reported_in_one_pass() {
        let messages = errors("return;\nbreak;\nprint this;");

        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("[line 1]"));
        assert!(messages[1].starts_with("[line 2]"));
        assert!(messages[2].starts_with("[line 3]"));
    }
}
