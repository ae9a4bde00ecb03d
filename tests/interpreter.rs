#[cfg(test)]
mod interpreter_tests {
    use std::rc::Rc;

    use rox::console::BufferedOutput;
    use rox::lox::{Lox, RunStatus};
    use rox::reporter::BufferedErrorReporter;

    struct Outcome {
        status: RunStatus,
        lines: Vec<String>,
        errors: Vec<String>,
    }

    fn run(source: &str) -> Outcome {
        let output = Rc::new(BufferedOutput::new());
        let mut session = Lox::new(output.clone());
        let mut reporter = BufferedErrorReporter::new();

        let status = session.run(source, &mut reporter);

        Outcome {
            status,
            lines: output.lines(),
            errors: reporter.messages(),
        }
    }

    /// Run a program expected to succeed and return its printed lines.
    fn output_of(source: &str) -> Vec<String> {
        let outcome = run(source);

        assert_eq!(
            outcome.status,
            RunStatus::Ok,
            "errors: {:?}",
            outcome.errors
        );

        outcome.lines
    }

    #[test]
    fn test_shadowed_block_variable() {
        assert_eq!(
            output_of("var a = 1; { var a = 2; print a; } print a;"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_initializer_sees_outer_binding() {
        assert_eq!(
            output_of("var a = 1; { var a = a + 1; print a; } print a;"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(output_of("print 1 - 2 - 3;"), vec!["-4"]);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(
            output_of(
                "print nil; print true; print 2.5; print 10 / 4; print 3; print \"raw\";\n\
                 fun f() {} print f; print clock;\n\
                 class C {} print C; print C();"
            ),
            vec![
                "nil",
                "true",
                "2.5",
                "2.5",
                "3",
                "raw",
                "<fn f>",
                "<native fn clock>",
                "C",
                "C instance",
            ]
        );
    }

    #[test]
    fn test_truthiness_and_logic() {
        assert_eq!(
            output_of(
                "if (0) print \"zero\"; if (\"\") print \"empty\"; if (nil) print \"nil\";\n\
                 print nil or \"default\"; print false and 1; print 1 and 2;"
            ),
            vec!["zero", "empty", "default", "false", "2"]
        );
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_eq!(
            output_of("print 1 == \"1\"; print nil == false; print nil == nil; print \"a\" + \"b\" == \"ab\";"),
            vec!["false", "false", "true", "true"]
        );
    }

    #[test]
    fn test_closures_capture_by_reference() {
        assert_eq!(
            output_of(
                "var x = \"before\";\n\
                 fun show() { print x; }\n\
                 x = \"after\";\n\
                 show();"
            ),
            vec!["after"]
        );
    }

    #[test]
    fn test_counter_closure_keeps_its_environment() {
        assert_eq!(
            output_of(
                "fun makeCounter() {\n\
                   var i = 0;\n\
                   fun count() { i = i + 1; return i; }\n\
                   return count;\n\
                 }\n\
                 var a = makeCounter(); var b = makeCounter();\n\
                 print a(); print a(); print b();"
            ),
            vec!["1", "2", "1"]
        );
    }

    #[test]
    fn test_closure_binding_is_static() {
        // The closure keeps reading the global even after a local shadows it.
        assert_eq!(
            output_of(
                "var a = \"global\";\n\
                 {\n\
                   fun show() { print a; }\n\
                   show();\n\
                   var a = \"block\";\n\
                   show();\n\
                 }"
            ),
            vec!["global", "global"]
        );
    }

    #[test]
    fn test_break_exits_only_the_nearest_loop() {
        assert_eq!(
            output_of(
                "var i = 0;\n\
                 while (i < 2) {\n\
                   var j = 0;\n\
                   while (true) {\n\
                     if (j == 2) break;\n\
                     print i * 10 + j;\n\
                     j = j + 1;\n\
                   }\n\
                   i = i + 1;\n\
                 }\n\
                 print \"done\";"
            ),
            vec!["0", "1", "10", "11", "done"]
        );
    }

    #[test]
    fn test_for_loop_with_break() {
        assert_eq!(
            output_of("for (var i = 0; i < 10; i = i + 1) { if (i == 3) break; print i; }"),
            vec!["0", "1", "2"]
        );
    }

    #[test]
    fn test_return_unwinds_loops() {
        assert_eq!(
            output_of(
                "fun find() { for (var i = 0;; i = i + 1) { if (i * i > 10) return i; } }\n\
                 print find();"
            ),
            vec!["4"]
        );
    }

    #[test]
    fn test_recursion() {
        assert_eq!(
            output_of("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(15);"),
            vec!["610"]
        );
    }

    #[test]
    fn test_runaway_recursion_is_a_runtime_error() {
        let output = Rc::new(BufferedOutput::new());
        let mut session = Lox::new(output.clone());
        session.set_max_call_depth(64);

        let mut reporter = BufferedErrorReporter::new();
        let status = session.run("fun f(n) { return f(n + 1); }\nf(0);", &mut reporter);

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(reporter.messages(), vec!["Stack overflow.\n[line 1]"]);

        // The depth counter unwinds with the error.
        let mut reporter = BufferedErrorReporter::new();
        let status = session.run(
            "fun down(n) { if (n == 0) return 0; return down(n - 1) + 1; }\nprint down(60);",
            &mut reporter,
        );

        assert_eq!(status, RunStatus::Ok, "{:?}", reporter.messages());
        assert_eq!(output.lines(), vec!["60"]);
    }

    #[test]
    fn test_default_call_depth_fits_a_large_stack() {
        let outcome = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let outcome = run("fun f(n) { if (n == 0) return 0; return f(n - 1) + 1; }\n\
                                   print f(900);\n\
                                   f(5000);");
                (outcome.status, outcome.lines, outcome.errors)
            })
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(outcome.0, RunStatus::RuntimeError);
        assert_eq!(outcome.1, vec!["900"]);
        assert_eq!(outcome.2, vec!["Stack overflow.\n[line 1]"]);
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() { 1; } print f();"), vec!["nil"]);
    }

    #[test]
    fn test_division_by_zero_halts() {
        let outcome = run("print \"before\";\n1 / 0;\nprint \"after\";");

        assert_eq!(outcome.status, RunStatus::RuntimeError);
        assert_eq!(outcome.lines, vec!["before"]);
        assert_eq!(outcome.errors, vec!["Division by zero.\n[line 2]"]);
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(
            run("-\"x\";").errors,
            vec!["Operand must be a number.\n[line 1]"]
        );
        assert_eq!(
            run("1 < \"x\";").errors,
            vec!["Operands must be numbers.\n[line 1]"]
        );
        assert_eq!(
            run("1 + \"x\";").errors,
            vec!["Operands must be two numbers or two strings.\n[line 1]"]
        );
    }

    #[test]
    fn test_undefined_variable() {
        let outcome = run("print missing;");

        assert_eq!(outcome.status, RunStatus::RuntimeError);
        assert_eq!(outcome.errors, vec!["Undefined variable 'missing'.\n[line 1]"]);

        assert_eq!(
            run("missing = 1;").errors,
            vec!["Undefined variable 'missing'.\n[line 1]"]
        );
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            run("\"text\"();").errors,
            vec!["Can only call functions and classes.\n[line 1]"]
        );
        assert_eq!(
            run("fun f(a, b) {} f(1);").errors,
            vec!["Expected 2 arguments but got 1.\n[line 1]"]
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            run("var x = 1; print x.y;").errors,
            vec!["Only instances have properties.\n[line 1]"]
        );
        assert_eq!(
            run("var x = 1; x.y = 2;").errors,
            vec!["Only instances have fields.\n[line 1]"]
        );
        assert_eq!(
            run("class A {} print A().nope;").errors,
            vec!["Undefined property 'nope'.\n[line 1]"]
        );
    }

    #[test]
    fn test_syntax_error_prevents_execution() {
        let outcome = run("print \"side effect\";\nprint ;");

        assert_eq!(outcome.status, RunStatus::SyntaxError);
        assert!(outcome.lines.is_empty());
        assert_eq!(
            outcome.errors,
            vec!["[line 2] Error at ';': Expect expression."]
        );
    }

    #[test]
    fn test_resolution_error_prevents_execution() {
        let outcome = run("print \"side effect\";\nreturn 1;");

        assert_eq!(outcome.status, RunStatus::SyntaxError);
        assert!(outcome.lines.is_empty());
    }

    #[test]
    fn test_fields_and_methods() {
        assert_eq!(
            output_of(
                "class Point {\n\
                   init(x, y) { this.x = x; this.y = y; }\n\
                   sum() { return this.x + this.y; }\n\
                 }\n\
                 var p = Point(2, 3);\n\
                 print p.sum();\n\
                 p.x = 10;\n\
                 print p.sum();"
            ),
            vec!["5", "13"]
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_eq!(
            output_of(
                "class A { m() { return \"method\"; } }\n\
                 var a = A();\n\
                 a.m = \"field\";\n\
                 print a.m;"
            ),
            vec!["field"]
        );
    }

    #[test]
    fn test_bound_method_remembers_this() {
        assert_eq!(
            output_of(
                "class Greeter { init(name) { this.name = name; } hi() { print \"hi \" + this.name; } }\n\
                 var hi = Greeter(\"bob\").hi;\n\
                 hi();"
            ),
            vec!["hi bob"]
        );
    }

    #[test]
    fn test_inheritance_and_super() {
        assert_eq!(
            output_of(
                "class A { greet() { return \"A\"; } }\n\
                 class B < A { greet() { return super.greet() + \"B\"; } }\n\
                 print B().greet();"
            ),
            vec!["AB"]
        );
    }

    #[test]
    fn test_dynamic_dispatch_through_superclass_method() {
        assert_eq!(
            output_of(
                "class Animal {\n\
                   speak() { return \"...\"; }\n\
                   describe() { return \"says \" + this.speak(); }\n\
                 }\n\
                 class Dog < Animal {\n\
                   speak() { return \"woof\"; }\n\
                   describe() { return \"dog \" + super.describe(); }\n\
                 }\n\
                 print Dog().describe();"
            ),
            vec!["dog says woof"]
        );
    }

    #[test]
    fn test_inherited_methods_and_initializer() {
        assert_eq!(
            output_of(
                "class Base { init(n) { this.n = n; } get() { return this.n; } }\n\
                 class Derived < Base {}\n\
                 print Derived(7).get();"
            ),
            vec!["7"]
        );
    }

    #[test]
    fn test_constructor_returns_instance() {
        assert_eq!(
            output_of(
                "class A {\n\
                   init() { this.v = 1; return; this.v = 2; }\n\
                 }\n\
                 var a = A();\n\
                 print a.v;\n\
                 print a.init();\n\
                 print a.init() == a;"
            ),
            vec!["1", "A instance", "true"]
        );
    }

    #[test]
    fn test_class_arity_follows_init() {
        assert_eq!(
            run("class A { init(a) {} } A();").errors,
            vec!["Expected 1 arguments but got 0.\n[line 1]"]
        );
        assert_eq!(
            run("class A {} A(1);").errors,
            vec!["Expected 0 arguments but got 1.\n[line 1]"]
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let outcome = run("var NotAClass = 1;\nclass B < NotAClass {}");

        assert_eq!(outcome.status, RunStatus::RuntimeError);
        assert_eq!(outcome.errors, vec!["Superclass must be a class.\n[line 2]"]);
    }

    #[test]
    fn test_class_can_reference_itself_in_methods() {
        assert_eq!(
            output_of(
                "class Node { make() { return Node(); } }\n\
                 print Node().make();"
            ),
            vec!["Node instance"]
        );
    }

    #[test]
    fn test_environment_restored_after_runtime_error() {
        let output = Rc::new(BufferedOutput::new());
        let mut session = Lox::new(output.clone());

        let mut reporter = BufferedErrorReporter::new();
        let status = session.run("var a = \"global\"; { var a = \"local\"; 1 / 0; }", &mut reporter);
        assert_eq!(status, RunStatus::RuntimeError);

        let mut reporter = BufferedErrorReporter::new();
        let status = session.run("print a;", &mut reporter);

        assert_eq!(status, RunStatus::Ok);
        assert_eq!(output.lines(), vec!["global"]);
    }

    #[test]
    fn test_session_state_persists_between_runs() {
        let output = Rc::new(BufferedOutput::new());
        let mut session = Lox::new(output.clone());
        let mut reporter = BufferedErrorReporter::new();

        session.run("fun add(a, b) { return a + b; }", &mut reporter);
        session.run("var total = add(1, 2);", &mut reporter);
        session.run("{ var local = total; print add(local, 1); }", &mut reporter);

        assert!(reporter.is_empty());
        assert_eq!(output.lines(), vec!["4"]);
    }
}
