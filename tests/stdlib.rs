#[cfg(test)]
mod stdlib_tests {
    use std::rc::Rc;

    use rox::console::{BufferedOutput, ScriptedInput};
    use rox::lox::{Lox, RunStatus};
    use rox::reporter::BufferedErrorReporter;

    /// Run `source` with `input` queued for the `Input` builtin.
    fn run_with_input(source: &str, input: &[&str]) -> (RunStatus, Rc<BufferedOutput>, Vec<String>) {
        let output = Rc::new(BufferedOutput::new());
        let lines = Rc::new(ScriptedInput::new(input.iter().copied()));
        let mut session = Lox::with_input(output.clone(), lines);
        let mut reporter = BufferedErrorReporter::new();

        let status = session.run(source, &mut reporter);

        (status, output, reporter.messages())
    }

    fn run(source: &str) -> (RunStatus, Vec<String>, Vec<String>) {
        let (status, output, errors) = run_with_input(source, &[]);
        (status, output.lines(), errors)
    }

    #[test]
    fn test_array_push_get_length_pop() {
        let (status, lines, errors) = run(
            "var a = Array();\n\
             print a.length();\n\
             a.push(1); a.push(\"two\"); a.push(nil);\n\
             print a.length();\n\
             print a.get(1);\n\
             print a.pop();\n\
             print a.pop();\n\
             print a.length();",
        );

        assert_eq!(status, RunStatus::Ok, "{:?}", errors);
        assert_eq!(lines, vec!["0", "3", "two", "nil", "two", "1"]);
    }

    #[test]
    fn test_pop_on_empty_array_is_nil() {
        let (_, lines, errors) = run("print Array().pop();");

        assert!(errors.is_empty());
        assert_eq!(lines, vec!["nil"]);
    }

    #[test]
    fn test_arrays_do_not_share_storage() {
        let (_, lines, _) = run(
            "var a = Array(); var b = Array();\n\
             a.push(1); a.push(2); b.push(3);\n\
             print a.length(); print b.length();",
        );

        assert_eq!(lines, vec!["2", "1"]);
    }

    #[test]
    fn test_array_index_errors() {
        let (status, _, errors) = run("var a = Array(); a.push(1);\na.get(1);");

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(errors, vec!["Array index 1 out of bounds.\n[line 2]"]);

        let (_, _, errors) = run("Array().get(\"0\");");
        assert_eq!(errors, vec!["Array index must be a number.\n[line 1]"]);
    }

    #[test]
    fn test_array_methods_check_arity() {
        let (_, _, errors) = run("Array().push();");

        assert_eq!(errors, vec!["Expected 1 arguments but got 0.\n[line 1]"]);
    }

    #[test]
    fn test_array_method_is_bound() {
        let (_, lines, _) = run(
            "var a = Array();\n\
             var push = a.push;\n\
             push(42);\n\
             print a.get(0);\n\
             print push;",
        );

        assert_eq!(lines, vec!["42", "<native fn push>"]);
    }

    #[test]
    fn test_native_class_display() {
        let (_, lines, _) = run("print Array; print Array(); print Input;");

        assert_eq!(lines, vec!["Array", "Array instance", "Input"]);
    }

    #[test]
    fn test_input_string_and_number() {
        let (status, output, errors) = run_with_input(
            "var input = Input();\n\
             var name = input.string(\"Name: \");\n\
             var age = input.number(\"Age: \");\n\
             print name + \" is \" + \"old\";\n\
             print age + 1;",
            &["Ada", " 36 "],
        );

        assert_eq!(status, RunStatus::Ok, "{:?}", errors);
        assert_eq!(output.prompts(), vec!["Name: ", "Age: "]);
        assert_eq!(output.lines(), vec!["Ada is old", "37"]);
    }

    #[test]
    fn test_input_number_rejects_text() {
        let (status, _, errors) =
            run_with_input("Input().number(\"n? \");", &["twelve"]);

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(errors, vec!["Input 'twelve' is not a number.\n[line 1]"]);
    }

    #[test]
    fn test_input_number_rejects_non_finite_words() {
        for word in ["inf", "-infinity", "NaN"] {
            let (status, _, errors) = run_with_input("Input().number(\"n? \");", &[word]);

            assert_eq!(status, RunStatus::RuntimeError);
            assert_eq!(
                errors,
                vec![format!("Input '{}' is not a number.\n[line 1]", word)]
            );
        }
    }

    #[test]
    fn test_input_at_end_of_stream() {
        let (status, _, errors) = run_with_input("Input().string(\"> \");", &[]);

        assert_eq!(status, RunStatus::RuntimeError);
        assert_eq!(errors, vec!["Unexpected end of input.\n[line 1]"]);
    }

    #[test]
    fn test_clock_is_seconds_since_epoch() {
        let (status, lines, _) = run(
            "var start = clock();\n\
             print start > 1000000000;\n\
             print clock() >= start;",
        );

        assert_eq!(status, RunStatus::Ok);
        assert_eq!(lines, vec!["true", "true"]);
    }

    #[test]
    fn test_builtins_can_be_shadowed() {
        let (_, lines, _) = run("{ var clock = \"mine\"; print clock; } print clock;");

        assert_eq!(lines, vec!["mine", "<native fn clock>"]);
    }
}
