#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;
    use rox as lox;

    use lox::Outcome;

    /// Run a whole program, returning what it printed and how it ended.
    fn run(source: &str) -> (String, Outcome) {
        let mut out: Vec<u8> = Vec::new();
        let outcome = lox::run(source, &mut out);

        (String::from_utf8(out).expect("output is UTF-8"), outcome)
    }

    fn output_of(source: &str) -> String {
        let (output, outcome) = run(source);
        assert!(
            outcome.is_success(),
            "program failed: {:?}",
            outcome.diagnostics()
        );
        output
    }

    /// Run a program expected to abort at runtime; returns the printed
    /// output and the rendered error.
    fn runtime_failure(source: &str) -> (String, String) {
        let (output, outcome) = run(source);

        assert_eq!(outcome.exit_code(), 70, "{:?}", outcome);

        let Outcome::RuntimeError(error) = outcome else {
            unreachable!()
        };

        (output, error.to_string())
    }

    #[test]
    fn test_interpreter_01_arithmetic_and_strings() {
        assert_eq!(
            output_of(
                "print 1 + 1;\n\
                 print \"a\" + \"b\";\n\
                 print 10 / 4;\n\
                 print 7 % 3;\n\
                 print -(2 * 3);\n\
                 print 1 < 2;\n\
                 print 2 <= 1;"
            ),
            "2\nab\n2.5\n1\n-6\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_interpreter_02_equality() {
        assert_eq!(
            output_of(
                "class A {}\n\
                 var a = A();\n\
                 print 1 == 1;\n\
                 print \"a\" == \"a\";\n\
                 print nil == nil;\n\
                 print 1 == \"1\";\n\
                 print nil == false;\n\
                 print a == a;\n\
                 print A() == A();"
            ),
            "true\ntrue\ntrue\nfalse\nfalse\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_interpreter_03_truthiness_and_logic() {
        assert_eq!(
            output_of(
                "if (0) print \"zero\";\n\
                 if (\"\") print \"empty\";\n\
                 if (nil) print \"nil\"; else print \"no\";\n\
                 print !nil;\n\
                 print nil or \"x\";\n\
                 print 1 and 2;\n\
                 print false and 1;\n\
                 print nil or false;"
            ),
            "zero\nempty\nno\ntrue\nx\n2\nfalse\nfalse\n"
        );
    }

    #[test]
    fn test_interpreter_04_short_circuit_skips_right_operand() {
        assert_eq!(
            output_of(
                "fun boom() { print \"boom\"; return true; }\n\
                 print true or boom();\n\
                 print false and boom();"
            ),
            "true\nfalse\n"
        );
    }

    #[test]
    fn test_interpreter_05_shadowing() {
        assert_eq!(
            output_of("var a = 1;\n{ var a = 2; print a; }\nprint a;"),
            "2\n1\n"
        );
        assert_eq!(
            output_of("var a = 1;\n{ var a = 2; a = 3; print a; }\nprint a;"),
            "3\n1\n"
        );
    }

    #[test]
    fn test_interpreter_06_closure_counter() {
        assert_eq!(
            output_of(
                "fun makeCounter() {\n\
                   var i = 0;\n\
                   fun count() { i = i + 1; return i; }\n\
                   return count;\n\
                 }\n\
                 var counter = makeCounter();\n\
                 print counter();\n\
                 print counter();"
            ),
            "1\n2\n"
        );
    }

    #[test]
    fn test_interpreter_07_closures_bind_statically() {
        assert_eq!(
            output_of(
                "var a = \"global\";\n\
                 {\n\
                   fun showA() { print a; }\n\
                   showA();\n\
                   var a = \"block\";\n\
                   showA();\n\
                 }"
            ),
            "global\nglobal\n"
        );
    }

    #[test]
    fn test_interpreter_08_control_flow() {
        assert_eq!(
            output_of(
                "var sum = 0;\n\
                 for (var i = 1; i <= 4; i = i + 1) sum = sum + i;\n\
                 print sum;\n\
                 var n = 3;\n\
                 while (n > 0) { print n; n = n - 1; }"
            ),
            "10\n3\n2\n1\n"
        );
    }

    #[test]
    fn test_interpreter_09_recursion() {
        assert_eq!(
            output_of(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
                 print fib(15);"
            ),
            "610\n"
        );
    }

    #[test]
    fn test_interpreter_10_return_restores_frames() {
        assert_eq!(
            output_of(
                "var x = \"outer\";\n\
                 fun f() { { var x = \"inner\"; while (true) { return x; } } }\n\
                 print f();\n\
                 print x;\n\
                 fun g() {}\n\
                 print g();"
            ),
            "inner\nouter\nnil\n"
        );
    }

    #[test]
    fn test_interpreter_11_per_instance_binding() {
        assert_eq!(
            output_of(
                "class Box {\n\
                   init(v) { this.v = v; }\n\
                   get() { return this.v; }\n\
                 }\n\
                 var a = Box(1);\n\
                 var b = Box(2);\n\
                 print a.get();\n\
                 print b.get();\n\
                 var m = a.get;\n\
                 a.v = 3;\n\
                 print m();"
            ),
            "1\n2\n3\n"
        );
    }

    #[test]
    fn test_interpreter_12_initializer_returns_instance() {
        assert_eq!(
            output_of(
                "class A { init() { this.x = 1; return; } }\n\
                 var a = A();\n\
                 print a.x;\n\
                 print a.init();\n\
                 print A;\n\
                 print a;"
            ),
            "1\nA instance\nA\nA instance\n"
        );
    }

    #[test]
    fn test_interpreter_13_callable_display() {
        assert_eq!(
            output_of("fun f() {}\nprint f;\nprint clock;\nprint clock() > 0;"),
            "<fn f>\n<native fn>\ntrue\n"
        );
    }

    #[test]
    fn test_interpreter_14_operand_errors() {
        let (output, error) = runtime_failure("print 1;\nprint 1 + \"a\";\nprint 2;");
        assert_eq!(output, "1\n");
        assert_eq!(error, "Operands must be two numbers or two strings.\n[line 2]");

        let (_, outcome) = run("var s = \"x\";\nprint s - 1;");
        let Outcome::RuntimeError(error) = outcome else {
            panic!("expected a runtime error");
        };
        assert!(!error.is_static());
        assert_eq!(error.line(), Some(2));
        assert_eq!(error.message(), "Operands must be numbers.");

        let (_, error) = runtime_failure("print -\"a\";");
        assert_eq!(error, "Operand must be a number.\n[line 1]");

        let (_, error) = runtime_failure("print 1 < \"a\";");
        assert_eq!(error, "Operands must be numbers.\n[line 1]");
    }

    #[test]
    fn test_interpreter_15_undefined_names() {
        let (_, error) = runtime_failure("print x;");
        assert_eq!(error, "Undefined variable 'x'.\n[line 1]");

        let (_, error) = runtime_failure("y = 1;");
        assert_eq!(error, "Undefined variable 'y'.\n[line 1]");

        let (_, error) = runtime_failure("class A {}\nprint A().nope;");
        assert_eq!(error, "Undefined property 'nope'.\n[line 2]");
    }

    #[test]
    fn test_interpreter_16_call_errors() {
        let (_, error) = runtime_failure("\"str\"();");
        assert_eq!(error, "Can only call functions and classes.\n[line 1]");

        let (_, error) = runtime_failure("fun f(a, b) {}\nf(1);");
        assert_eq!(error, "Expected 2 arguments but got 1.\n[line 2]");

        let (_, error) = runtime_failure("class A { init(x) {} }\nA();");
        assert_eq!(error, "Expected 1 arguments but got 0.\n[line 2]");

        let (_, error) = runtime_failure("class A {}\nA(1);");
        assert_eq!(error, "Expected 0 arguments but got 1.\n[line 2]");
    }

    #[test]
    fn test_interpreter_17_property_on_non_instance() {
        let (_, error) = runtime_failure("var n = 1;\nprint n.x;");
        assert_eq!(error, "Only instances have properties.\n[line 2]");

        let (_, error) = runtime_failure("var n = 1;\nn.x = 2;");
        assert_eq!(error, "Only instances have fields.\n[line 2]");
    }

    #[test]
    fn test_interpreter_18_unbounded_recursion_is_reported() {
        let (_, error) = runtime_failure("fun f(n) { return f(n + 1); }\nf(0);");
        assert_eq!(error, "Stack overflow.\n[line 1]");
    }

    #[test]
    fn test_interpreter_19_static_errors_prevent_output() {
        let (output, outcome) = run("print 1;\nprint ;");

        assert_eq!(outcome.exit_code(), 65);
        assert_eq!(output, "");
        assert_eq!(
            outcome
                .diagnostics()
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>(),
            vec!["[line 2] Error at ';': Expect expression."]
        );
        assert!(outcome.diagnostics().iter().all(|e| e.is_static()));
    }

    #[test]
    fn test_interpreter_20_scan_and_parse_errors_are_reported_together() {
        let (_, outcome) = run("var a = @;\nprint;");

        let messages: Vec<String> = outcome.diagnostics().iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Unexpected character: @",
                "[line 1] Error at ';': Expect expression.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_interpreter_21_runs_are_independent() {
        let (_, outcome) = run("print undefined;");
        assert_eq!(outcome.exit_code(), 70);

        assert_eq!(output_of("var undefined = 1; print undefined;"), "1\n");
        assert_eq!(output_of("print 3;"), "3\n");
    }

    #[test]
    fn test_interpreter_22_deep_nesting_is_a_static_error() {
        let source = format!("{}print 1;{}", "{".repeat(100_000), "}".repeat(100_000));
        let (output, outcome) = run(&source);

        assert_eq!(outcome.exit_code(), 65);
        assert_eq!(output, "");
        assert_eq!(
            outcome.diagnostics()[0].to_string(),
            "[line 1] Error at '{': Too much nesting."
        );
    }

    #[test]
    fn test_interpreter_23_nesting_below_the_limit_runs() {
        let depth = 200;
        let source = format!(
            "var x = 1;\n{}var y = x; print {}y;{}",
            "{".repeat(depth),
            "-".repeat(depth),
            "}".repeat(depth)
        );

        assert_eq!(output_of(&source), "1\n");
    }
}
