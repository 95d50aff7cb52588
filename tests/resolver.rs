#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;
    use rox as lox;

    use lox::ast::{Expr, ExprId, Stmt};
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;

    /// Run the resolver alone and render its diagnostics.
    fn resolve_errors(source: &str) -> Vec<String> {
        let (tokens, _) = Scanner::new(source).scan_tokens();
        let statements = Parser::new(&tokens).parse().expect("source should parse");

        let mut interpreter = Interpreter::with_output(std::io::sink());

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn variable_id(stmt: &Stmt<'_>) -> ExprId {
        match stmt {
            Stmt::Expression(Expr::Variable { id, .. }) => *id,
            Stmt::Return {
                value: Some(Expr::Variable { id, .. }),
                ..
            } => *id,
            Stmt::Return {
                value: Some(Expr::This { id, .. }),
                ..
            } => *id,
            other => panic!("not a variable use: {:?}", other),
        }
    }

    fn block<'s, 'a>(stmt: &'s Stmt<'a>) -> &'s [Stmt<'a>] {
        match stmt {
            Stmt::Block(statements) => statements,
            other => panic!("not a block: {:?}", other),
        }
    }

    #[test]
    fn test_resolver_01_block_distances() {
        let source = "var g = 1;\n{ var a = 1; { a; g; } }";
        let (tokens, _) = Scanner::new(source).scan_tokens();
        let statements = Parser::new(&tokens).parse().expect("source should parse");

        let mut interpreter = Interpreter::with_output(std::io::sink());
        Resolver::new(&mut interpreter)
            .resolve(&statements)
            .expect("source should resolve");

        let inner = block(&block(&statements[1])[1]);

        assert_eq!(interpreter.resolved_depth(variable_id(&inner[0])), Some(1));
        // Globals are left for the dynamic lookup.
        assert_eq!(interpreter.resolved_depth(variable_id(&inner[1])), None);
    }

    #[test]
    fn test_resolver_02_parameters_and_this() {
        let source = "fun id(x) { return x; }\nclass A { me() { return this; } }";
        let (tokens, _) = Scanner::new(source).scan_tokens();
        let statements = Parser::new(&tokens).parse().expect("source should parse");

        let mut interpreter = Interpreter::with_output(std::io::sink());
        Resolver::new(&mut interpreter)
            .resolve(&statements)
            .expect("source should resolve");

        let Stmt::Function(function) = &statements[0] else {
            panic!("expected a function");
        };
        assert_eq!(
            interpreter.resolved_depth(variable_id(&function.body[0])),
            Some(0)
        );

        // `this` lives in the frame the bound method's frame hangs off.
        let Stmt::Class { methods, .. } = &statements[1] else {
            panic!("expected a class");
        };
        assert_eq!(
            interpreter.resolved_depth(variable_id(&methods[0].body[0])),
            Some(1)
        );
    }

    #[test]
    fn test_resolver_03_duplicate_local() {
        assert_eq!(
            resolve_errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(
            resolve_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );

        // Globals may be redeclared.
        assert!(resolve_errors("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_resolver_04_own_initializer() {
        let expected = vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."];

        assert_eq!(resolve_errors("{ var a = a; }"), expected);
        assert_eq!(resolve_errors("var a = a;"), expected);
        assert_eq!(resolve_errors("var a = 1; var a = a;"), expected);

        // Shadowing an outer binding is fine once the initializer is done.
        assert!(resolve_errors("var a = 1; { var b = a; }").is_empty());
    }

    #[test]
    fn test_resolver_05_misplaced_return() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        assert_eq!(
            resolve_errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );

        // A bare return in an initializer is allowed.
        assert!(resolve_errors("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_resolver_06_this_outside_class() {
        assert_eq!(
            resolve_errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            resolve_errors("fun f() { return this; }"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_resolver_07_errors_accumulate() {
        assert_eq!(
            resolve_errors("return 1;\n{ var b = b; }\nprint this;"),
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'b': Can't read local variable in its own initializer.",
                "[line 3] Error at 'this': Can't use 'this' outside of a class.",
            ]
        );
    }

    #[test]
    fn test_resolver_08_static_error_stops_evaluation() {
        let mut out: Vec<u8> = Vec::new();
        let outcome = lox::run("print 1;\nvar a = a;", &mut out);

        assert_eq!(outcome.exit_code(), 65);
        assert!(out.is_empty(), "nothing should run");
    }
}
