use super::{
    parse, parse_interactive, tokenize, Diagnostic, DiagnosticKind, DiagnosticSink, Error,
    Lexer, Modifiers, Node, Parser, Program, Result, TokenType as TT,
};

fn parse_string(input: &str, script: bool) -> (Result<Program>, Vec<Diagnostic>) {
    let mut sink = DiagnosticSink::new(input, "test");
    let result = if script {
        parse(input, &mut sink)
    } else {
        parse_interactive(input, &mut sink)
    };
    (result, sink.diagnostics().to_vec())
}

fn parse_tree_matches(input: &str, tree_repr: &str) {
    let (result, diagnostics) = parse_string(input, false);
    assert!(
        diagnostics.is_empty(),
        "\nUnexpected diagnostics for \"{input}\": {diagnostics:?}\n"
    );
    match result {
        Ok(tree) => {
            let result_repr = format!("{tree:?}");
            assert!(
                result_repr.contains(tree_repr),
                "\nFailed to parse \"{}\":\nexpected \"{}\" somewhere in \"{}\"\n",
                input,
                tree_repr,
                result_repr
            )
        }
        Err(err) => panic!("\"{input}\" halted: {err}"),
    }
}

fn assert_raises_error(input: &str, script: bool, kind: DiagnosticKind, msg: &str) {
    let (result, diagnostics) = parse_string(input, script);
    assert!(result.is_ok(), "\"{input}\" halted unexpectedly");
    let first = diagnostics.first().unwrap();
    assert_eq!(kind, first.kind);
    assert_eq!(msg, first.message.as_str());
}

fn assert_halts(input: &str, msg: &str) {
    let (result, _) = parse_string(input, false);
    match result {
        Err(Error::Halt(diagnostic)) => {
            assert!(diagnostic.is_fatal());
            assert_eq!(msg, diagnostic.message.as_str());
        }
        other => panic!("expected \"{input}\" to halt, got {other:?}"),
    }
}

fn token_types(input: &str) -> Vec<TT> {
    tokenize(input).unwrap().iter().map(|t| t.typ).collect()
}

fn lexemes(input: &str) -> Vec<String> {
    tokenize(input)
        .unwrap()
        .into_iter()
        .map(|t| t.lexeme)
        .collect()
}

// # LEXER
// # =====

#[test]
fn test_keywords() {
    assert_eq!(
        token_types("public static int x"),
        vec![TT::PUBLIC, TT::STATIC, TT::INT, TT::IDENTIFIER, TT::EOF]
    );
    assert_eq!(
        token_types("obtain print input null truely"),
        vec![
            TT::OBTAIN,
            TT::PRINT,
            TT::INPUT,
            TT::NULL,
            TT::IDENTIFIER,
            TT::EOF
        ]
    );
    assert!(TT::PRINT.is_keyword() && TT::PRINT.is_repl_only());
    assert!(!TT::IDENTIFIER.is_keyword());
    assert!(TT::keywords().contains(&TT::INPUT));
    assert!(!TT::keywords_excluding_repl().contains(&TT::INPUT));
    assert!(TT::keywords_excluding_repl().contains(&TT::FINAL));
    assert_eq!(TT::from_surface("protected"), Some(TT::PROTECTED));
    assert_eq!(TT::from_surface("Protected"), None);
}

#[test]
fn test_numbers_are_lexed_leniently() {
    assert_eq!(lexemes("12ab.3 + 4"), vec!["12ab.3", "+", "4", "EOF"]);
    assert_eq!(
        token_types("3.14"),
        vec![TT::NUMBER_VALUE, TT::EOF]
    );
}

#[test]
fn test_string_and_character_literals() {
    let tokens = tokenize("\"hello world\" 'a'").unwrap();
    assert_eq!(tokens[0].typ, TT::STRING);
    assert_eq!(tokens[0].lexeme, "hello world");
    assert_eq!(tokens[1].typ, TT::CHARACTER);
    assert_eq!(tokens[1].lexeme, "a");

    // escapes are kept verbatim and the next delimiter always closes
    let tokens = tokenize(r#""a\"b" c"#).unwrap();
    assert_eq!(tokens[0].typ, TT::STRING);
    assert_eq!(tokens[0].lexeme, r"a\");
    assert_eq!(tokens[1].typ, TT::IDENTIFIER);
    assert_eq!(tokens[1].lexeme, "b");
    assert_eq!(tokens[2].typ, TT::STRING);
    assert_eq!(tokens[2].lexeme, " c");

    let tokens = tokenize(r"'\n' '\''").unwrap();
    assert_eq!(tokens[0].lexeme, r"\n");
    assert_eq!(tokens[1].lexeme, r"\");
    assert_eq!(tokens[2].typ, TT::CHARACTER);
    assert_eq!(tokens[2].lexeme, "");
    assert_eq!(tokens[3].typ, TT::EOF);
}

#[test]
fn test_literal_ends_at_line_break() {
    let tokens = tokenize("\"abc\nx").unwrap();
    assert_eq!(tokens[0].typ, TT::STRING);
    assert_eq!(tokens[0].lexeme, "abc");
    assert_eq!(tokens[1].lexeme, "x");
    assert_eq!(tokens[1].position.line, 2);
    assert_eq!(tokens[1].position.column, 0);

    let tokens = tokenize("'abc").unwrap();
    assert_eq!(tokens[0].lexeme, "abc");
    assert_eq!(tokens[1].typ, TT::EOF);
}

#[test]
fn test_operators() {
    assert_eq!(
        token_types("a += 1 -> b - c * d"),
        vec![
            TT::IDENTIFIER,
            TT::BINARY_ASSIGN,
            TT::NUMBER_VALUE,
            TT::LAMBDA_ARROW,
            TT::IDENTIFIER,
            TT::BINARY_OPERATOR,
            TT::IDENTIFIER,
            TT::BINARY_OPERATOR,
            TT::IDENTIFIER,
            TT::EOF
        ]
    );
    assert_eq!(lexemes("x%=2")[1], "%=");
    assert_eq!(
        token_types("{ } ( ) [ ] = ; , ."),
        vec![
            TT::OPEN_BRACE,
            TT::CLOSE_BRACE,
            TT::OPEN_PAREN,
            TT::CLOSE_PAREN,
            TT::OPEN_BRACKET,
            TT::CLOSE_BRACKET,
            TT::ASSIGN,
            TT::SEMI,
            TT::COMMA,
            TT::DOT,
            TT::EOF
        ]
    );
}

#[test]
fn test_backslash_is_skipped() {
    assert_eq!(
        token_types("a \\ b"),
        vec![TT::IDENTIFIER, TT::IDENTIFIER, TT::EOF]
    );
}

#[test]
fn test_positions() {
    let tokens = tokenize("int a;\r\n  b = 2;").unwrap();
    assert_eq!(tokens[0].position.line, 1);
    assert_eq!(tokens[0].position.column, 0);
    assert_eq!(tokens[1].position.column, 4);
    let b = &tokens[3];
    assert_eq!(b.lexeme, "b");
    assert_eq!(b.position.line, 2);
    assert_eq!(b.position.column, 2);
    assert_eq!(b.position.offset, 10);
}

#[test]
fn test_positions_count_characters() {
    let tokens = tokenize("'é' x\ny = 1").unwrap();
    assert_eq!(tokens[1].lexeme, "x");
    assert_eq!(tokens[1].position.column, 4);
    assert_eq!(tokens[1].position.offset, 4);
    assert_eq!(tokens[3].lexeme, "=");
    assert_eq!(tokens[3].position.line, 2);
    assert_eq!(tokens[3].position.column, 2);
    assert_eq!(tokens[3].position.offset, 8);

    match tokenize("\"é\" @") {
        Err(Error::Halt(diagnostic)) => {
            let position = diagnostic.token.as_ref().unwrap().position;
            assert_eq!(position.column, 4);
            assert_eq!(position.offset, 4);
            let sink = DiagnosticSink::new("\"é\" @", "test");
            assert!(sink.render(&diagnostic).ends_with("\n\"é\" @\n    ^"));
        }
        other => panic!("expected a halt, got {other:?}"),
    }
}

#[test]
fn test_lookahead_leaves_lexer_unchanged() {
    let mut lexer = Lexer::new("a\nb c").unwrap();
    assert_eq!(lexer.lookahead(0).unwrap().lexeme, "a");
    assert_eq!(lexer.lookahead(2).unwrap().lexeme, "c");
    assert_eq!(lexer.lookahead(5).unwrap().typ, TT::EOF);
    assert_eq!(lexer.current().lexeme, "a");

    assert_eq!(lexer.advance().unwrap().lexeme, "a");
    let b = lexer.current().clone();
    assert_eq!(b.lexeme, "b");
    assert_eq!(b.position.line, 2);
    assert_eq!(b.position.column, 0);
}

#[test]
fn test_advance_past_end() {
    let mut lexer = Lexer::new("x").unwrap();
    assert_eq!(lexer.advance().unwrap().lexeme, "x");
    assert_eq!(lexer.current().typ, TT::EOF);
    assert!(matches!(lexer.advance(), Err(Error::EndOfInput)));
}

#[test]
fn test_empty_source() {
    assert!(matches!(Lexer::new(""), Err(Error::EmptySource)));
    let (result, _) = parse_string("", true);
    assert!(matches!(result, Err(Error::EmptySource)));
}

#[test]
fn test_unknown_character_halts() {
    let mut lexer = Lexer::new("a @ b").unwrap();
    let halt = lexer.advance();
    match halt {
        Err(Error::Halt(ref diagnostic)) => {
            assert_eq!(diagnostic.kind, DiagnosticKind::Fatal);
            assert_eq!(diagnostic.token.as_ref().unwrap().lexeme, "@");
            assert_eq!(diagnostic.token.as_ref().unwrap().position.column, 2);
        }
        _ => panic!("expected a halt, got {halt:?}"),
    }
    // halted for good
    assert!(matches!(lexer.advance(), Err(Error::Halt(_))));
    assert!(matches!(lexer.lookahead(1), Err(Error::Halt(_))));
    assert!(matches!(tokenize("a @ b"), Err(Error::Halt(_))));
}

// # PARSER
// # ======

#[test]
fn test_declarations_are_split() {
    let (result, diagnostics) = parse_string("int a, b = 1, c;", false);
    assert!(diagnostics.is_empty());
    let body = result.unwrap().body;
    let names: Vec<&str> = body
        .iter()
        .map(|node| match node {
            Node::VariableDeclaration(decl) => decl.name.as_str(),
            other => panic!("not a declaration: {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    parse_tree_matches(
        "int a, b = 1, c;",
        "name: \"b\", value: Some(NumberLiteral(1.0))",
    );
}

#[test]
fn test_declaration_returns_last_declarator() {
    let source = "a, b = 1, c;";
    let mut sink = DiagnosticSink::new(source, "test");
    let lexer = Lexer::new(source).unwrap();
    let mut parser = Parser::new(lexer, &mut sink);
    let last = parser
        .parse_declaration(Node::identifier("int"), Modifiers::default())
        .unwrap();
    match last {
        Some(Node::VariableDeclaration(decl)) => {
            assert_eq!(decl.name, "c");
            assert!(decl.value.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(sink.count(), 0);
}

#[test]
fn test_declaration_types() {
    parse_tree_matches(
        "java.lang.String s = \"x\";",
        "name: \"s\", value: Some(StringLiteral(\"x\"))",
    );
    parse_tree_matches(
        "Foo bar;",
        "VariableDeclaration { typ: Identifier(\"Foo\"), name: \"bar\", value: None",
    );
    parse_tree_matches("char c = 'a';", "value: Some(CharLiteral('a'))");
    parse_tree_matches("boolean b = false;", "value: Some(BooleanLiteral(false))");
    parse_tree_matches("var n = null;", "value: Some(NullLiteral)");
}

#[test]
fn test_function_without_return_type() {
    parse_tree_matches(
        "fun greet() -> { }",
        "FunctionDeclaration(FunctionDeclaration { return_type: None, name: \"greet\", \
         parameters: Parameters([]), body: [], modifiers: Modifiers([]), is_block_body: true })",
    );
}

#[test]
fn test_function_declaration() {
    let input = "fun add = int(int a, final int b) -> a + b;";
    parse_tree_matches(input, "return_type: Some(Identifier(\"int\")), name: \"add\"");
    parse_tree_matches(
        input,
        "Parameter { typ: Identifier(\"int\"), name: \"b\", is_final: true }",
    );
    parse_tree_matches(
        input,
        "body: [Binary(Plus, (Identifier(\"a\"), Identifier(\"b\")))], \
         modifiers: Modifiers([]), is_block_body: false",
    );
    parse_tree_matches(
        "fun f = Foo.Bar() -> { int x = 1; x; }",
        "return_type: Some(Member { parent: Identifier(\"Foo\"), child: Identifier(\"Bar\"), computed: false })",
    );
}

#[test]
fn test_duplicate_parameters_keep_the_first() {
    let (result, diagnostics) = parse_string("fun f = (int a, char a) -> a;", false);
    assert!(diagnostics.is_empty());
    match &result.unwrap().body[0] {
        Node::FunctionDeclaration(decl) => {
            assert_eq!(decl.parameters.len(), 1);
            let a = decl.parameters.get("a").unwrap();
            assert_eq!(a.typ, Node::identifier("int"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_function_overloads() {
    let input = "public fun f { int(int a) -> a; static double(double a, double b) -> { a; } }";
    let (result, diagnostics) = parse_string(input, false);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let body = result.unwrap().body;
    assert_eq!(body.len(), 2);
    parse_tree_matches(input, "modifiers: Modifiers([Public]), is_block_body: false");
    parse_tree_matches(input, "modifiers: Modifiers([Public, Static]), is_block_body: true");

    assert_raises_error(
        "fun f { }",
        false,
        DiagnosticKind::Expected,
        "expected at least one signature for function 'f'",
    );
}

#[test]
fn test_precedence() {
    parse_tree_matches(
        "2 + 3 * 4",
        "Binary(Plus, (NumberLiteral(2.0), Binary(Times, (NumberLiteral(3.0), NumberLiteral(4.0)))))",
    );
    parse_tree_matches(
        "(2 + 3) * 4",
        "Binary(Times, (Binary(Plus, (NumberLiteral(2.0), NumberLiteral(3.0))), NumberLiteral(4.0)))",
    );
    parse_tree_matches(
        "1 - 2 - 3",
        "Binary(Minus, (Binary(Minus, (NumberLiteral(1.0), NumberLiteral(2.0))), NumberLiteral(3.0)))",
    );
    parse_tree_matches(
        "a % b / c",
        "Binary(Divide, (Binary(Modulo, (Identifier(\"a\"), Identifier(\"b\"))), Identifier(\"c\")))",
    );
}

#[test]
fn test_assignment() {
    parse_tree_matches(
        "a = b = 1",
        "Assignment(Identifier(\"a\"), Assignment(Identifier(\"b\"), NumberLiteral(1.0)))",
    );
    parse_tree_matches("a += 2;", "Assignment(Identifier(\"a\"), NumberLiteral(2.0))");
    parse_tree_matches(
        "x = 1 + 2;",
        "Assignment(Identifier(\"x\"), Binary(Plus, (NumberLiteral(1.0), NumberLiteral(2.0))))",
    );
}

#[test]
fn test_calls_and_members() {
    parse_tree_matches(
        "f(1)(2, 3)",
        "Call(Call(Identifier(\"f\"), [NumberLiteral(1.0)]), [NumberLiteral(2.0), NumberLiteral(3.0)])",
    );
    parse_tree_matches("f()", "Call(Identifier(\"f\"), [])");
    parse_tree_matches(
        "a.b[c]",
        "Member { parent: Member { parent: Identifier(\"a\"), child: Identifier(\"b\"), computed: false }, \
         child: Identifier(\"c\"), computed: true }",
    );
    parse_tree_matches(
        "a.b(1)",
        "Call(Member { parent: Identifier(\"a\"), child: Identifier(\"b\"), computed: false }, [NumberLiteral(1.0)])",
    );
}

#[test]
fn test_repeating_modifier() {
    assert_raises_error(
        "final final int x = 1;",
        false,
        DiagnosticKind::InvalidAction,
        "repeating attribute modifier",
    );
    let (result, diagnostics) = parse_string("final static final int x = 1;", false);
    assert_eq!(diagnostics.len(), 1);
    assert!(format!("{:?}", result.unwrap()).contains("modifiers: Modifiers([Final, Static])"));
}

#[test]
fn test_modifiers_on_expression() {
    assert_raises_error(
        "static x + 1",
        false,
        DiagnosticKind::Syntax,
        "attribute modifiers only apply to declarations",
    );
}

#[test]
fn test_expected_recovery() {
    assert_raises_error(
        "int a = 1",
        false,
        DiagnosticKind::Expected,
        "unexpected symbol: EOF expected one of: [SEMI, COMMA]",
    );
    assert_raises_error(
        "fun f = (int a -> a;",
        false,
        DiagnosticKind::Expected,
        "unexpected symbol: LAMBDA_ARROW expected one of: [COMMA, CLOSE_PAREN]",
    );
    assert_raises_error(
        "fun f() -> { int a;",
        false,
        DiagnosticKind::Expected,
        "unexpected symbol: EOF expected: CLOSE_BRACE",
    );
    assert_raises_error(
        "(1 + 2",
        false,
        DiagnosticKind::Expected,
        "unexpected symbol: EOF expected: CLOSE_PAREN",
    );

    // parsing goes on after the mistake
    let (result, diagnostics) = parse_string("int a = 1 int b;", false);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(result.unwrap().body.len(), 2);
}

#[test]
fn test_unparsable_token_halts() {
    assert_halts("int a = ;", "could not parse following token: SEMI(';')");
    assert_halts("x = )", "could not parse following token: CLOSE_PAREN(')')");
    assert_halts("if", "could not parse following token: IF('if')");
}

#[test]
fn test_lexer_halt_reaches_parser() {
    let (result, _) = parse_string("int a = @;", false);
    match result {
        Err(Error::Halt(diagnostic)) => {
            assert_eq!(
                diagnostic.message,
                "could not tokenize following character: '@'"
            )
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_obtain_is_skipped() {
    let (result, diagnostics) = parse_string("obtain java.util.List;\nint a;", false);
    assert!(diagnostics.is_empty());
    let body = result.unwrap().body;
    assert_eq!(body.len(), 1);
    assert!(matches!(&body[0], Node::VariableDeclaration(decl) if decl.name == "a"));
}

#[test]
fn test_empty_statements() {
    let (result, diagnostics) = parse_string(";;", true);
    assert!(diagnostics.is_empty());
    assert!(result.unwrap().body.is_empty());
}

#[test]
fn test_script_statements() {
    assert_raises_error("x + 1;", true, DiagnosticKind::NotAStatement, "not a statement");
    assert_raises_error("42", true, DiagnosticKind::NotAStatement, "not a statement");
    for input in ["x = 1;", "f(1);", "int x = 1;", "a.b(2);"] {
        let (result, diagnostics) = parse_string(input, true);
        assert!(result.is_ok());
        assert!(diagnostics.is_empty(), "{input}: {diagnostics:?}");
    }
}

#[test]
fn test_repl_only_keywords() {
    assert_raises_error(
        "print(x);",
        true,
        DiagnosticKind::NotReplMode,
        "'print' is only available in a repl session",
    );
    parse_tree_matches("print(x)", "Call(Identifier(\"print\"), [Identifier(\"x\")])");
    parse_tree_matches("int n = input();", "Call(Identifier(\"input\"), [])");
}

#[test]
fn test_malformed_literals() {
    assert_raises_error(
        "int a = 1x;",
        false,
        DiagnosticKind::Syntax,
        "malformed number literal '1x'",
    );
    let (result, _) = parse_string("int a = 1x;", false);
    assert!(format!("{:?}", result.unwrap()).contains("value: Some(NumberLiteral(0.0))"));

    assert_raises_error(
        "char c = 'ab';",
        false,
        DiagnosticKind::Syntax,
        "a character literal holds exactly one character",
    );
    assert_raises_error(
        "char c = '';",
        false,
        DiagnosticKind::Syntax,
        "a character literal holds exactly one character",
    );
    assert_raises_error(
        "int a = 1.5ff;",
        false,
        DiagnosticKind::Syntax,
        "malformed number literal '1.5ff'",
    );
}

#[test]
fn test_number_suffixes() {
    parse_tree_matches("float x = 1.5f;", "value: Some(NumberLiteral(1.5))");
    parse_tree_matches("double d = 2d;", "value: Some(NumberLiteral(2.0))");
    parse_tree_matches("float y = 10F;", "value: Some(NumberLiteral(10.0))");
    parse_tree_matches("double z = 0.25D;", "value: Some(NumberLiteral(0.25))");
}

#[test]
fn test_escaped_character_literals() {
    parse_tree_matches(r"char c = '\n';", r"value: Some(CharLiteral('\\'))");
    parse_tree_matches(r"char c = '\t';", r"value: Some(CharLiteral('\\'))");
    parse_tree_matches(r"char c = '\';", r"value: Some(CharLiteral('\\'))");
    assert_raises_error(
        r"char c = '\nx';",
        false,
        DiagnosticKind::Syntax,
        "a character literal holds exactly one character",
    );
}

#[test]
fn test_index_is_additive() {
    parse_tree_matches(
        "a[i + 1]",
        "child: Binary(Plus, (Identifier(\"i\"), NumberLiteral(1.0))), computed: true",
    );
    let (_, diagnostics) = parse_string("a[b = 1]", false);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Expected);
    assert_eq!(
        diagnostics[0].message,
        "unexpected symbol: ASSIGN expected: CLOSE_BRACKET"
    );
}

// # DIAGNOSTICS
// # ===========

#[test]
fn test_render() {
    let source = "int a;\nint b = 2y;";
    let mut sink = DiagnosticSink::new(source, "test.mn");
    let lexer = Lexer::new(source).unwrap();
    Parser::with_mode(lexer, &mut sink, super::Mode::Script)
        .parse_module()
        .unwrap();
    assert_eq!(sink.count(), 1);
    let rendered = sink.render(&sink.diagnostics()[0]);
    assert_eq!(
        rendered,
        "Error of type SYNTAX in test.mn:\nMessage: malformed number literal '2y'\nint b = 2y;\n        ^^"
    );

    let bare = Diagnostic::new(DiagnosticKind::NotFound, "Variable 'x' not found");
    assert_eq!(
        sink.render(&bare),
        "Error of type NOT_FOUND in test.mn:\nMessage: Variable 'x' not found"
    );
}

#[test]
fn test_render_after_carriage_return() {
    let source = "1;\r2 +;";
    let mut sink = DiagnosticSink::new(source, "test");
    match parse_interactive(source, &mut sink) {
        Err(Error::Halt(diagnostic)) => {
            assert_eq!(diagnostic.token.as_ref().unwrap().position.line, 2);
            assert_eq!(
                sink.render(&diagnostic),
                "Error of type FATAL in test:\nMessage: could not parse following token: SEMI(';')\n2 +;\n   ^"
            );
        }
        other => panic!("expected a halt, got {other:?}"),
    }
}

#[test]
fn test_sink_buffers_and_halts() {
    let mut sink = DiagnosticSink::new("x", "repl-session");
    sink.report(Diagnostic::new(DiagnosticKind::Syntax, "first"))
        .unwrap();
    sink.report(Diagnostic::new(DiagnosticKind::Expected, "second"))
        .unwrap();
    assert_eq!(sink.count(), 2);
    assert_eq!(sink.diagnostics()[1].message, "second");

    let halt = sink.report(Diagnostic::new(DiagnosticKind::Fatal, "boom"));
    assert!(matches!(halt, Err(Error::Halt(ref d)) if d.message == "boom"));
    assert_eq!(sink.count(), 2);

    sink.flush();
    assert_eq!(sink.count(), 0);
}
