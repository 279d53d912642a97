use oleander::{
    ast::{Ast, AstKind, BinaryOp},
    diagnostics::DiagnosticKind,
    lexer::{Lexer, TokenKind},
    parser,
};

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new("<test>", source);
    let mut kinds = Vec::new();
    loop {
        let token = lexer.next().expect("lexing should succeed");
        let done = token.kind == TokenKind::Eof;
        kinds.push(token.kind);
        if done {
            return kinds;
        }
    }
}

fn parse(source: &str) -> Ast {
    parser::parse("<test>", source).expect("parse should succeed")
}

#[test]
fn lexes_keywords_and_identifiers() {
    assert_eq!(
        kinds("var fun fn same if elif else while whiles"),
        vec![
            TokenKind::Var,
            TokenKind::Fun,
            TokenKind::Fn,
            TokenKind::Same,
            TokenKind::If,
            TokenKind::Elif,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Ident,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_compound_operators() {
    assert_eq!(
        kinds("== != <= >= && || ++ --"),
        vec![
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn sign_followed_by_digit_lexes_one_number() {
    // Without spaces the `+2` is a signed number, not an addition.
    assert_eq!(
        kinds("1+2"),
        vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
    );
    assert_eq!(
        kinds("1 + 2"),
        vec![
            TokenKind::Number,
            TokenKind::Plus,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_signed_and_exponent_numbers() {
    let mut lexer = Lexer::new("<test>", "-2.5e+3");
    let token = lexer.next().expect("number lexes");
    assert_eq!(token.kind, TokenKind::Number);
    assert_eq!(token.text, "-2.5e+3");
}

#[test]
fn missing_exponent_digits_is_a_lex_error() {
    let mut lexer = Lexer::new("<test>", "1e");
    let diag = lexer.next().expect_err("exponent needs digits");
    assert_eq!(diag.kind, DiagnosticKind::Lexer);
}

#[test]
fn atom_token_strips_the_colon() {
    let mut lexer = Lexer::new("<test>", ":atom_name");
    let token = lexer.next().expect("atom lexes");
    assert_eq!(token.kind, TokenKind::Atom);
    assert_eq!(token.text, "atom_name");
}

#[test]
fn bare_colon_is_a_lex_error() {
    let mut lexer = Lexer::new("<test>", ": x");
    let diag = lexer.next().expect_err("atom needs a name");
    assert_eq!(diag.kind, DiagnosticKind::Lexer);
}

#[test]
fn string_token_holds_decoded_content() {
    let mut lexer = Lexer::new("<test>", r#"'a\tb'"#);
    let token = lexer.next().expect("string lexes");
    assert_eq!(token.kind, TokenKind::String);
    assert_eq!(token.text, "a\tb");
}

#[test]
fn unterminated_string_reads_as_end_of_file() {
    let mut lexer = Lexer::new("<test>", "\"never closed");
    let token = lexer.next().expect("no dedicated error");
    assert_eq!(token.kind, TokenKind::Eof);
}

#[test]
fn unrecognized_character_is_a_lex_error() {
    let mut lexer = Lexer::new("<test>", "@");
    let diag = lexer.next().expect_err("@ is not part of the language");
    assert_eq!(diag.kind, DiagnosticKind::Lexer);
}

#[test]
fn positions_point_at_the_first_character() {
    let mut lexer = Lexer::new("<test>", "ab\n  <=");
    let first = lexer.next().expect("ident lexes");
    assert_eq!((first.position.line, first.position.column), (1, 1));
    let second = lexer.next().expect("operator lexes");
    assert_eq!(second.kind, TokenKind::LessEqual);
    assert_eq!((second.position.line, second.position.column), (2, 3));
}

#[test]
fn comments_and_whitespace_produce_no_tokens() {
    assert_eq!(
        kinds("# only a comment\n  \t\n"),
        vec![TokenKind::Eof]
    );
}

#[test]
fn parses_statement_forms() {
    let ast = parse("var x = 1; fun f(a) { a; } if x { 1; } while x { x = 0; } f(x);");
    match ast.kind {
        AstKind::TopLevel(statements) => {
            assert_eq!(statements.len(), 5);
            assert!(matches!(statements[0].kind, AstKind::VarDecl { .. }));
            assert!(matches!(statements[1].kind, AstKind::FunDecl { .. }));
            assert!(matches!(statements[2].kind, AstKind::If(_)));
            assert!(matches!(statements[3].kind, AstKind::While { .. }));
            assert!(matches!(statements[4].kind, AstKind::Call { .. }));
        }
        other => panic!("expected top level, found {other:?}"),
    }
}

#[test]
fn expression_statements_require_a_semicolon() {
    let diag = parser::parse("<test>", "1 + 2").expect_err("missing semicolon");
    assert_eq!(diag.kind, DiagnosticKind::Syntax);
    assert!(diag.message.contains("`;`"), "message: {}", diag.message);
}

#[test]
fn block_statements_take_no_semicolon() {
    parse("if 1 { 1; } fun f() { 1; } while !1 { 1; }");
}

#[test]
fn postfix_chains_nest_left_to_right() {
    let ast = parse("a(b)[0].field;");
    let statement = match ast.kind {
        AstKind::TopLevel(mut statements) => statements.remove(0),
        other => panic!("expected top level, found {other:?}"),
    };
    // Outermost is the dot-field sugar, an atom-keyed subscript.
    let (target, key) = match statement.kind {
        AstKind::Subscript { target, key } => (target, key),
        other => panic!("expected subscript, found {other:?}"),
    };
    assert!(matches!(key.kind, AstKind::Atom(ref name) if name == "field"));
    let target = match target.kind {
        AstKind::Subscript { target, .. } => target,
        other => panic!("expected subscript, found {other:?}"),
    };
    assert!(matches!(target.kind, AstKind::Call { .. }));
}

#[test]
fn postfix_increment_desugars_to_an_assignment() {
    let ast = parse("x++;");
    let statement = match ast.kind {
        AstKind::TopLevel(mut statements) => statements.remove(0),
        other => panic!("expected top level, found {other:?}"),
    };
    let (op, left, right) = match statement.kind {
        AstKind::Binary { op, left, right } => (op, left, right),
        other => panic!("expected binary, found {other:?}"),
    };
    assert_eq!(op, BinaryOp::Assign);
    assert!(matches!(left.kind, AstKind::Ident(ref name) if name == "x"));
    assert!(matches!(
        right.kind,
        AstKind::Binary {
            op: BinaryOp::Add,
            ..
        }
    ));
}

#[test]
fn postfix_increment_requires_an_identifier() {
    let diag = parser::parse("<test>", "1++;").expect_err("number is not assignable");
    assert_eq!(diag.kind, DiagnosticKind::Syntax);
}

#[test]
fn table_keys_are_restricted_to_simple_literals() {
    let diag = parser::parse("<test>", "{[1] = 2};").expect_err("array key is rejected");
    assert_eq!(diag.kind, DiagnosticKind::Syntax);
    parse(r#"{1 = 2, :a = 3, "s" = 4};"#);
}

#[test]
fn trailing_commas_are_accepted_in_literals() {
    parse("[1, 2,];");
    parse("{:a = 1,};");
    parse("fun f(a, b,) { a; }");
}

#[test]
fn dot_must_be_followed_by_an_identifier() {
    let diag = parser::parse("<test>", "a.1;").expect_err("dot needs a field name");
    assert_eq!(diag.kind, DiagnosticKind::Syntax);
}

#[test]
fn dangling_else_binds_to_the_if_chain() {
    let ast = parse("if 1 { 1; } elif 2 { 2; } else { 3; }");
    let clauses = match ast.kind {
        AstKind::TopLevel(mut statements) => match statements.remove(0).kind {
            AstKind::If(clauses) => clauses,
            other => panic!("expected if, found {other:?}"),
        },
        other => panic!("expected top level, found {other:?}"),
    };
    assert_eq!(clauses.len(), 3);
    assert!(clauses[0].condition.is_some());
    assert!(clauses[1].condition.is_some());
    assert!(clauses[2].condition.is_none());
}

#[test]
fn unclosed_paren_is_a_syntax_error() {
    let diag = parser::parse("<test>", "(1 + 2;").expect_err("missing closing paren");
    assert_eq!(diag.kind, DiagnosticKind::Syntax);
}

#[test]
fn syntax_errors_carry_positions() {
    let diag = parser::parse("<test>", "var = 1;").expect_err("name is required");
    let position = diag.position.expect("position is attached");
    assert_eq!((position.line, position.column), (1, 5));
}
