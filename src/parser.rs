use crate::{
    ast::{Ast, AstKind, BinaryOp, IfClause, TableEntry, UnaryOp},
    diagnostics::{Diagnostic, Position},
    lexer::{Lexer, Token, TokenKind},
};

/// Parse a whole source unit into a `TopLevel` node. The parse is
/// all-or-nothing: the first lexer or syntax error unwinds the entire parse
/// and no partial tree survives.
pub fn parse(filename: &str, source: &str) -> Result<Ast, Diagnostic> {
    Parser::new(filename, source)?.parse_toplevel()
}

/// Recursive descent for statements, precedence climbing for binary
/// expressions. Exactly one token of lookahead is held at a time.
struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token,
}

fn precedence(kind: TokenKind) -> Option<u8> {
    let level = match kind {
        TokenKind::Assign => 0,
        TokenKind::And | TokenKind::Or => 1,
        TokenKind::BitAnd | TokenKind::BitOr | TokenKind::Equal | TokenKind::NotEqual => 2,
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => 3,
        TokenKind::Same => 4,
        TokenKind::Plus | TokenKind::Minus => 5,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 6,
        _ => return None,
    };
    Some(level)
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Assign => BinaryOp::Assign,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::BitAnd => BinaryOp::BitAnd,
        TokenKind::BitOr => BinaryOp::BitOr,
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::Same => BinaryOp::Same,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

impl<'a> Parser<'a> {
    fn new(filename: &str, source: &'a str) -> Result<Self, Diagnostic> {
        let mut lexer = Lexer::new(filename, source);
        let token = lexer.next()?;
        Ok(Self { lexer, token })
    }

    fn position(&self) -> Position {
        self.token.position.clone()
    }

    fn skip(&mut self) -> Result<(), Diagnostic> {
        self.token = self.lexer.next()?;
        Ok(())
    }

    fn matches(&self, kind: TokenKind) -> bool {
        self.token.kind == kind
    }

    fn matchskip(&mut self, kind: TokenKind) -> Result<bool, Diagnostic> {
        if self.matches(kind) {
            self.skip()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&self, kind: TokenKind) -> Result<(), Diagnostic> {
        if self.matches(kind) {
            return Ok(());
        }
        Err(Diagnostic::syntax(format!(
            "expected {}, got {}",
            kind.classname(),
            self.token.kind.classname()
        ))
        .at(self.position()))
    }

    fn expectskip(&mut self, kind: TokenKind) -> Result<(), Diagnostic> {
        self.expect(kind)?;
        self.skip()
    }

    fn parse_toplevel(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        let mut statements = Vec::new();
        while !self.matches(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Ast::new(AstKind::TopLevel(statements), position))
    }

    fn parse_statement(&mut self) -> Result<Ast, Diagnostic> {
        match self.token.kind {
            TokenKind::Fun => return self.parse_decl_fun(),
            TokenKind::If => return self.parse_if(),
            TokenKind::While => return self.parse_while(),
            _ => {}
        }
        let statement = if self.matches(TokenKind::Var) {
            self.parse_decl_var()?
        } else {
            self.parse_expression()?
        };
        self.expectskip(TokenKind::Semicolon)?;
        Ok(statement)
    }

    fn parse_decl_var(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        self.expectskip(TokenKind::Var)?;
        self.expect(TokenKind::Ident)?;
        let name = self.token.text.clone();
        self.skip()?;
        let initializer = if self.matchskip(TokenKind::Assign)? {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Ast::new(AstKind::VarDecl { name, initializer }, position))
    }

    fn parse_decl_fun(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        self.expectskip(TokenKind::Fun)?;
        self.expect(TokenKind::Ident)?;
        let name = self.token.text.clone();
        self.skip()?;
        let formals = self.parse_formals()?;
        let body = self.parse_block()?;
        Ok(Ast::new(AstKind::FunDecl { name, formals, body }, position))
    }

    fn parse_if(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        self.expect(TokenKind::If)?;
        let mut clauses = Vec::new();
        while self.matches(TokenKind::If) || self.matches(TokenKind::Elif) {
            let clause_position = self.position();
            self.skip()?;
            let condition = self.parse_expression()?;
            let body = self.parse_block()?;
            clauses.push(IfClause {
                condition: Some(condition),
                body,
                position: clause_position,
            });
        }
        if self.matches(TokenKind::Else) {
            let clause_position = self.position();
            self.skip()?;
            let body = self.parse_block()?;
            clauses.push(IfClause {
                condition: None,
                body,
                position: clause_position,
            });
        }
        Ok(Ast::new(AstKind::If(clauses), position))
    }

    fn parse_while(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        self.expectskip(TokenKind::While)?;
        let condition = Box::new(self.parse_expression()?);
        let body = self.parse_block()?;
        Ok(Ast::new(AstKind::While { condition, body }, position))
    }

    fn parse_block(&mut self) -> Result<Vec<Ast>, Diagnostic> {
        self.expectskip(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.matches(TokenKind::RBrace) {
            statements.push(self.parse_statement()?);
        }
        self.expectskip(TokenKind::RBrace)?;
        Ok(statements)
    }

    fn parse_formals(&mut self) -> Result<Vec<String>, Diagnostic> {
        self.expectskip(TokenKind::LParen)?;
        let mut formals = Vec::new();
        while !self.matches(TokenKind::RParen) {
            self.expect(TokenKind::Ident)?;
            formals.push(self.token.text.clone());
            self.skip()?;
            if !self.matchskip(TokenKind::Comma)? {
                break;
            }
        }
        self.expectskip(TokenKind::RParen)?;
        Ok(formals)
    }

    fn parse_expression(&mut self) -> Result<Ast, Diagnostic> {
        let lhs = self.parse_primary()?;
        self.parse_binary(lhs, 0)
    }

    fn parse_binary(&mut self, mut lhs: Ast, minprec: u8) -> Result<Ast, Diagnostic> {
        loop {
            let kind = self.token.kind;

            // Postfix increment and decrement bind tighter than every binary
            // operator and desugar to an assignment of `name + 1` or
            // `name - 1` back to the same name, so the result is the new
            // value and the nearest binding frame is the one updated.
            if kind == TokenKind::PlusPlus || kind == TokenKind::MinusMinus {
                let position = self.position();
                if !matches!(lhs.kind, AstKind::Ident(_)) {
                    return Err(Diagnostic::syntax(format!(
                        "expected identifier before {}",
                        kind.classname()
                    ))
                    .at(position));
                }
                let op = if kind == TokenKind::PlusPlus {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                };
                let one = Ast::new(AstKind::Number(1.0), position.clone());
                let stepped = Ast::new(
                    AstKind::Binary {
                        op,
                        left: Box::new(lhs.clone()),
                        right: Box::new(one),
                    },
                    position.clone(),
                );
                self.skip()?;
                return Ok(Ast::new(
                    AstKind::Binary {
                        op: BinaryOp::Assign,
                        left: Box::new(lhs),
                        right: Box::new(stepped),
                    },
                    position,
                ));
            }

            let (prec, op) = match (precedence(kind), binary_op(kind)) {
                (Some(prec), Some(op)) if prec >= minprec => (prec, op),
                _ => return Ok(lhs),
            };
            self.skip()?;

            let mut rhs = self.parse_primary()?;
            if let Some(nextprec) = precedence(self.token.kind) {
                if prec < nextprec {
                    rhs = self.parse_binary(rhs, prec + 1)?;
                }
            }

            let position = lhs.position.clone();
            lhs = Ast::new(
                AstKind::Binary {
                    op,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                },
                position,
            );
        }
    }

    fn matches_simple(&self) -> bool {
        matches!(
            self.token.kind,
            TokenKind::Number | TokenKind::String | TokenKind::Atom
        )
    }

    fn matches_literal(&self) -> bool {
        self.matches_simple()
            || self.matches(TokenKind::LBracket)
            || self.matches(TokenKind::LBrace)
    }

    fn parse_primary(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        let mut ast = if self.matches_literal() {
            self.parse_literal()?
        } else if self.matches(TokenKind::Ident) {
            let name = self.token.text.clone();
            self.skip()?;
            Ast::new(AstKind::Ident(name), position)
        } else if self.matchskip(TokenKind::Fn)? {
            let formals = self.parse_formals()?;
            let body = self.parse_block()?;
            Ast::new(AstKind::Lambda { formals, body }, position)
        } else if self.matchskip(TokenKind::Not)? {
            let expr = Box::new(self.parse_expression()?);
            Ast::new(
                AstKind::Unary {
                    op: UnaryOp::Not,
                    expr,
                },
                position,
            )
        } else if self.matchskip(TokenKind::LParen)? {
            let inner = self.parse_expression()?;
            self.expectskip(TokenKind::RParen)?;
            inner
        } else {
            return Err(Diagnostic::syntax(format!(
                "expected expression, got {}",
                self.token.kind.classname()
            ))
            .at(position));
        };

        // Postfix calls, subscripts, and dot-field sugar chain greedily left
        // to right, so `a(b)[c].d` nests as `((a(b))[c]).d`.
        loop {
            if self.matchskip(TokenKind::LParen)? {
                let mut args = Vec::new();
                while !self.matches(TokenKind::RParen) {
                    args.push(self.parse_expression()?);
                    if !self.matchskip(TokenKind::Comma)? {
                        break;
                    }
                }
                self.expectskip(TokenKind::RParen)?;
                let position = ast.position.clone();
                ast = Ast::new(
                    AstKind::Call {
                        callee: Box::new(ast),
                        args,
                    },
                    position,
                );
            } else if self.matchskip(TokenKind::LBracket)? {
                let key = Box::new(self.parse_expression()?);
                self.expectskip(TokenKind::RBracket)?;
                let position = ast.position.clone();
                ast = Ast::new(
                    AstKind::Subscript {
                        target: Box::new(ast),
                        key,
                    },
                    position,
                );
            } else if self.matchskip(TokenKind::Dot)? {
                let key_position = self.position();
                self.expect(TokenKind::Ident)?;
                let key = Ast::new(AstKind::Atom(self.token.text.clone()), key_position);
                self.skip()?;
                let position = ast.position.clone();
                ast = Ast::new(
                    AstKind::Subscript {
                        target: Box::new(ast),
                        key: Box::new(key),
                    },
                    position,
                );
            } else {
                break;
            }
        }
        Ok(ast)
    }

    fn parse_simple_literal(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        let ast = match self.token.kind {
            TokenKind::Number => {
                let number = match self.token.text.parse() {
                    Ok(number) => number,
                    Err(_) => {
                        return Err(Diagnostic::syntax(format!(
                            "malformed number literal `{}`",
                            self.token.text
                        ))
                        .at(position));
                    }
                };
                Ast::new(AstKind::Number(number), position)
            }
            TokenKind::Atom => Ast::new(AstKind::Atom(self.token.text.clone()), position),
            TokenKind::String => Ast::new(AstKind::Str(self.token.text.clone()), position),
            _ => {
                return Err(Diagnostic::syntax(format!(
                    "expected number, string or atom, got {}",
                    self.token.kind.classname()
                ))
                .at(position));
            }
        };
        self.skip()?;
        Ok(ast)
    }

    fn parse_literal(&mut self) -> Result<Ast, Diagnostic> {
        if self.matches_simple() {
            self.parse_simple_literal()
        } else if self.matches(TokenKind::LBracket) {
            self.parse_array()
        } else {
            self.parse_table()
        }
    }

    fn parse_array(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        self.expectskip(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.matches(TokenKind::RBracket) {
            elements.push(self.parse_expression()?);
            if !self.matchskip(TokenKind::Comma)? {
                break;
            }
        }
        self.expectskip(TokenKind::RBracket)?;
        Ok(Ast::new(AstKind::Array(elements), position))
    }

    fn parse_table(&mut self) -> Result<Ast, Diagnostic> {
        let position = self.position();
        self.expectskip(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while !self.matches(TokenKind::RBrace) {
            let key = self.parse_simple_literal()?;
            self.expectskip(TokenKind::Assign)?;
            let value = self.parse_expression()?;
            entries.push(TableEntry { key, value });
            if !self.matchskip(TokenKind::Comma)? {
                break;
            }
        }
        self.expectskip(TokenKind::RBrace)?;
        Ok(Ast::new(AstKind::Table(entries), position))
    }
}
