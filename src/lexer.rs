use crate::diagnostics::{Diagnostic, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Ident,
    Atom,
    Number,
    String,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    And,
    Or,
    BitAnd,
    BitOr,
    Not,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    PlusPlus,
    MinusMinus,
    Var,
    Fun,
    Fn,
    Same,
    If,
    Elif,
    Else,
    While,
}

impl TokenKind {
    /// Human-readable class name used in syntax error messages.
    pub fn classname(self) -> &'static str {
        match self {
            TokenKind::Eof => "<end of file>",
            TokenKind::Ident => "<identifier>",
            TokenKind::Atom => "<atom>",
            TokenKind::Number => "<number>",
            TokenKind::String => "<string>",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Dot => "`.`",
            TokenKind::Assign => "`=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::And => "`&&`",
            TokenKind::Or => "`||`",
            TokenKind::BitAnd => "`&`",
            TokenKind::BitOr => "`|`",
            TokenKind::Not => "`!`",
            TokenKind::Equal => "`==`",
            TokenKind::NotEqual => "`!=`",
            TokenKind::Less => "`<`",
            TokenKind::Greater => "`>`",
            TokenKind::LessEqual => "`<=`",
            TokenKind::GreaterEqual => "`>=`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::Var => "keyword `var`",
            TokenKind::Fun => "keyword `fun`",
            TokenKind::Fn => "keyword `fn`",
            TokenKind::Same => "keyword `same`",
            TokenKind::If => "keyword `if`",
            TokenKind::Elif => "keyword `elif`",
            TokenKind::Else => "keyword `else`",
            TokenKind::While => "keyword `while`",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Lexeme for identifiers and numbers, decoded content for strings,
    /// the name without the leading `:` for atoms.
    pub text: String,
    /// Position of the token's first character.
    pub position: Position,
}

fn keyword_for(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "var" => TokenKind::Var,
        "fun" => TokenKind::Fun,
        "fn" => TokenKind::Fn,
        "same" => TokenKind::Same,
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || !ch.is_ascii()
}

/// Characters allowed inside identifiers and atom names.
fn is_natural(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit() || ch == '_'
}

/// A stateful cursor over source text that yields one token per `next` call,
/// always advancing, never backtracking. The parser holds a single token of
/// lookahead and pulls the rest on demand.
pub struct Lexer<'a> {
    chars: std::str::Chars<'a>,
    peeked: Option<char>,
    position: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(filename: &str, source: &'a str) -> Self {
        Self {
            chars: source.chars(),
            peeked: None,
            position: Position::start(filename),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peeked.take().or_else(|| self.chars.next())?;
        if ch == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn token(&self, kind: TokenKind, text: impl Into<String>, position: Position) -> Token {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    fn eof(&self, position: Position) -> Token {
        self.token(TokenKind::Eof, "", position)
    }

    /// Emit a two-character token when the next character matches, else the
    /// single-character fallback.
    fn compose(
        &mut self,
        ch: char,
        expected: char,
        double: TokenKind,
        single: TokenKind,
        position: Position,
    ) -> Token {
        if self.peek() == Some(expected) {
            self.bump();
            let mut text = String::from(ch);
            text.push(expected);
            self.token(double, text, position)
        } else {
            self.token(single, ch.to_string(), position)
        }
    }

    fn ident(&mut self, first: char, position: Position) -> Token {
        let mut text = String::from(first);
        while let Some(ch) = self.peek() {
            if !is_natural(ch) {
                break;
            }
            text.push(ch);
            self.bump();
        }
        let kind = keyword_for(&text).unwrap_or(TokenKind::Ident);
        self.token(kind, text, position)
    }

    fn atom(&mut self, position: Position) -> Result<Token, Diagnostic> {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !is_natural(ch) {
                break;
            }
            text.push(ch);
            self.bump();
        }
        if text.is_empty() {
            return Err(Diagnostic::lexer("expected name to follow beginning of atom")
                .at(position));
        }
        Ok(self.token(TokenKind::Atom, text, position))
    }

    fn number(&mut self, first: char, position: Position) -> Result<Token, Diagnostic> {
        let mut text = String::from(first);
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.bump();
        }
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            while let Some(ch) = self.peek() {
                if !ch.is_ascii_digit() {
                    break;
                }
                text.push(ch);
                self.bump();
            }
        }
        if let Some(exponent @ ('e' | 'E')) = self.peek() {
            text.push(exponent);
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            let mut digits = 0;
            while let Some(ch) = self.peek() {
                if !ch.is_ascii_digit() {
                    break;
                }
                text.push(ch);
                self.bump();
                digits += 1;
            }
            if digits == 0 {
                return Err(
                    Diagnostic::lexer("expected number after exponent `e` character")
                        .at(self.position.clone()),
                );
            }
        }
        Ok(self.token(TokenKind::Number, text, position))
    }

    fn string(&mut self, quote: char, position: Position) -> Token {
        let mut text = String::new();
        loop {
            let ch = match self.bump() {
                Some(ch) => ch,
                // Unterminated strings run to end-of-input and report it as
                // reaching end of file, not a dedicated error kind.
                None => return self.eof(self.position.clone()),
            };
            if ch == quote {
                return self.token(TokenKind::String, text, position);
            }
            if ch == '\\' {
                let escape = match self.bump() {
                    Some(escape) => escape,
                    None => return self.eof(self.position.clone()),
                };
                match escape {
                    'a' => text.push('\x07'),
                    'b' => text.push('\x08'),
                    'f' => text.push('\x0c'),
                    'n' => text.push('\n'),
                    'r' => text.push('\r'),
                    't' => text.push('\t'),
                    '\\' => text.push('\\'),
                    '\'' => text.push('\''),
                    '"' => text.push('"'),
                    // Unrecognized escapes are dropped.
                    _ => {}
                }
            } else {
                text.push(ch);
            }
        }
    }

    /// Produce the next token. End of input yields the EOF token; every call
    /// after that yields EOF again.
    pub fn next(&mut self) -> Result<Token, Diagnostic> {
        self.skip_whitespace_and_comments();
        let position = self.position.clone();
        let ch = match self.bump() {
            Some(ch) => ch,
            None => return Ok(self.eof(position)),
        };

        if is_ident_start(ch) {
            return Ok(self.ident(ch, position));
        }
        if ch.is_ascii_digit() {
            return self.number(ch, position);
        }
        if (ch == '+' || ch == '-') && self.peek().is_some_and(|next| next.is_ascii_digit()) {
            return self.number(ch, position);
        }
        if ch == ':' {
            return self.atom(position);
        }
        if ch == '"' || ch == '\'' {
            return Ok(self.string(ch, position));
        }

        let token = match ch {
            '(' => self.token(TokenKind::LParen, "(", position),
            ')' => self.token(TokenKind::RParen, ")", position),
            '{' => self.token(TokenKind::LBrace, "{", position),
            '}' => self.token(TokenKind::RBrace, "}", position),
            '[' => self.token(TokenKind::LBracket, "[", position),
            ']' => self.token(TokenKind::RBracket, "]", position),
            ',' => self.token(TokenKind::Comma, ",", position),
            ';' => self.token(TokenKind::Semicolon, ";", position),
            '.' => self.token(TokenKind::Dot, ".", position),
            '*' => self.token(TokenKind::Star, "*", position),
            '/' => self.token(TokenKind::Slash, "/", position),
            '%' => self.token(TokenKind::Percent, "%", position),
            '+' => self.compose(ch, '+', TokenKind::PlusPlus, TokenKind::Plus, position),
            '-' => self.compose(ch, '-', TokenKind::MinusMinus, TokenKind::Minus, position),
            '!' => self.compose(ch, '=', TokenKind::NotEqual, TokenKind::Not, position),
            '<' => self.compose(ch, '=', TokenKind::LessEqual, TokenKind::Less, position),
            '>' => self.compose(ch, '=', TokenKind::GreaterEqual, TokenKind::Greater, position),
            '=' => self.compose(ch, '=', TokenKind::Equal, TokenKind::Assign, position),
            '&' => self.compose(ch, '&', TokenKind::And, TokenKind::BitAnd, position),
            '|' => self.compose(ch, '|', TokenKind::Or, TokenKind::BitOr, position),
            _ => {
                return Err(
                    Diagnostic::lexer(format!("unrecognized character `{ch}`")).at(position),
                );
            }
        };
        Ok(token)
    }
}
