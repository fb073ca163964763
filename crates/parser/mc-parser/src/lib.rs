//! Parser for minic source text
//!
//! A hand-written lexer feeds a recursive-descent parser that builds an owned
//! [`Program`]. Parsing holds no global state; every call works on its own
//! token buffer.
//!
//! ```text
//! program    := stmt*
//! stmt       := "return" expr ";" | "int" IDENT ("=" expr)? ";" | IDENT "=" expr ";"
//!             | "{" stmt* "}" | "if" "(" expr ")" stmt ("else" stmt)?
//!             | "while" "(" expr ")" stmt | expr ";"
//! expr       := additive (("<"|">"|"<="|">="|"=="|"!=") additive)?
//! additive   := term (("+"|"-") term)*
//! term       := primary (("*"|"/") primary)*
//! primary    := INT | "-" INT | IDENT | IDENT "(" args? ")" | "(" expr ")"
//! ```

pub mod error;
pub mod lexer;

pub use error::ParseError;

use lexer::{LexError, Token, TokenKind};
use mc_ast::{BinaryOp, CompareOp, Expr, Program, Stmt};
use mc_span::Span;
use miette::{NamedSource, SourceSpan};

/// Name used for sources that do not come from a file
pub const ANONYMOUS_SOURCE: &str = "<input>";

/// Deepest tree the parser will build
///
/// Later passes walk the tree recursively, so this also bounds their stack
/// use. Each nested statement, parenthesised expression, call argument and
/// chained operator counts as one level.
pub const MAX_NESTING: usize = 256;

/// Parse a program from anonymous source text
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    parse_named(ANONYMOUS_SOURCE, source)
}

/// Parse a program, attributing diagnostics to `name`
pub fn parse_named(name: &str, source: &str) -> Result<Program, ParseError> {
    let mut parser = Parser::new(name, source)?;
    let program = parser.parse_program()?;
    log::debug!(
        "parsed {name}: {} tokens, {} top-level statements",
        parser.tokens.len(),
        program.statements.len()
    );
    Ok(program)
}

struct Parser<'src> {
    name: &'src str,
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'src> Parser<'src> {
    fn new(name: &'src str, source: &'src str) -> Result<Self, ParseError> {
        let tokens = lexer::tokenize(source).map_err(|err| match err {
            LexError::InvalidCharacter { character, span } => ParseError::InvalidCharacter {
                character,
                span: to_source_span(span),
                src: NamedSource::new(name, source.to_owned()),
            },
            LexError::SourceTooLarge { len } => ParseError::SourceTooLarge {
                name: name.to_owned(),
                len,
            },
        })?;
        Ok(Self {
            name,
            source,
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    fn src(&self) -> NamedSource<String> {
        NamedSource::new(self.name, self.source.to_owned())
    }

    fn text(&self, span: Span) -> &'src str {
        &self.source[span.range()]
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn nth_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|token| token.kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(kind.to_string())),
        }
    }

    /// Go one level deeper, failing past [`MAX_NESTING`]
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            let span = self
                .peek()
                .map_or_else(|| (self.source.len(), 0).into(), |token| to_source_span(token.span));
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING,
                span,
                src: self.src(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `parse` one level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.descend()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Error for whatever sits at the cursor
    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let expected = expected.into();
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                found: self.text(token.span).to_owned(),
                expected,
                span: to_source_span(token.span),
                src: self.src(),
            },
            None => ParseError::UnexpectedEof {
                expected,
                span: (self.source.len(), 0).into(),
                src: self.src(),
            },
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            statements.push(self.parse_stmt()?);
        }
        Ok(Program::new(statements))
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::KwReturn) => {
                self.pos += 1;
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::ret(value))
            }
            Some(TokenKind::KwInt) => {
                self.pos += 1;
                let name = self.expect(TokenKind::Ident)?;
                let initializer = if self.eat(TokenKind::Assign) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::decl(self.text(name.span), initializer))
            }
            Some(TokenKind::LBrace) => self.parse_block(),
            Some(TokenKind::KwIf) => {
                self.pos += 1;
                let condition = self.parse_condition()?;
                let then_branch = self.nested(Self::parse_stmt)?;
                // Binds to the nearest `if`
                let else_branch = if self.eat(TokenKind::KwElse) {
                    Some(self.nested(Self::parse_stmt)?)
                } else {
                    None
                };
                Ok(Stmt::if_else(condition, then_branch, else_branch))
            }
            Some(TokenKind::KwWhile) => {
                self.pos += 1;
                let condition = self.parse_condition()?;
                let body = self.nested(Self::parse_stmt)?;
                Ok(Stmt::while_loop(condition, body))
            }
            Some(TokenKind::Ident) if self.nth_kind(1) == Some(TokenKind::Assign) => {
                let name = self.text(self.tokens[self.pos].span);
                self.pos += 2;
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::assign(name, value))
            }
            Some(_) => {
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::expr(value))
            }
            None => Err(self.unexpected("statement")),
        }
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.eat(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected(TokenKind::RBrace.to_string()));
            }
            body.push(self.nested(Self::parse_stmt)?);
        }
        Ok(Stmt::block(body))
    }

    /// `( expr )` after `if` or `while`
    fn parse_condition(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(condition)
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        let Some(op) = self.peek_kind().and_then(compare_op) else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.nested(Self::parse_additive)?;

        if let Some(next) = self.peek()
            && compare_op(next.kind).is_some()
        {
            return Err(ParseError::ChainedComparison {
                span: to_source_span(next.span),
                src: self.src(),
            });
        }
        Ok(Expr::compare(op, left, right))
    }

    /// Each operator in the chain nests the tree one level deeper
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let base = self.depth;
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => {
                    self.depth = base;
                    return Ok(left);
                }
            };
            self.descend()?;
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let base = self.depth;
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => {
                    self.depth = base;
                    return Ok(left);
                }
            };
            self.descend()?;
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("expression"));
        };
        match token.kind {
            TokenKind::Int => {
                self.pos += 1;
                self.integer_literal(token.span, token.span, false)
            }
            TokenKind::Minus => {
                self.pos += 1;
                let literal = self.expect(TokenKind::Int)?;
                self.integer_literal(token.span.to(literal.span), literal.span, true)
            }
            TokenKind::Ident => {
                self.pos += 1;
                let name = self.text(token.span);
                if self.eat(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::call(name, args))
                } else {
                    Ok(Expr::var(name))
                }
            }
            TokenKind::LParen => {
                self.descend()?;
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.nested(Self::parse_expr)?);
            if !self.eat(TokenKind::Comma) {
                self.expect(TokenKind::RParen)?;
                return Ok(args);
            }
        }
    }

    /// `full` covers the literal including any sign, `digits` only the digits
    fn integer_literal(&self, full: Span, digits: Span, negative: bool) -> Result<Expr, ParseError> {
        let overflow = || ParseError::IntegerOverflow {
            literal: self.text(full).to_owned(),
            span: to_source_span(full),
            src: self.src(),
        };
        let magnitude: i64 = self.text(digits).parse().map_err(|_| overflow())?;
        let value = if negative { -magnitude } else { magnitude };
        let value = i32::try_from(value).map_err(|_| overflow())?;
        Ok(Expr::int(value))
    }
}

fn compare_op(kind: TokenKind) -> Option<CompareOp> {
    Some(match kind {
        TokenKind::Lt => CompareOp::Lt,
        TokenKind::Gt => CompareOp::Gt,
        TokenKind::Le => CompareOp::Le,
        TokenKind::Ge => CompareOp::Ge,
        TokenKind::EqEq => CompareOp::Eq,
        TokenKind::Ne => CompareOp::Ne,
        _ => return None,
    })
}

fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.range())
}
