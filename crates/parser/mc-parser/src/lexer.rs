//! Hand-written lexer
//!
//! Tokens carry only their kind and span; literal and identifier text is
//! sliced back out of the source by the parser.

use derive_more::Display;
use mc_span::Span;

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenKind {
    /// Decimal integer literal
    #[display("integer literal")]
    Int,
    /// Identifier
    #[display("identifier")]
    Ident,
    /// `int`
    #[display("`int`")]
    KwInt,
    /// `return`
    #[display("`return`")]
    KwReturn,
    /// `if`
    #[display("`if`")]
    KwIf,
    /// `else`
    #[display("`else`")]
    KwElse,
    /// `while`
    #[display("`while`")]
    KwWhile,
    /// `+`
    #[display("`+`")]
    Plus,
    /// `-`
    #[display("`-`")]
    Minus,
    /// `*`
    #[display("`*`")]
    Star,
    /// `/`
    #[display("`/`")]
    Slash,
    /// `<`
    #[display("`<`")]
    Lt,
    /// `>`
    #[display("`>`")]
    Gt,
    /// `<=`
    #[display("`<=`")]
    Le,
    /// `>=`
    #[display("`>=`")]
    Ge,
    /// `==`
    #[display("`==`")]
    EqEq,
    /// `!=`
    #[display("`!=`")]
    Ne,
    /// `=`
    #[display("`=`")]
    Assign,
    /// `(`
    #[display("`(`")]
    LParen,
    /// `)`
    #[display("`)`")]
    RParen,
    /// `{`
    #[display("`{{`")]
    LBrace,
    /// `}`
    #[display("`}}`")]
    RBrace,
    /// `,`
    #[display("`,`")]
    Comma,
    /// `;`
    #[display("`;`")]
    Semi,
}

/// A lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Kind
    pub kind: TokenKind,
    /// Source location
    pub span: Span,
}

/// Failure to tokenize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// A character that starts no token
    InvalidCharacter {
        /// Offending character
        character: char,
        /// Its location
        span: Span,
    },
    /// Source longer than a [`Span`] can address
    SourceTooLarge {
        /// Length in bytes
        len: usize,
    },
}

/// Splits `source` into tokens, skipping whitespace and `//` comments
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
}

impl Lexer<'_> {
    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek_byte(0).is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek_byte(0), self.peek_byte(1)) {
                (Some(byte), _) if byte.is_ascii_whitespace() => self.pos += 1,
                (Some(b'/'), Some(b'/')) => self.eat_while(|byte| byte != b'\n'),
                _ => break,
            }
        }
    }

    /// One-byte token, or a two-byte one when followed by `=`
    fn with_eq(&mut self, single: TokenKind, double: TokenKind) -> TokenKind {
        if self.peek_byte(1) == Some(b'=') {
            self.pos += 2;
            double
        } else {
            self.pos += 1;
            single
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_trivia();
        let start = self.pos;
        let Some(byte) = self.peek_byte(0) else {
            return Ok(None);
        };

        let kind = match byte {
            b'0'..=b'9' => {
                self.eat_while(|next| next.is_ascii_digit());
                TokenKind::Int
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.eat_while(|next| next.is_ascii_alphanumeric() || next == b'_');
                keyword(&self.source[start..self.pos]).unwrap_or(TokenKind::Ident)
            }
            b'<' => self.with_eq(TokenKind::Lt, TokenKind::Le),
            b'>' => self.with_eq(TokenKind::Gt, TokenKind::Ge),
            b'=' => self.with_eq(TokenKind::Assign, TokenKind::EqEq),
            b'!' if self.peek_byte(1) == Some(b'=') => {
                self.pos += 2;
                TokenKind::Ne
            }
            _ => {
                let kind = match byte {
                    b'+' => TokenKind::Plus,
                    b'-' => TokenKind::Minus,
                    b'*' => TokenKind::Star,
                    b'/' => TokenKind::Slash,
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    b',' => TokenKind::Comma,
                    b';' => TokenKind::Semi,
                    _ => return Err(self.invalid_character(start)?),
                };
                self.pos += 1;
                kind
            }
        };

        Ok(Some(Token {
            kind,
            span: self.span(start, self.pos)?,
        }))
    }

    /// The error for the character at `start`, or a failure to locate it
    fn invalid_character(&self, start: usize) -> Result<LexError, LexError> {
        let character = self.source[start..].chars().next().unwrap_or('\0');
        Ok(LexError::InvalidCharacter {
            character,
            span: self.span(start, start + character.len_utf8())?,
        })
    }

    fn span(&self, start: usize, end: usize) -> Result<Span, LexError> {
        byte_span(start, end).ok_or(LexError::SourceTooLarge {
            len: self.source.len(),
        })
    }
}

/// `start..end` as a [`Span`], if both offsets fit in `u32`
fn byte_span(start: usize, end: usize) -> Option<Span> {
    Some(Span::new(u32::try_from(start).ok()?, u32::try_from(end).ok()?))
}

fn keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "int" => TokenKind::KwInt,
        "return" => TokenKind::KwReturn,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        _ => return None,
    })
}
