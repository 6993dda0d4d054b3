//! Tokenizer for specification files.
//!
//! Tracks line/column positions for every token. Code blocks are captured
//! verbatim with brace counting; `//` starts a line comment.

use std::path::Path;

use compact_str::CompactString;

use crate::error::{LexicalError, Pos};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(CompactString),
    /// A `{ ... }` block, without the outer braces.
    Code(String),
    KwRule,
    KwPartial,
    KwUnreachable,
    KwStartsymbols,
    Bar,
    Semi,
    Star,
    Bang,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Dot,
    Underscore,
    Eq,
    Eof,
}

impl TokenKind {
    /// Short description for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{name}`"),
            Self::Code(_) => "code block".to_string(),
            Self::KwRule => "`rule`".to_string(),
            Self::KwPartial => "`partial`".to_string(),
            Self::KwUnreachable => "`unreachable`".to_string(),
            Self::KwStartsymbols => "`startsymbols`".to_string(),
            Self::Bar => "`|`".to_string(),
            Self::Semi => "`;`".to_string(),
            Self::Star => "`*`".to_string(),
            Self::Bang => "`!`".to_string(),
            Self::LBracket => "`[`".to_string(),
            Self::RBracket => "`]`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::Colon => "`:`".to_string(),
            Self::Dot => "`.`".to_string(),
            Self::Underscore => "`_`".to_string(),
            Self::Eq => "`=`".to_string(),
            Self::Eof => "end of file".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

struct Lexer<'src> {
    source: &'src str,
    chars: std::iter::Peekable<std::str::Chars<'src>>,
    offset: usize,
    line: u32,
    column: u32,
    file: &'src Path,
}

/// Tokenize a whole file.
pub fn tokenize(source: &str, file: &Path) -> Result<Vec<Token>, LexicalError> {
    let mut lexer = Lexer {
        source,
        chars: source.chars().peekable(),
        offset: 0,
        line: 1,
        column: 1,
        file,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl Lexer<'_> {
    fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn error(&self, pos: Pos, message: impl Into<String>) -> LexicalError {
        LexicalError {
            file: self.file.to_path_buf(),
            pos,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Token, LexicalError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.source[self.offset..].starts_with("//") => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }

        let pos = self.pos();
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                pos,
            });
        };

        let kind = match c {
            '|' => self.single(TokenKind::Bar),
            ';' => self.single(TokenKind::Semi),
            '*' => self.single(TokenKind::Star),
            '!' => self.single(TokenKind::Bang),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ':' => self.single(TokenKind::Colon),
            '.' => self.single(TokenKind::Dot),
            '=' => self.single(TokenKind::Eq),
            '{' => self.code_block(pos)?,
            c if c.is_alphanumeric() || c == '_' => self.word(),
            c => {
                return Err(self.error(pos, format!("unexpected character '{c}'")));
            }
        };
        Ok(Token { kind, pos })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn word(&mut self) -> TokenKind {
        let start = self.offset;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.offset];
        match text {
            "_" => TokenKind::Underscore,
            "rule" => TokenKind::KwRule,
            "partial" => TokenKind::KwPartial,
            "unreachable" => TokenKind::KwUnreachable,
            "startsymbols" => TokenKind::KwStartsymbols,
            _ => TokenKind::Ident(CompactString::from(text)),
        }
    }

    fn code_block(&mut self, pos: Pos) -> Result<TokenKind, LexicalError> {
        self.bump();
        let start = self.offset;
        let mut depth = 1usize;
        loop {
            match self.peek() {
                Some('{') => {
                    depth += 1;
                    self.bump();
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        let code = self.source[start..self.offset].to_string();
                        self.bump();
                        return Ok(TokenKind::Code(code));
                    }
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.error(pos, "unterminated code block")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, &PathBuf::from("test.lrm"))
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_punctuation_and_keywords() {
        let kinds = kinds("rule main = | ! ; * [ ] ( ) : . _");
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwRule,
                TokenKind::Ident("main".into()),
                TokenKind::Eq,
                TokenKind::Bar,
                TokenKind::Bang,
                TokenKind::Semi,
                TokenKind::Star,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Colon,
                TokenKind::Dot,
                TokenKind::Underscore,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_code_block_counts_braces() {
        let kinds = kinds("{ if x { y } else { z } }");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Code(" if x { y } else { z } ".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_comments_are_skipped() {
        let kinds = kinds("rule // comment | ! *\nmain");
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwRule,
                TokenKind::Ident("main".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_are_tracked() {
        let tokens = tokenize("rule\n  main", &PathBuf::from("test.lrm")).unwrap();
        assert_eq!(tokens[0].pos, Pos::new(1, 1));
        assert_eq!(tokens[1].pos, Pos::new(2, 3));
    }

    #[test]
    fn test_unterminated_code_block_is_a_lexical_error() {
        let err = tokenize("{ never closed", &PathBuf::from("bad.lrm")).unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.pos, Pos::new(1, 1));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("rule @", &PathBuf::from("bad.lrm")).unwrap_err();
        assert!(err.message.contains('@'));
        assert_eq!(err.pos, Pos::new(1, 6));
    }
}
