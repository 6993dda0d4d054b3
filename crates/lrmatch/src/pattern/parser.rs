//! Recursive-descent parser for specification files.
//!
//! Alternation binds loosest, then sequencing with `;`, then the postfix
//! `*`. A clause's pattern ends at its action (`{ ... }`, `partial`, or
//! `unreachable`), so the leading `|` of the next clause is unambiguous.

use std::path::{Path, PathBuf};

use crate::error::{Error, ParseError, Pos};
use crate::pattern::lexer::{tokenize, Token, TokenKind};
use crate::pattern::syntax::{
    Action, Clause, CodeBlock, ItemSymAst, Name, Pattern, PatternKind, RuleDef, SpecFile,
};

/// Parse a whole specification source.
pub fn parse_source(source: &str, file: &Path) -> Result<SpecFile, Error> {
    let tokens = tokenize(source, file)?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        file: file.to_path_buf(),
    };
    let spec = parser.file()?;
    Ok(spec)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    file: PathBuf,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.cursor].kind
    }

    fn peek_pos(&self) -> Pos {
        self.tokens[self.cursor].pos
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.cursor].clone();
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                kind.describe(),
                self.peek().describe()
            )))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            file: self.file.clone(),
            pos: self.peek_pos(),
            message: message.into(),
        }
    }

    fn ident(&mut self, what: &str) -> Result<Name, ParseError> {
        let pos = self.peek_pos();
        match self.peek().clone() {
            TokenKind::Ident(text) => {
                self.advance();
                Ok(Name { text, pos })
            }
            other => Err(self.error(format!("expected {what}, found {}", other.describe()))),
        }
    }

    fn file(&mut self) -> Result<SpecFile, ParseError> {
        let header = self.code_block_opt();

        let mut startsymbols = Vec::new();
        if self.consume(&TokenKind::KwStartsymbols) {
            while matches!(self.peek(), TokenKind::Ident(_)) {
                startsymbols.push(self.ident("a start symbol")?);
            }
            if startsymbols.is_empty() {
                return Err(self.error("startsymbols requires at least one symbol"));
            }
        }

        self.expect(&TokenKind::KwRule)?;
        let name = self.ident("a rule name")?;
        let mut args = Vec::new();
        while matches!(self.peek(), TokenKind::Ident(_)) {
            args.push(self.ident("an argument name")?);
        }
        self.expect(&TokenKind::Eq)?;

        let mut clauses = Vec::new();
        while self.check(&TokenKind::Bar) {
            self.advance();
            let pattern = self.pattern()?;
            let action = self.action()?;
            clauses.push(Clause { pattern, action });
        }
        if clauses.is_empty() {
            return Err(self.error("a rule requires at least one clause"));
        }

        let trailer = self.code_block_opt();
        self.expect(&TokenKind::Eof)?;

        Ok(SpecFile {
            header,
            startsymbols,
            rule: RuleDef {
                name,
                args,
                clauses,
            },
            trailer,
        })
    }

    fn code_block_opt(&mut self) -> Option<CodeBlock> {
        let pos = self.peek_pos();
        if let TokenKind::Code(code) = self.peek().clone() {
            self.advance();
            Some(CodeBlock { code, pos })
        } else {
            None
        }
    }

    fn action(&mut self) -> Result<Action, ParseError> {
        let pos = self.peek_pos();
        if self.consume(&TokenKind::KwUnreachable) {
            return Ok(Action::Unreachable { pos });
        }
        let partial = self.consume(&TokenKind::KwPartial);
        let pos = self.peek_pos();
        match self.peek().clone() {
            TokenKind::Code(code) => {
                self.advance();
                Ok(Action::Code {
                    block: CodeBlock { code, pos },
                    partial,
                })
            }
            other => Err(self.error(format!(
                "expected an action (code block or `unreachable`), found {}",
                other.describe()
            ))),
        }
    }

    /// pattern ::= seq ('|' seq)*
    fn pattern(&mut self) -> Result<Pattern, ParseError> {
        let pos = self.peek_pos();
        let first = self.seq()?;
        if !self.check(&TokenKind::Bar) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.consume(&TokenKind::Bar) {
            items.push(self.seq()?);
        }
        Ok(Pattern {
            pos,
            kind: PatternKind::Alt(items),
        })
    }

    /// seq ::= postfix (';' postfix)*
    fn seq(&mut self) -> Result<Pattern, ParseError> {
        let pos = self.peek_pos();
        let first = self.postfix()?;
        if !self.check(&TokenKind::Semi) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.consume(&TokenKind::Semi) {
            items.push(self.postfix()?);
        }
        Ok(Pattern {
            pos,
            kind: PatternKind::Seq(items),
        })
    }

    /// postfix ::= base '*'*
    fn postfix(&mut self) -> Result<Pattern, ParseError> {
        let mut base = self.base()?;
        while self.check(&TokenKind::Star) {
            let pos = self.peek_pos();
            self.advance();
            base = Pattern {
                pos,
                kind: PatternKind::Star(Box::new(base)),
            };
        }
        Ok(base)
    }

    fn base(&mut self) -> Result<Pattern, ParseError> {
        let pos = self.peek_pos();
        match self.peek().clone() {
            TokenKind::Bang => {
                self.advance();
                Ok(Pattern {
                    pos,
                    kind: PatternKind::Reduce,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.pattern()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let item = self.item(pos)?;
                self.expect(&TokenKind::RBracket)?;
                Ok(item)
            }
            TokenKind::Dot | TokenKind::Underscore => {
                self.advance();
                Ok(Pattern {
                    pos,
                    kind: PatternKind::Wildcard { capture: None },
                })
            }
            TokenKind::Ident(_) => {
                let name = self.ident("a symbol")?;
                if self.consume(&TokenKind::Eq) {
                    // `name = atom` binds a capture.
                    let atom_pos = self.peek_pos();
                    match self.peek().clone() {
                        TokenKind::Dot | TokenKind::Underscore => {
                            self.advance();
                            Ok(Pattern {
                                pos,
                                kind: PatternKind::Wildcard {
                                    capture: Some(name),
                                },
                            })
                        }
                        TokenKind::Ident(_) => {
                            let symbol = self.ident("a symbol")?;
                            Ok(Pattern {
                                pos,
                                kind: PatternKind::Symbol {
                                    capture: Some(name),
                                    name: symbol,
                                },
                            })
                        }
                        other => Err(ParseError {
                            file: self.file.clone(),
                            pos: atom_pos,
                            message: format!(
                                "expected an atom after `=`, found {}",
                                other.describe()
                            ),
                        }),
                    }
                } else {
                    Ok(Pattern {
                        pos,
                        kind: PatternKind::Symbol {
                            capture: None,
                            name,
                        },
                    })
                }
            }
            other => Err(self.error(format!("expected a pattern, found {}", other.describe()))),
        }
    }

    /// item ::= (ident ':')? itemsym* '.' itemsym*
    fn item(&mut self, pos: Pos) -> Result<Pattern, ParseError> {
        let mut lhs = None;
        let mut prefix = Vec::new();

        // `ident :` introduces the left-hand side; a lone ident is the
        // first prefix symbol.
        if matches!(self.peek(), TokenKind::Ident(_)) {
            let name = self.ident("a symbol")?;
            if self.consume(&TokenKind::Colon) {
                lhs = Some(name);
            } else {
                prefix.push(ItemSymAst::Name(name));
            }
        }

        loop {
            match self.peek().clone() {
                TokenKind::Ident(_) => prefix.push(ItemSymAst::Name(self.ident("a symbol")?)),
                TokenKind::Underscore => {
                    prefix.push(ItemSymAst::Wild(self.peek_pos()));
                    self.advance();
                }
                TokenKind::Dot => break,
                other => {
                    return Err(self.error(format!(
                        "expected a symbol or `.` in item, found {}",
                        other.describe()
                    )))
                }
            }
        }
        self.expect(&TokenKind::Dot)?;

        let mut suffix = Vec::new();
        loop {
            match self.peek().clone() {
                TokenKind::Ident(_) => suffix.push(ItemSymAst::Name(self.ident("a symbol")?)),
                TokenKind::Underscore => {
                    suffix.push(ItemSymAst::Wild(self.peek_pos()));
                    self.advance();
                }
                _ => break,
            }
        }

        Ok(Pattern {
            pos,
            kind: PatternKind::Item {
                lhs,
                prefix,
                suffix,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(source: &str) -> SpecFile {
        parse_source(source, &PathBuf::from("test.lrm")).expect("parse failure")
    }

    fn parse_err(source: &str) -> Error {
        parse_source(source, &PathBuf::from("test.lrm")).unwrap_err()
    }

    #[test]
    fn test_minimal_rule() {
        let spec = parse("rule error_message = | IDENT { msg }");
        assert_eq!(spec.rule.name.text, "error_message");
        assert_eq!(spec.rule.clauses.len(), 1);
        assert!(spec.header.is_none());
        assert!(spec.trailer.is_none());
        let clause = &spec.rule.clauses[0];
        assert!(matches!(
            clause.pattern.kind,
            PatternKind::Symbol { capture: None, .. }
        ));
        assert!(matches!(
            clause.action,
            Action::Code { partial: false, .. }
        ));
    }

    #[test]
    fn test_header_rule_trailer() {
        let spec = parse("{ use crate::X; } rule r = | _ { a } { fn helper() {} }");
        assert_eq!(spec.header.as_ref().unwrap().code, " use crate::X; ");
        assert_eq!(spec.trailer.as_ref().unwrap().code, " fn helper() {} ");
    }

    #[test]
    fn test_startsymbols() {
        let spec = parse("startsymbols program expr rule r = | _ { a }");
        let names: Vec<&str> = spec
            .startsymbols
            .iter()
            .map(|n| n.text.as_str())
            .collect();
        assert_eq!(names, vec!["program", "expr"]);
    }

    #[test]
    fn test_precedence_alt_seq_star() {
        // `A ; B * | C` parses as Alt(Seq(A, Star(B)), C).
        let spec = parse("rule r = | A ; B * | C { a }");
        let PatternKind::Alt(branches) = &spec.rule.clauses[0].pattern.kind else {
            panic!("expected alternation at the top");
        };
        assert_eq!(branches.len(), 2);
        let PatternKind::Seq(items) = &branches[0].kind else {
            panic!("expected a sequence on the left");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1].kind, PatternKind::Star(_)));
    }

    #[test]
    fn test_multiple_clauses() {
        let spec = parse("rule r = | A { one } | B partial { two } | C unreachable");
        assert_eq!(spec.rule.clauses.len(), 3);
        assert!(matches!(
            spec.rule.clauses[1].action,
            Action::Code { partial: true, .. }
        ));
        assert!(matches!(
            spec.rule.clauses[2].action,
            Action::Unreachable { .. }
        ));
    }

    #[test]
    fn test_item_template() {
        let spec = parse("rule r = | [expr: expr PLUS . expr] { a }");
        let PatternKind::Item {
            lhs,
            prefix,
            suffix,
        } = &spec.rule.clauses[0].pattern.kind
        else {
            panic!("expected an item pattern");
        };
        assert_eq!(lhs.as_ref().unwrap().text, "expr");
        assert_eq!(prefix.len(), 2);
        assert_eq!(suffix.len(), 1);
    }

    #[test]
    fn test_item_without_lhs() {
        let spec = parse("rule r = | [_ . RPAREN] { a }");
        let PatternKind::Item { lhs, prefix, suffix } = &spec.rule.clauses[0].pattern.kind
        else {
            panic!("expected an item pattern");
        };
        assert!(lhs.is_none());
        assert!(matches!(prefix[0], ItemSymAst::Wild(_)));
        assert_eq!(suffix.len(), 1);
    }

    #[test]
    fn test_capture_binding() {
        let spec = parse("rule r = | x = IDENT ; _ { a }");
        let PatternKind::Seq(items) = &spec.rule.clauses[0].pattern.kind else {
            panic!("expected a sequence");
        };
        let PatternKind::Symbol { capture, name } = &items[0].kind else {
            panic!("expected a captured symbol");
        };
        assert_eq!(capture.as_ref().unwrap().text, "x");
        assert_eq!(name.text, "IDENT");
    }

    #[test]
    fn test_reduce_and_wildcard() {
        let spec = parse("rule r = | _ * ; LPAREN ; ! { unclosed }");
        let PatternKind::Seq(items) = &spec.rule.clauses[0].pattern.kind else {
            panic!("expected a sequence");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0].kind, PatternKind::Star(_)));
        assert!(matches!(items[2].kind, PatternKind::Reduce));
    }

    #[test]
    fn test_missing_action_is_a_parse_error() {
        let err = parse_err("rule r = | A");
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("expected an action"));
    }

    #[test]
    fn test_missing_clauses_is_a_parse_error() {
        let err = parse_err("rule r =");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_lexical_error_propagates() {
        let err = parse_err("rule r = | A { x } @");
        assert_eq!(err.exit_code(), 3);
    }
}
