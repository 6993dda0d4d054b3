//! Surface syntax tree of a specification file.

use compact_str::CompactString;

use crate::error::Pos;

/// An identifier with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub text: CompactString,
    pub pos: Pos,
}

/// A verbatim user code block (without the outer braces).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub code: String,
    pub pos: Pos,
}

/// A whole specification file.
#[derive(Debug, Clone)]
pub struct SpecFile {
    pub header: Option<CodeBlock>,
    pub startsymbols: Vec<Name>,
    pub rule: RuleDef,
    pub trailer: Option<CodeBlock>,
}

/// `rule name args = clauses`.
#[derive(Debug, Clone)]
pub struct RuleDef {
    pub name: Name,
    pub args: Vec<Name>,
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
pub struct Clause {
    pub pattern: Pattern,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub enum Action {
    Code { block: CodeBlock, partial: bool },
    Unreachable { pos: Pos },
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub pos: Pos,
    pub kind: PatternKind,
}

#[derive(Debug, Clone)]
pub enum PatternKind {
    /// A bare symbol, optionally captured: `x = IDENT`.
    Symbol {
        capture: Option<Name>,
        name: Name,
    },
    /// `.` or `_`, optionally captured.
    Wildcard {
        capture: Option<Name>,
    },
    /// `[lhs: prefix . suffix]`.
    Item {
        lhs: Option<Name>,
        prefix: Vec<ItemSymAst>,
        suffix: Vec<ItemSymAst>,
    },
    /// `!`.
    Reduce,
    Seq(Vec<Pattern>),
    Alt(Vec<Pattern>),
    Star(Box<Pattern>),
}

#[derive(Debug, Clone)]
pub enum ItemSymAst {
    Wild(Pos),
    Name(Name),
}

/// Render the parse tree as an indented dump (the `-d` flag).
#[must_use]
pub fn dump(file: &SpecFile) -> String {
    let mut out = String::new();
    if file.header.is_some() {
        out.push_str("header\n");
    }
    if !file.startsymbols.is_empty() {
        out.push_str("startsymbols");
        for name in &file.startsymbols {
            out.push(' ');
            out.push_str(&name.text);
        }
        out.push('\n');
    }
    out.push_str("rule ");
    out.push_str(&file.rule.name.text);
    for arg in &file.rule.args {
        out.push(' ');
        out.push_str(&arg.text);
    }
    out.push('\n');
    for (index, clause) in file.rule.clauses.iter().enumerate() {
        let action = match &clause.action {
            Action::Code { partial: true, .. } => "partial code",
            Action::Code { partial: false, .. } => "code",
            Action::Unreachable { .. } => "unreachable",
        };
        out.push_str(&format!("  clause {index} ({action})\n"));
        dump_pattern(&clause.pattern, 2, &mut out);
    }
    if file.trailer.is_some() {
        out.push_str("trailer\n");
    }
    out
}

fn dump_pattern(pattern: &Pattern, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match &pattern.kind {
        PatternKind::Symbol { capture, name } => {
            out.push_str(&pad);
            if let Some(capture) = capture {
                out.push_str(&capture.text);
                out.push_str(" = ");
            }
            out.push_str(&name.text);
            out.push('\n');
        }
        PatternKind::Wildcard { capture } => {
            out.push_str(&pad);
            if let Some(capture) = capture {
                out.push_str(&capture.text);
                out.push_str(" = ");
            }
            out.push_str("_\n");
        }
        PatternKind::Item { lhs, prefix, suffix } => {
            out.push_str(&pad);
            out.push('[');
            if let Some(lhs) = lhs {
                out.push_str(&lhs.text);
                out.push_str(": ");
            }
            for sym in prefix {
                out.push_str(item_sym_text(sym));
                out.push(' ');
            }
            out.push('.');
            for sym in suffix {
                out.push(' ');
                out.push_str(item_sym_text(sym));
            }
            out.push_str("]\n");
        }
        PatternKind::Reduce => {
            out.push_str(&pad);
            out.push_str("!\n");
        }
        PatternKind::Seq(items) => {
            out.push_str(&pad);
            out.push_str("seq\n");
            for item in items {
                dump_pattern(item, depth + 1, out);
            }
        }
        PatternKind::Alt(items) => {
            out.push_str(&pad);
            out.push_str("alt\n");
            for item in items {
                dump_pattern(item, depth + 1, out);
            }
        }
        PatternKind::Star(inner) => {
            out.push_str(&pad);
            out.push_str("star\n");
            dump_pattern(inner, depth + 1, out);
        }
    }
}

fn item_sym_text(sym: &ItemSymAst) -> &str {
    match sym {
        ItemSymAst::Wild(_) => "_",
        ItemSymAst::Name(name) => &name.text,
    }
}
