//! # Code Emission
//!
//! Renders the compiled recognizer as a Rust source file: the user header
//! block, the DFA tables, a step/accept API, the action dispatcher, and
//! the user trailer block.
//!
//! The tables are flat: per DFA state a sorted `(lr1_state, target)` edge
//! slice (transition labels are disjoint, so flattening is lossless) and a
//! selected-clause entry. The dispatcher is a plain `match` over clause
//! indices whose arms are the user code blocks verbatim; `unreachable`
//! clauses become `unreachable!()` arms so a match during execution is
//! loud.

use std::fmt::Write;

use compact_str::CompactString;

use crate::dfa::Dfa;
use crate::index::Idx;
use crate::pattern::syntax::{Action, CodeBlock};
use crate::pattern::ClauseInfo;

/// A compiled recognizer ready for rendering.
pub struct Recognizer {
    pub dfa: Dfa,
    pub clauses: Vec<ClauseInfo>,
    pub header: Option<CodeBlock>,
    pub trailer: Option<CodeBlock>,
    pub rule_name: CompactString,
}

impl Recognizer {
    /// Render the output file.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) -> std::fmt::Result {
        if let Some(header) = &self.header {
            out.push_str(header.code.trim());
            out.push_str("\n\n");
        }

        let upper = self.rule_name.to_uppercase();
        let lower = self.rule_name.to_lowercase();

        writeln!(out, "/// Edges per recognizer state: sorted (LR(1) state, target) pairs.")?;
        writeln!(out, "static {upper}_EDGES: &[&[(u32, u32)]] = &[")?;
        for state in &self.dfa.states {
            let mut edges: Vec<(u32, u32)> = state
                .transitions
                .iter()
                .flat_map(|(label, target)| {
                    let target = *target as u32;
                    label.iter().map(move |s| (s.index() as u32, target))
                })
                .collect();
            edges.sort_unstable();
            let rendered: Vec<String> = edges
                .iter()
                .map(|(lr1, target)| format!("({lr1}, {target})"))
                .collect();
            writeln!(out, "    &[{}],", rendered.join(", "))?;
        }
        writeln!(out, "];")?;
        writeln!(out)?;

        writeln!(out, "/// Selected clause per recognizer state; -1 accepts nothing.")?;
        writeln!(out, "static {upper}_ACCEPT: &[i32] = &[")?;
        for state in &self.dfa.states {
            let selected = state.selected.map_or(-1, |clause| clause as i32);
            writeln!(out, "    {selected},")?;
        }
        writeln!(out, "];")?;
        writeln!(out)?;

        writeln!(out, "/// Capture names bound by each clause.")?;
        writeln!(out, "static {upper}_CAPTURES: &[&[&str]] = &[")?;
        for clause in &self.clauses {
            let rendered: Vec<String> = clause
                .captures
                .iter()
                .map(|name| format!("{name:?}"))
                .collect();
            writeln!(out, "    &[{}],", rendered.join(", "))?;
        }
        writeln!(out, "];")?;
        writeln!(out)?;

        writeln!(
            out,
            "/// Follow the edge labeled with `lr1` out of `state`, if any."
        )?;
        writeln!(
            out,
            "pub fn {lower}_step(state: u32, lr1: u32) -> Option<u32> {{"
        )?;
        writeln!(out, "    let edges = {upper}_EDGES[state as usize];")?;
        writeln!(
            out,
            "    edges.binary_search_by_key(&lr1, |&(s, _)| s).ok().map(|i| edges[i].1)"
        )?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "/// The clause accepted in `state`, if any.")?;
        writeln!(out, "pub fn {lower}_accept(state: u32) -> Option<u32> {{")?;
        writeln!(out, "    let clause = {upper}_ACCEPT[state as usize];")?;
        writeln!(out, "    (clause >= 0).then(|| clause as u32)")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "/// Capture names of a clause.")?;
        writeln!(out, "pub fn {lower}_captures(clause: u32) -> &'static [&'static str] {{")?;
        writeln!(out, "    {upper}_CAPTURES[clause as usize]")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "/// Run the action of the selected clause.")?;
        writeln!(out, "pub fn {lower}_action(clause: u32) -> String {{")?;
        writeln!(out, "    match clause {{")?;
        for (index, clause) in self.clauses.iter().enumerate() {
            match &clause.action {
                Action::Code { block, partial } => {
                    if *partial {
                        writeln!(out, "        // partial")?;
                    }
                    writeln!(out, "        {index} => {{{}}}", block.code)?;
                }
                Action::Unreachable { .. } => {
                    writeln!(out, "        {index} => unreachable!(),")?;
                }
            }
        }
        writeln!(out, "        _ => unreachable!(),")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;

        if let Some(trailer) = &self.trailer {
            writeln!(out)?;
            out.push_str(trailer.code.trim());
            out.push('\n');
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parse_source;
    use crate::testing;
    use crate::Ctx;
    use std::path::PathBuf;

    fn render(source: &str) -> String {
        let ctx = Ctx::new(testing::unit_chain_grammar());
        let spec = parse_source(source, &PathBuf::from("test.lrm")).unwrap();
        crate::compile(&ctx, &spec).unwrap().render()
    }

    #[test]
    fn test_render_contains_tables_and_dispatcher() {
        let out = render("rule on_error = | a { \"expected a\".to_string() }");
        assert!(out.contains("static ON_ERROR_EDGES"));
        assert!(out.contains("static ON_ERROR_ACCEPT"));
        assert!(out.contains("pub fn on_error_step"));
        assert!(out.contains("pub fn on_error_action"));
        assert!(out.contains("\"expected a\".to_string()"));
    }

    #[test]
    fn test_render_places_header_and_trailer() {
        let out = render("{ use std::fmt; } rule r = | a { String::new() } { fn tail() {} }");
        let header_at = out.find("use std::fmt;").unwrap();
        let tables_at = out.find("static R_EDGES").unwrap();
        let trailer_at = out.find("fn tail()").unwrap();
        assert!(header_at < tables_at);
        assert!(tables_at < trailer_at);
    }

    #[test]
    fn test_render_unreachable_clause() {
        let out = render("rule r = | a { String::new() } | _ unreachable");
        assert!(out.contains("1 => unreachable!()"));
    }

    #[test]
    fn test_accept_table_marks_accepting_state() {
        let out = render("rule r = | a { String::new() } ");
        // State 1 (the a-state target) accepts clause 0.
        assert!(out.contains("static R_ACCEPT"));
        let accept_block: String = out
            .split("static R_ACCEPT: &[i32] = &[")
            .nth(1)
            .unwrap()
            .split("];")
            .next()
            .unwrap()
            .to_string();
        assert!(accept_block.contains("-1"));
        assert!(accept_block.contains('0'));
    }
}
