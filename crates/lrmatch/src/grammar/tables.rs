//! Raw, serde-backed model of a compiled LR(1) table file.
//!
//! The table file is the untyped interchange format produced by the host
//! LALR toolchain. Everything in it is a plain integer index; [`validate`]
//! checks every index against its universe cardinality before the typed
//! [`Grammar`](super::Grammar) view is built on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Untagged symbol reference: `{"T": 0}` or `{"N": 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawSymbol {
    T(u32),
    N(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawProdKind {
    Start,
    Regular,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProduction {
    pub lhs: u32,
    pub rhs: Vec<RawSymbol>,
    pub kind: RawProdKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawState {
    /// Symbol on every transition entering this state; `None` for the
    /// initial states.
    pub incoming: Option<RawSymbol>,
    /// LR(1) items `(production, dot position)`.
    pub items: Vec<(u32, u32)>,
    /// Per-lookahead reduction chains `(terminal, productions)`.
    pub reductions: Vec<(u32, Vec<u32>)>,
    /// Outgoing transitions `(symbol, target state)`.
    pub transitions: Vec<(RawSymbol, u32)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTables {
    pub terminals: Vec<String>,
    pub nonterminals: Vec<String>,
    pub productions: Vec<RawProduction>,
    pub states: Vec<RawState>,
}

impl RawTables {
    /// Read and decode a table file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let tables: Self =
            serde_json::from_str(&text).map_err(|err| ConfigError::InvalidTables {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        tables.validate().map_err(|message| ConfigError::InvalidTables {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(tables)
    }

    /// Check that every index is in range for its universe.
    pub fn validate(&self) -> Result<(), String> {
        let n_terms = self.terminals.len() as u32;
        let n_nonterms = self.nonterminals.len() as u32;
        let n_prods = self.productions.len() as u32;
        let n_states = self.states.len() as u32;

        let check_symbol = |sym: RawSymbol, what: &str| match sym {
            RawSymbol::T(t) if t >= n_terms => {
                Err(format!("{what}: terminal index {t} out of range"))
            }
            RawSymbol::N(n) if n >= n_nonterms => {
                Err(format!("{what}: nonterminal index {n} out of range"))
            }
            _ => Ok(()),
        };

        for (i, prod) in self.productions.iter().enumerate() {
            if prod.lhs >= n_nonterms {
                return Err(format!("production {i}: lhs index {} out of range", prod.lhs));
            }
            for &sym in &prod.rhs {
                check_symbol(sym, &format!("production {i}"))?;
            }
        }

        for (i, state) in self.states.iter().enumerate() {
            if let Some(sym) = state.incoming {
                check_symbol(sym, &format!("state {i} incoming"))?;
            }
            for &(prod, pos) in &state.items {
                if prod >= n_prods {
                    return Err(format!("state {i}: item production {prod} out of range"));
                }
                let rhs_len = self.productions[prod as usize].rhs.len() as u32;
                if pos > rhs_len {
                    return Err(format!(
                        "state {i}: item position {pos} exceeds production {prod} length {rhs_len}"
                    ));
                }
            }
            for &(term, ref chain) in &state.reductions {
                if term >= n_terms {
                    return Err(format!("state {i}: lookahead terminal {term} out of range"));
                }
                for &prod in chain {
                    if prod >= n_prods {
                        return Err(format!("state {i}: reduced production {prod} out of range"));
                    }
                }
            }
            for &(sym, target) in &state.transitions {
                check_symbol(sym, &format!("state {i} transition"))?;
                if target >= n_states {
                    return Err(format!("state {i}: transition target {target} out of range"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> RawTables {
        RawTables {
            terminals: vec!["a".to_string()],
            nonterminals: vec!["A".to_string()],
            productions: vec![RawProduction {
                lhs: 0,
                rhs: vec![RawSymbol::T(0)],
                kind: RawProdKind::Regular,
            }],
            states: vec![RawState {
                incoming: None,
                items: vec![(0, 0)],
                reductions: vec![],
                transitions: vec![(RawSymbol::T(0), 0)],
            }],
        }
    }

    #[test]
    fn test_validate_accepts_consistent_tables() {
        assert!(tiny().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_production_index() {
        let mut tables = tiny();
        tables.states[0].items.push((7, 0));
        let err = tables.validate().unwrap_err();
        assert!(err.contains("item production 7"));
    }

    #[test]
    fn test_validate_rejects_bad_transition_target() {
        let mut tables = tiny();
        tables.states[0].transitions.push((RawSymbol::N(0), 9));
        let err = tables.validate().unwrap_err();
        assert!(err.contains("target 9"));
    }

    #[test]
    fn test_json_round_trip() {
        let tables = tiny();
        let text = serde_json::to_string(&tables).unwrap();
        let back: RawTables = serde_json::from_str(&text).unwrap();
        assert_eq!(back.terminals, tables.terminals);
        assert_eq!(back.states[0].transitions, tables.states[0].transitions);
    }
}
