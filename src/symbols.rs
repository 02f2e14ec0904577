//! Pass 1: walks the parsed program assigning one address per emitted word
//! and records where each label lands.

use std::collections::HashMap;

use serde::Serialize;

use crate::asm::{AsmConfig, AsmError, Validation};
use crate::parse::{Item, Stmt};
use crate::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub address: Word,
    /// Source line of the definition.
    pub line: usize,
}

/// Label name to address. Names are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolTable {
    labels: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<Word> {
        self.labels.get(label).map(|s| s.address)
    }

    /// Records `label`, returning the previous definition if there was one.
    pub fn insert(&mut self, label: &str, sym: Symbol) -> Option<Symbol> {
        self.labels.insert(label.to_string(), sym)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels ordered by address, then name.
    pub fn sorted(&self) -> Vec<(&str, Word)> {
        let mut v: Vec<(&str, Word)> = self.labels.iter().map(|(k, s)| (k.as_str(), s.address)).collect();
        v.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        v
    }

    /// First label (by name) defined at `addr`.
    pub fn label_at(&self, addr: Word) -> Option<&str> {
        self.labels
            .iter()
            .filter(|(_, s)| s.address == addr)
            .map(|(k, _)| k.as_str())
            .min()
    }
}

/// Builds the symbol table. Every instruction and data directive occupies one
/// word; `ORG` moves the location counter; `END` stops the walk. A label on a
/// line that emits no word waits for the next word that is emitted.
pub fn build(items: &[Item], cfg: &AsmConfig) -> Result<SymbolTable, AsmError> {
    let mut table = SymbolTable::new();
    // wide counter so running off the end of memory is detectable
    let mut addr = u32::from(cfg.origin);
    let mut pending: Vec<(&str, usize)> = Vec::new();
    for item in items {
        if let Some(label) = &item.label {
            pending.push((label, item.line));
        }
        match &item.stmt {
            None => {}
            Some(Stmt::Org(a)) => addr = u32::from(*a),
            Some(Stmt::End) => break,
            Some(Stmt::Instr(_)) => {
                for (label, line) in pending.drain(..) {
                    bind(&mut table, label, line, addr, cfg.validation)?;
                }
                if addr > u32::from(Word::MAX) {
                    return Err(AsmError::AddressOverflow { line: item.line });
                }
                addr += 1;
            }
        }
    }
    // trailing labels name the first free address
    for (label, line) in pending {
        bind(&mut table, label, line, addr, cfg.validation)?;
    }
    tracing::debug!(labels = table.len(), "pass 1 done");
    Ok(table)
}

fn bind(table: &mut SymbolTable, label: &str, line: usize, addr: u32, validation: Validation) -> Result<(), AsmError> {
    let address = Word::try_from(addr).map_err(|_| AsmError::AddressOverflow { line })?;
    if let Some(prev) = table.insert(label, Symbol { address, line }) {
        match validation {
            Validation::Strict => {
                return Err(AsmError::DuplicateLabel { line, label: label.to_string(), first: prev.line });
            }
            Validation::Compat => {
                tracing::debug!(%label, old = prev.address, new = address, "label redefined");
            }
        }
    }
    tracing::trace!(%label, address = format_args!("{address:#06x}"), "label");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_lines;
    use crate::source::strip;
    use pretty_assertions::assert_eq;

    fn items(src: &str) -> Vec<Item> {
        parse_lines(&strip(src)).unwrap()
    }

    #[test]
    fn labels_get_their_slot() {
        let its = items("START, AND R1,R1,#0\nLOOP, ADD R1,R1,R0\nBRn LOOP\nDATA, DEC 5\nHALT");
        let t = build(&its, &AsmConfig::default()).unwrap();
        assert_eq!(t.get("START"), Some(0x3000));
        assert_eq!(t.get("LOOP"), Some(0x3001));
        assert_eq!(t.get("DATA"), Some(0x3003));
        assert_eq!(t.get("loop"), None);
        assert_eq!(t.sorted(), vec![("START", 0x3000), ("LOOP", 0x3001), ("DATA", 0x3003)]);
    }

    #[test]
    fn bare_label_binds_to_next_word() {
        let its = items("HALT\nNEXT,\nDEC 1");
        let t = build(&its, &AsmConfig::default()).unwrap();
        assert_eq!(t.get("NEXT"), Some(0x3001));
    }

    #[test]
    fn org_moves_counter() {
        let its = items("HALT\nORG x3100\nFAR, DEC 1\nEND\nLATE, DEC 2");
        let t = build(&its, &AsmConfig::default()).unwrap();
        assert_eq!(t.get("FAR"), Some(0x3100));
        assert_eq!(t.get("LATE"), None);
    }

    #[test]
    fn bare_label_skips_over_org() {
        let its = items("HALT\nL,\nORG x3100\nHALT");
        let t = build(&its, &AsmConfig::default()).unwrap();
        assert_eq!(t.get("L"), Some(0x3100));
    }

    #[test]
    fn trailing_label_names_next_free_address() {
        let its = items("HALT\nTAIL,\nEND");
        let t = build(&its, &AsmConfig::default()).unwrap();
        assert_eq!(t.get("TAIL"), Some(0x3001));
    }

    #[test]
    fn duplicate_labels_by_mode() {
        let its = items("A, HALT\nA, HALT");
        assert_eq!(
            build(&its, &AsmConfig::default()),
            Err(AsmError::DuplicateLabel { line: 2, label: "A".into(), first: 1 })
        );
        let compat = AsmConfig { validation: Validation::Compat, ..AsmConfig::default() };
        assert_eq!(build(&its, &compat).unwrap().get("A"), Some(0x3001));
    }

    #[test]
    fn running_off_memory_fails() {
        let its = items("ORG xFFFF\nHALT\nHALT");
        assert_eq!(build(&its, &AsmConfig::default()), Err(AsmError::AddressOverflow { line: 3 }));
    }
}
