use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::word::{to_bits, Word};

/// One assembled word and the address it lives at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCell {
    pub address: Word,
    pub content: Word,
}

impl MemoryCell {
    pub fn new(address: Word, content: Word) -> Self {
        Self { address, content }
    }

    /// The 16-character binary form of the content.
    pub fn bits(&self) -> String {
        to_bits(self.content)
    }
}

/// Sparse memory backed only by the cells of a program image. Addresses
/// outside the image are unmapped: reads yield `None` and writes are refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: BTreeMap<Word, Word>,
}

impl Memory {
    /// Builds memory from an image. If two cells share an address the
    /// first one is kept.
    pub fn from_cells(cells: &[MemoryCell]) -> Self {
        let mut map = BTreeMap::new();
        for c in cells {
            map.entry(c.address).or_insert(c.content);
        }
        Self { cells: map }
    }

    pub fn read(&self, addr: Word) -> Option<Word> {
        self.cells.get(&addr).copied()
    }

    /// Overwrites a mapped cell. Returns `false` when `addr` has no cell.
    pub fn write(&mut self, addr: Word, val: Word) -> bool {
        match self.cells.get_mut(&addr) {
            Some(slot) => {
                *slot = val;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in address order.
    pub fn cells(&self) -> impl Iterator<Item = MemoryCell> + '_ {
        self.cells.iter().map(|(&address, &content)| MemoryCell { address, content })
    }
}
