//! Human-readable labels for state handles.

use std::collections::HashMap;

use super::arena::StateId;

/// Caller-owned registry handing out `A`, `B`, ..., `Z`, `BA`, ... labels in
/// first-seen order.
#[derive(Debug, Clone, Default)]
pub struct DebugNames {
    labels: HashMap<StateId, String>,
}

impl DebugNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label of `id`, assigning the next free one on first sight.
    pub fn label(&mut self, id: StateId) -> String {
        let next = self.labels.len();
        self.labels
            .entry(id)
            .or_insert_with(|| alphabetic_label(next))
            .clone()
    }

    pub fn get(&self, id: StateId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }
}

/// Base-26 rendering of `n` with `A` as zero.
pub fn alphabetic_label(mut n: usize) -> String {
    if n == 0 {
        return "A".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    digits.iter().rev().map(|&d| d as char).collect()
}
