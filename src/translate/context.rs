//! Bounded FIFO of recently translated lines.
//!
//! Supplied to the oracle as non-authoritative background so a batch (or a
//! streamed line) reads naturally after what came before. Entries are never
//! re-translated and never counted in alignment checks. Owned by exactly one
//! translator instance and mutated only after a successful call.

use std::collections::VecDeque;

/// One already-translated line carried as context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextLine {
    pub id: String,
    pub source: String,
    pub translation: String,
}

/// Rolling window of the most recent translated lines.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    lines: VecDeque<ContextLine>,
    max_lines: usize,
}

impl ContextWindow {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines + 1),
            max_lines,
        }
    }

    /// Append a translated line, dropping the oldest past the window size.
    pub fn push(&mut self, id: impl Into<String>, source: impl Into<String>, translation: impl Into<String>) {
        self.lines.push_back(ContextLine {
            id: id.into(),
            source: source.into(),
            translation: translation.into(),
        });
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &ContextLine> {
        self.lines.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entry_is_evicted_first() {
        let mut window = ContextWindow::new(2);
        window.push("a", "一", "one");
        window.push("b", "二", "two");
        window.push("c", "三", "three");

        assert_eq!(window.len(), 2);
        let sources: Vec<&str> = window.lines().map(|l| l.source.as_str()).collect();
        assert_eq!(sources, ["二", "三"]);
    }

    #[test]
    fn zero_capacity_window_stays_empty() {
        let mut window = ContextWindow::new(0);
        window.push("a", "一", "one");
        assert!(window.is_empty());
    }
}
