//! The history store: an ordered sequence of past commands, a reverse-search
//! cursor, and a base64-per-line persistence codec.
//!
//! Ported from `pkg/terminal/history.go`, but with the corrected semantics
//! the spec calls for: `add` resets the recall cursor and the trim never
//! panics when `limit` exceeds the current length.

use std::io::{BufRead, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::HistoryError;

/// Ordered command history with a recall cursor for Prev/Next navigation.
pub struct History {
    entries: Vec<String>,
    limit: usize,
    recall_index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(0)
    }
}

impl History {
    /// `limit` of 0 means unbounded retention.
    pub fn new(limit: usize) -> Self {
        History {
            entries: Vec::new(),
            limit,
            recall_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `s`, trimming from the front if over `limit`, and reset the
    /// recall cursor — a fresh command should not leave the user mid-recall.
    pub fn add(&mut self, s: impl Into<String>) {
        self.entries.push(s.into());
        if self.limit > 0 && self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.recall_index = 0;
    }

    /// Move one step further into the past. `recall_index` counts how many
    /// steps back from the newest entry have already been shown.
    pub fn previous(&mut self) -> Result<&str, HistoryError> {
        let i = self.recall_index;
        if i >= self.entries.len() {
            return Err(HistoryError::Exhausted);
        }
        self.recall_index += 1;
        Ok(&self.entries[self.entries.len() - 1 - i])
    }

    /// Move one step back towards the present. Returns `""` once back at
    /// the fresh draft buffer (recall_index == 0).
    pub fn next(&mut self) -> Result<&str, HistoryError> {
        if self.recall_index == 0 {
            return Err(HistoryError::Exhausted);
        }
        let i = self.recall_index as isize - 2;
        if i == -1 {
            self.recall_index -= 1;
            return Ok("");
        }
        if i < 0 || i as usize >= self.entries.len() {
            return Err(HistoryError::Exhausted);
        }
        self.recall_index -= 1;
        Ok(&self.entries[self.entries.len() - 1 - i as usize])
    }

    pub fn reset_counter(&mut self) {
        self.recall_index = 0;
    }

    /// Keep calling `previous()` until an entry containing `needle` is
    /// found, continuing from wherever the recall cursor currently sits.
    pub fn search_backward(&mut self, needle: &str) -> Result<&str, HistoryError> {
        loop {
            let i = self.recall_index;
            if i >= self.entries.len() {
                return Err(HistoryError::Exhausted);
            }
            self.recall_index += 1;
            let idx = self.entries.len() - 1 - i;
            if self.entries[idx].contains(needle) {
                return Ok(&self.entries[idx]);
            }
        }
    }

    /// Write one base64-encoded entry per line.
    pub fn save<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for entry in &self.entries {
            writeln!(writer, "{}", BASE64.encode(entry.as_bytes()))?;
        }
        Ok(())
    }

    /// Read one base64-encoded entry per line, skipping (not aborting on)
    /// lines that fail to decode.
    pub fn load<R: BufRead>(&mut self, reader: R) -> std::io::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match BASE64.decode(line.as_bytes()) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => self.add(text),
                    Err(_) => continue,
                },
                Err(_) => continue,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_next_round_trip() {
        let mut h = History::new(0);
        h.add("first");
        h.add("second");

        assert_eq!(h.previous().unwrap(), "second");
        assert_eq!(h.previous().unwrap(), "first");
        assert!(h.previous().is_err());

        assert_eq!(h.next().unwrap(), "second");
        assert_eq!(h.next().unwrap(), "");
        assert!(h.next().is_err());
    }

    #[test]
    fn add_resets_recall_cursor() {
        let mut h = History::new(0);
        h.add("a");
        h.add("b");
        h.previous().unwrap();
        h.add("c");
        assert_eq!(h.previous().unwrap(), "c");
    }

    #[test]
    fn limit_trims_oldest() {
        let mut h = History::new(2);
        h.add("a");
        h.add("b");
        h.add("c");
        assert_eq!(h.previous().unwrap(), "c");
        assert_eq!(h.previous().unwrap(), "b");
        assert!(h.previous().is_err());
    }

    #[test]
    fn search_backward_finds_substring() {
        let mut h = History::new(0);
        h.add("answer");
        h.add("but");
        assert_eq!(h.search_backward("a").unwrap(), "answer");
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut h = History::new(0);
        h.add("first\ncommand");
        h.add("second");

        let mut buf = Vec::new();
        h.save(&mut buf).unwrap();

        let mut loaded = History::new(0);
        loaded.load(buf.as_slice()).unwrap();

        assert_eq!(loaded.entries, vec!["first\ncommand", "second"]);
    }

    #[test]
    fn load_skips_undecodable_lines() {
        let mut loaded = History::new(0);
        let data = b"not-valid-base64!!!\nc29tZQ==\n";
        loaded.load(&data[..]).unwrap();
        assert_eq!(loaded.entries, vec!["some"]);
    }
}
