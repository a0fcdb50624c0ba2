//! The interactive line editor: a raw-mode terminal front-end managing a
//! multi-line input buffer, cursor positioning, and SQL-aware statement
//! termination.
//!
//! Ported from `pkg/terminal/term.go`'s `Terminal`/`ReadCmd`, generalized
//! per the component breakdown into decoder + cursor arithmetic + history +
//! this module, and carrying over the teacher's split between
//! `RawModeGuard` (terminal-wide raw mode, RAII) and the editor itself
//! (buffer/cursor bookkeeping, output buffering).

use std::io::{BufRead, Write};

use crate::cursor;
use crate::decoder::{self, Event};
use crate::error::EditorError;
use crate::history::History;
use crate::statement;

// ── Raw-mode guard ──────────────────────────────────────────────────────────

/// RAII guard: enables terminal raw mode on construction and restores it on
/// drop — even on panic — so the terminal is never left in a broken state.
pub struct RawGuard;

impl RawGuard {
    pub fn enter() -> Result<Self, EditorError> {
        crossterm::terminal::enable_raw_mode().map_err(EditorError::TerminalSetup)?;
        Ok(RawGuard)
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

// ── Editor ───────────────────────────────────────────────────────────────────

/// What [`Editor::read_command`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete statement, ready for execution.
    Command(String),
    /// Ctrl-C on an in-progress command: the caller should re-show the prompt.
    Interrupted,
    /// Ctrl-D, or the input stream closed.
    Eof,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The multi-line editor. Generic over its input/output so tests can drive
/// it with in-memory buffers instead of a real tty.
pub struct Editor<R: BufRead, W: Write> {
    input: R,
    output: W,
    display: Vec<Vec<char>>,
    cursor: (usize, usize),
    prompt: String,
    output_buffer: Vec<u8>,
    tab_size: usize,
    history: History,
    /// Row currently shown at the terminal's cursor, tracked so redraws know
    /// how far to move up before repainting from the prompt line.
    screen_cursor_row: usize,
}

impl<R: BufRead, W: Write> Editor<R, W> {
    pub fn new(input: R, output: W, prompt: impl Into<String>, history: History) -> Self {
        Editor {
            input,
            output,
            display: vec![Vec::new()],
            cursor: (0, 0),
            prompt: prompt.into(),
            output_buffer: Vec::new(),
            tab_size: 4,
            history,
            screen_cursor_row: 0,
        }
    }

    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Read one full command, handling edits, history recall and reverse
    /// search until a statement completes, the user interrupts, or input
    /// ends.
    pub fn read_command(&mut self) -> Result<ReadOutcome, EditorError> {
        self.display = vec![Vec::new()];
        self.cursor = (0, 0);
        self.screen_cursor_row = 0;
        self.output_buffer.extend(self.prompt.as_bytes());
        self.flush()?;

        loop {
            let Some(event) = decoder::next_event(&mut self.input)? else {
                return Ok(ReadOutcome::Eof);
            };

            match event {
                Event::Interrupt => {
                    self.display = vec![Vec::new()];
                    self.cursor = (0, 0);
                    return Ok(ReadOutcome::Interrupted);
                }
                Event::EndOfInput => return Ok(ReadOutcome::Eof),
                Event::Submit => {
                    let command = self.joined_text();
                    if statement::is_complete(&command) {
                        self.output_buffer.extend(b"\r\n");
                        self.flush()?;
                        self.history.add(command.clone());
                        return Ok(ReadOutcome::Command(command));
                    }
                    self.insert_newline();
                    self.redraw()?;
                }
                Event::Insert(c) => {
                    self.insert_char(c);
                    self.redraw()?;
                }
                Event::DeleteLeft => {
                    self.delete_left();
                    self.redraw()?;
                }
                Event::DeleteWord => {
                    self.delete_word();
                    self.redraw()?;
                }
                Event::MoveLineStart => {
                    self.cursor.1 = 0;
                    self.sync_cursor();
                }
                Event::MoveLineEnd => {
                    self.cursor.1 = self.display[self.cursor.0].len();
                    self.sync_cursor();
                }
                Event::MoveLeft => {
                    self.cursor.1 = self.cursor.1.saturating_sub(1);
                    self.sync_cursor();
                }
                Event::MoveRight => {
                    let len = self.display[self.cursor.0].len();
                    self.cursor.1 = (self.cursor.1 + 1).min(len);
                    self.sync_cursor();
                }
                Event::MoveWordBack => {
                    self.move_word_back();
                    self.sync_cursor();
                }
                Event::MoveWordForward => {
                    self.move_word_forward();
                    self.sync_cursor();
                }
                Event::MoveUp => self.move_up_or_history_prev(),
                Event::MoveDown => self.move_down_or_history_next(),
                Event::HistoryPrev => self.recall_previous(),
                Event::HistoryNext => self.recall_next(),
                Event::ClearScreen => {
                    self.output_buffer.extend(b"\x1b[2J\x1b[H");
                    self.screen_cursor_row = 0;
                    self.redraw_buffer()?;
                }
                Event::ReverseSearch => match self.run_reverse_search()? {
                    ReverseOutcome::Eof => return Ok(ReadOutcome::Eof),
                    ReverseOutcome::Commit(cmd) => return Ok(ReadOutcome::Command(cmd)),
                },
                Event::Ignored => {}
            }

            self.flush()?;
        }
    }

    // ── Buffer mutation ──────────────────────────────────────────────────────

    fn joined_text(&self) -> String {
        self.display
            .iter()
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn insert_char(&mut self, c: char) {
        let (row, col) = self.cursor;
        self.display[row].insert(col, c);
        self.cursor.1 += 1;
    }

    fn insert_newline(&mut self) {
        let (row, col) = self.cursor;
        let suffix = self.display[row].split_off(col);
        self.display.insert(row + 1, suffix);
        self.cursor = (row + 1, 0);
    }

    fn prev_char(&self) -> Option<char> {
        let (row, col) = self.cursor;
        if row == 0 && col == 0 {
            return None;
        }
        if col == 0 {
            return self.display[row - 1].last().copied();
        }
        self.display[row].get(col - 1).copied()
    }

    /// Delete the character immediately before the cursor, merging rows if
    /// the cursor sits at the start of one. Returns the deleted character
    /// (`'\n'` for a merge), or `None` if the cursor was already at (0, 0).
    fn delete_left(&mut self) -> Option<char> {
        let (row, col) = self.cursor;
        if row == 0 && col == 0 {
            return None;
        }
        if col == 0 {
            let current = self.display.remove(row);
            let prev_len = self.display[row - 1].len();
            self.display[row - 1].extend(current);
            self.cursor = (row - 1, prev_len);
            return Some('\n');
        }
        let deleted = self.display[row].remove(col - 1);
        self.cursor.1 -= 1;
        Some(deleted)
    }

    /// Delete characters left of the cursor until a full word (or
    /// punctuation run, or the leading whitespace run before one) has been
    /// consumed.
    fn delete_word(&mut self) {
        let mut r = self.delete_left();
        let mut word_deleted = r.is_some_and(is_word_char);
        while r.is_some() {
            let p = self.prev_char();
            if !p.is_some_and(is_word_char) && word_deleted {
                break;
            }
            r = self.delete_left();
            word_deleted = word_deleted || !r.is_some_and(char::is_whitespace);
        }
    }

    fn move_word_back(&mut self) {
        let line = &self.display[self.cursor.0];
        let mut col = self.cursor.1;
        while col > 0 && !is_word_char(line[col - 1]) {
            col -= 1;
        }
        while col > 0 && is_word_char(line[col - 1]) {
            col -= 1;
        }
        self.cursor.1 = col;
    }

    fn move_word_forward(&mut self) {
        let line = &self.display[self.cursor.0];
        let len = line.len();
        let mut col = self.cursor.1;
        while col < len && !is_word_char(line[col]) {
            col += 1;
        }
        while col < len && is_word_char(line[col]) {
            col += 1;
        }
        self.cursor.1 = col;
    }

    fn move_up_or_history_prev(&mut self) {
        if self.cursor.0 > 0 {
            self.cursor.0 -= 1;
            let len = self.display[self.cursor.0].len();
            self.cursor.1 = self.cursor.1.min(len);
            self.sync_cursor();
        } else {
            self.recall_previous();
        }
    }

    fn move_down_or_history_next(&mut self) {
        if self.cursor.0 + 1 < self.display.len() {
            self.cursor.0 += 1;
            let len = self.display[self.cursor.0].len();
            self.cursor.1 = self.cursor.1.min(len);
            self.sync_cursor();
        } else {
            self.recall_next();
        }
    }

    fn load_into_buffer(&mut self, text: &str) {
        self.display = if text.is_empty() {
            vec![Vec::new()]
        } else {
            text.split('\n').map(|l| l.chars().collect()).collect()
        };
        let last = self.display.len() - 1;
        self.cursor = (last, self.display[last].len());
    }

    /// `HistoryExhausted`: recover in place, no movement, no beep.
    fn recall_previous(&mut self) {
        if let Ok(cmd) = self.history.previous() {
            let cmd = cmd.to_string();
            self.load_into_buffer(&cmd);
        }
    }

    fn recall_next(&mut self) {
        if let Ok(cmd) = self.history.next() {
            let cmd = cmd.to_string();
            self.load_into_buffer(&cmd);
        }
    }

    // ── Reverse search sub-mode ──────────────────────────────────────────────

    fn run_reverse_search(&mut self) -> Result<ReverseOutcome, EditorError> {
        let mut query = String::new();
        self.history.reset_counter();
        self.render_search_status(&query)?;

        loop {
            let Some(event) = decoder::next_event(&mut self.input)? else {
                return Ok(ReverseOutcome::Eof);
            };

            match event {
                Event::EndOfInput => return Ok(ReverseOutcome::Eof),
                Event::Submit | Event::Interrupt => {
                    self.clear_search_status();
                    let cmd = self.joined_text();
                    self.output_buffer.extend(b"\r\n");
                    self.flush()?;
                    return Ok(ReverseOutcome::Commit(cmd));
                }
                Event::ReverseSearch => {
                    self.search_and_load(&query);
                    self.render_search_status(&query)?;
                }
                Event::DeleteLeft => {
                    query.pop();
                    self.history.reset_counter();
                    if !query.is_empty() {
                        self.search_and_load(&query);
                    }
                    self.render_search_status(&query)?;
                }
                Event::Insert(c) => {
                    query.push(c);
                    self.history.reset_counter();
                    self.search_and_load(&query);
                    self.render_search_status(&query)?;
                }
                _ => {}
            }
        }
    }

    fn search_and_load(&mut self, query: &str) {
        if let Ok(found) = self.history.search_backward(query) {
            let found = found.to_string();
            self.load_into_buffer(&found);
        }
    }

    fn clear_search_status(&mut self) {
        self.output_buffer.extend(b"\x1b[1G\x1b[2K\x1b[A");
    }

    fn render_search_status(&mut self, query: &str) -> Result<(), EditorError> {
        self.clear_search_status();
        self.redraw_buffer()?;
        self.output_buffer.extend(format!("\r\nsearch: {query}").into_bytes());
        self.flush()
    }

    // ── Rendering ────────────────────────────────────────────────────────────

    /// Repaint the prompt and every buffer line from the top of the command
    /// area, then reposition the terminal cursor to match `self.cursor`.
    fn redraw(&mut self) -> Result<(), EditorError> {
        self.redraw_buffer()?;
        self.flush()
    }

    fn redraw_buffer(&mut self) -> Result<(), EditorError> {
        if self.screen_cursor_row > 0 {
            self.output_buffer
                .extend(format!("\x1b[{}A", self.screen_cursor_row).into_bytes());
        }
        self.output_buffer.push(b'\r');
        self.output_buffer.extend(b"\x1b[0J");
        self.output_buffer.extend(self.prompt.as_bytes());
        for (i, line) in self.display.iter().enumerate() {
            if i > 0 {
                self.output_buffer.extend(b"\r\n");
            }
            let mut utf8 = [0u8; 4];
            for &c in line {
                self.output_buffer.extend(c.encode_utf8(&mut utf8).as_bytes());
            }
        }

        let last_row = self.display.len() - 1;
        if self.cursor.0 < last_row {
            self.output_buffer
                .extend(format!("\x1b[{}A", last_row - self.cursor.0).into_bytes());
        }
        let col = cursor::column(&self.display[self.cursor.0], self.cursor.1, self.tab_size)
            + if self.cursor.0 == 0 { self.prompt.chars().count() } else { 0 };
        self.output_buffer.push(b'\r');
        self.output_buffer.extend(format!("\x1b[{col}G").into_bytes());
        self.screen_cursor_row = self.cursor.0;
        Ok(())
    }

    /// Pure cursor motion within the current row — no content changed, so no
    /// full redraw is needed.
    fn sync_cursor(&mut self) {
        let col = cursor::column(&self.display[self.cursor.0], self.cursor.1, self.tab_size)
            + if self.cursor.0 == 0 { self.prompt.chars().count() } else { 0 };
        self.output_buffer.extend(format!("\x1b[{col}G").into_bytes());
    }

    fn flush(&mut self) -> Result<(), EditorError> {
        self.output.write_all(&self.output_buffer)?;
        self.output.flush()?;
        self.output_buffer.clear();
        Ok(())
    }
}

enum ReverseOutcome {
    Commit(String),
    Eof,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &[u8]) -> ReadOutcome {
        let mut editor = Editor::new(Cursor::new(input.to_vec()), Vec::new(), "> ", History::new(0));
        editor.read_command().unwrap()
    }

    fn run_with_history(input: &[u8], entries: &[&str]) -> ReadOutcome {
        let mut history = History::new(0);
        for e in entries {
            history.add(*e);
        }
        let mut editor = Editor::new(Cursor::new(input.to_vec()), Vec::new(), "> ", history);
        editor.read_command().unwrap()
    }

    #[test]
    fn scenario_simple_statement() {
        assert_eq!(run(b"select 1;\r"), ReadOutcome::Command("select 1;".into()));
    }

    #[test]
    fn scenario_enter_mid_statement_inserts_newline() {
        assert_eq!(run(b"select \r1;\r"), ReadOutcome::Command("select \n1;".into()));
    }

    #[test]
    fn scenario_backspace() {
        assert_eq!(run(b"select 1\x7f2;\r"), ReadOutcome::Command("select 2;".into()));
    }

    #[test]
    fn scenario_arrow_keys() {
        assert_eq!(run(b"select 1\x1b[D2\x1b[C;\r"), ReadOutcome::Command("select 21;".into()));
    }

    #[test]
    fn scenario_ctrl_w_deletes_word() {
        assert_eq!(run(b"select 1234\x175;\r"), ReadOutcome::Command("select 5;".into()));
    }

    #[test]
    fn scenario_ctrl_a_ctrl_e() {
        assert_eq!(run(b"elect 1;\x01s\x05\r"), ReadOutcome::Command("select 1;".into()));
    }

    #[test]
    fn scenario_backspace_merges_rows() {
        assert_eq!(run(b"abc\r\x7f\x7f\x7f\x7fI;\r"), ReadOutcome::Command("I;".into()));
    }

    #[test]
    fn ctrl_c_returns_interrupted() {
        assert_eq!(run(b"select 1\x03"), ReadOutcome::Interrupted);
    }

    #[test]
    fn ctrl_d_on_fresh_buffer_returns_eof() {
        assert_eq!(run(b"\x04"), ReadOutcome::Eof);
    }

    #[test]
    fn closed_stream_returns_eof() {
        assert_eq!(run(b""), ReadOutcome::Eof);
    }

    #[test]
    fn history_prev_recalls_last_command() {
        let outcome = run_with_history(&[0x10, b';', b'\r'], &["select 1"]);
        assert_eq!(outcome, ReadOutcome::Command("select 1;".into()));
    }

    #[test]
    fn reverse_search_commits_matched_command() {
        let outcome = run_with_history(&[0x12, b'a', b'\r'], &["answer", "but"]);
        assert_eq!(outcome, ReadOutcome::Command("answer".into()));
    }

    #[test]
    fn reverse_search_ctrl_r_jumps_to_older_match() {
        // "cat" and "bat" both contain "at"; the first Ctrl-R lands on the
        // most recently added ("bat"), the second on the older one ("cat").
        let outcome = run_with_history(&[0x12, b'a', b't', 0x12, b'\r'], &["cat", "bat"]);
        assert_eq!(outcome, ReadOutcome::Command("cat".into()));
    }
}
