//! Input decoder: turns a blocking byte stream into one [`Event`] at a time.
//!
//! Ported from the byte-classification switch in `pkg/terminal/term.go`
//! (`ReadCmd`'s outer `switch b[0]`) and its `parseEscape`, generalized into
//! a standalone decoder the editor core consumes.

use std::io::{BufRead, ErrorKind, Read};

/// One decoded unit of input. The decoder never buffers ahead — each call to
/// [`next_event`] consumes exactly the bytes for one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Insert(char),
    Submit,
    Interrupt,
    EndOfInput,
    ClearScreen,
    DeleteLeft,
    DeleteWord,
    MoveLineStart,
    MoveLineEnd,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    MoveWordBack,
    MoveWordForward,
    HistoryPrev,
    HistoryNext,
    ReverseSearch,
    /// A byte or sequence the decoder chose not to interpret.
    Ignored,
}

const CTRL_C: u8 = b'c' & 0x1f;
const CTRL_D: u8 = b'd' & 0x1f;
const CTRL_L: u8 = b'l' & 0x1f;
const CTRL_W: u8 = b'w' & 0x1f;
const CTRL_A: u8 = b'a' & 0x1f;
const CTRL_E: u8 = b'e' & 0x1f;
const CTRL_R: u8 = b'r' & 0x1f;
const CTRL_P: u8 = b'p' & 0x1f;
const CTRL_N: u8 = b'n' & 0x1f;
const KEY_ENTER: u8 = 0x0D;
const KEY_ESCAPE: u8 = 0x1B;
const KEY_BACKSPACE: u8 = 0x7F;

/// Read and classify exactly one event from `r`.
///
/// Returns `Ok(None)` on a clean EOF with nothing partially consumed; `Err`
/// propagates the underlying I/O failure, terminating the session.
pub fn next_event<R: BufRead>(r: &mut R) -> std::io::Result<Option<Event>> {
    let first = {
        let buf = match r.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::Interrupted => return next_event(r),
            Err(e) => return Err(e),
        };
        if buf.is_empty() {
            return Ok(None);
        }
        buf[0]
    };

    match first {
        CTRL_C => {
            r.consume(1);
            Ok(Some(Event::Interrupt))
        }
        CTRL_D => {
            r.consume(1);
            Ok(Some(Event::EndOfInput))
        }
        CTRL_L => {
            r.consume(1);
            Ok(Some(Event::ClearScreen))
        }
        CTRL_W => {
            r.consume(1);
            Ok(Some(Event::DeleteWord))
        }
        CTRL_A => {
            r.consume(1);
            Ok(Some(Event::MoveLineStart))
        }
        CTRL_E => {
            r.consume(1);
            Ok(Some(Event::MoveLineEnd))
        }
        CTRL_R => {
            r.consume(1);
            Ok(Some(Event::ReverseSearch))
        }
        CTRL_P => {
            r.consume(1);
            Ok(Some(Event::HistoryPrev))
        }
        CTRL_N => {
            r.consume(1);
            Ok(Some(Event::HistoryNext))
        }
        KEY_ENTER => {
            r.consume(1);
            Ok(Some(Event::Submit))
        }
        KEY_BACKSPACE => {
            r.consume(1);
            Ok(Some(Event::DeleteLeft))
        }
        KEY_ESCAPE => {
            r.consume(1);
            Ok(Some(parse_escape(r)?))
        }
        b if b >= 32 => decode_rune(r),
        _ => {
            r.consume(1);
            Ok(Some(Event::Ignored))
        }
    }
}

/// Parse whatever follows an already-consumed `ESC` byte.
fn parse_escape<R: BufRead>(r: &mut R) -> std::io::Result<Event> {
    let Some(next) = read_byte(r)? else {
        return Ok(Event::Ignored);
    };
    match next {
        b'[' => {
            let Some(fin) = read_byte(r)? else {
                return Ok(Event::Ignored);
            };
            Ok(match fin {
                b'A' => Event::MoveUp,
                b'B' => Event::MoveDown,
                b'C' => Event::MoveRight,
                b'D' => Event::MoveLeft,
                _ => Event::Ignored,
            })
        }
        b'b' => Ok(Event::MoveWordBack),
        b'f' => Ok(Event::MoveWordForward),
        KEY_BACKSPACE => Ok(Event::DeleteWord),
        _ => Ok(Event::Ignored),
    }
}

fn read_byte<R: Read>(r: &mut R) -> std::io::Result<Option<u8>> {
    let mut b = [0u8; 1];
    match r.read(&mut b) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(b[0])),
        Err(e) if e.kind() == ErrorKind::Interrupted => read_byte(r),
        Err(e) => Err(e),
    }
}

/// Decode one UTF-8 scalar value starting at the already-peeked lead byte.
/// Invalid sequences drop the lead byte and surface as `Ignored`, matching
/// the `DecodeError` recovery policy (drop the byte, keep reading).
fn decode_rune<R: BufRead>(r: &mut R) -> std::io::Result<Option<Event>> {
    let lead = {
        let buf = r.fill_buf()?;
        buf[0]
    };
    let len = utf8_len(lead);
    let mut bytes = [0u8; 4];
    for slot in bytes.iter_mut().take(len) {
        match read_byte(r)? {
            Some(b) => *slot = b,
            None => return Ok(Some(Event::Ignored)),
        }
    }
    match std::str::from_utf8(&bytes[..len]).ok().and_then(|s| s.chars().next()) {
        Some(ch) => Ok(Some(Event::Insert(ch))),
        None => Ok(Some(Event::Ignored)),
    }
}

fn utf8_len(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn events(input: &[u8]) -> Vec<Event> {
        let mut cursor = Cursor::new(input.to_vec());
        let mut out = Vec::new();
        while let Some(ev) = next_event(&mut cursor).unwrap() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn printable_ascii_becomes_insert() {
        assert_eq!(events(b"ab"), vec![Event::Insert('a'), Event::Insert('b')]);
    }

    #[test]
    fn control_codes_map_to_events() {
        assert_eq!(events(&[0x03]), vec![Event::Interrupt]);
        assert_eq!(events(&[0x04]), vec![Event::EndOfInput]);
        assert_eq!(events(&[0x0C]), vec![Event::ClearScreen]);
        assert_eq!(events(&[0x17]), vec![Event::DeleteWord]);
        assert_eq!(events(&[0x01]), vec![Event::MoveLineStart]);
        assert_eq!(events(&[0x05]), vec![Event::MoveLineEnd]);
        assert_eq!(events(&[0x0D]), vec![Event::Submit]);
        assert_eq!(events(&[0x7F]), vec![Event::DeleteLeft]);
    }

    #[test]
    fn csi_arrows() {
        assert_eq!(events(b"\x1b[A"), vec![Event::MoveUp]);
        assert_eq!(events(b"\x1b[B"), vec![Event::MoveDown]);
        assert_eq!(events(b"\x1b[C"), vec![Event::MoveRight]);
        assert_eq!(events(b"\x1b[D"), vec![Event::MoveLeft]);
    }

    #[test]
    fn alt_word_motions() {
        assert_eq!(events(b"\x1bb"), vec![Event::MoveWordBack]);
        assert_eq!(events(b"\x1bf"), vec![Event::MoveWordForward]);
        assert_eq!(events(&[0x1b, 0x7f]), vec![Event::DeleteWord]);
    }

    #[test]
    fn multibyte_utf8_decodes_to_one_insert() {
        assert_eq!(events("é".as_bytes()), vec![Event::Insert('é')]);
    }
}
