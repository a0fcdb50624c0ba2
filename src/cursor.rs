//! Pure cursor arithmetic: mapping a logical position inside a line of
//! characters to a 1-based on-screen column, expanding tabs along the way.

/// The on-screen column (1-based) of character index `n` within `line`,
/// expanding each `\t` to the next multiple of `tab_size` and leaving
/// embedded `\n` characters with no width of their own.
///
/// Only the first `min(n, line.len())` characters are ever consulted — a
/// cursor position past the end of the line stops advancing once the line
/// runs out, it does not project further.
pub fn column(line: &[char], n: usize, tab_size: usize) -> usize {
    let mut col = 1usize;
    let limit = n.min(line.len());
    for &ch in &line[..limit] {
        match ch {
            '\n' => {}
            '\t' => col += tab_size - ((col - 1) % tab_size),
            _ => col += 1,
        }
    }
    col
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn cursor_pos_table() {
        let cases: &[(&str, usize, usize, usize)] = &[
            ("asdf", 0, 4, 1),
            ("asdf", 1, 4, 2),
            ("asdf\n", 10, 4, 5),
            ("asdfe", 10, 4, 6),
            ("a\tb", 2, 4, 5),
            ("a\tb", 3, 4, 6),
        ];
        for &(text, n, tab_size, expect) in cases {
            let got = column(&chars(text), n, tab_size);
            assert_eq!(got, expect, "column({text:?}, {n}, {tab_size})");
        }
    }

    #[test]
    fn empty_line_always_one() {
        assert_eq!(column(&[], 0, 4), 1);
        assert_eq!(column(&[], 5, 4), 1);
    }
}
