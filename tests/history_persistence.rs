//! End-to-end coverage of the public library surface: a full editor session
//! driven through `connect::editor::Editor`, and history persisted to and
//! reloaded from a real file on disk.

use std::io::Cursor;

use connect::editor::{Editor, ReadOutcome};
use connect::history::History;

#[test]
fn full_session_reads_two_statements_in_order() {
    let input = b"select 1;\rselect 2;\r".to_vec();
    let mut editor = Editor::new(Cursor::new(input), Vec::new(), "> ", History::new(0));

    assert_eq!(editor.read_command().unwrap(), ReadOutcome::Command("select 1;".into()));
    assert_eq!(editor.read_command().unwrap(), ReadOutcome::Command("select 2;".into()));
    assert_eq!(editor.read_command().unwrap(), ReadOutcome::Eof);
}

#[test]
fn history_survives_a_round_trip_through_a_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history");

    let mut history = History::new(0);
    history.add("select * from accounts;");
    history.add("select id from accounts\nwhere active;");
    history.save(std::fs::File::create(&path).unwrap()).unwrap();

    let mut reloaded = History::new(0);
    reloaded
        .load(std::io::BufReader::new(std::fs::File::open(&path).unwrap()))
        .unwrap();

    assert_eq!(reloaded.previous().unwrap(), "select id from accounts\nwhere active;");
    assert_eq!(reloaded.previous().unwrap(), "select * from accounts;");
}

#[test]
fn submitted_statements_are_recallable_within_the_same_session() {
    // Submit one statement, then Ctrl-P should recall it verbatim.
    let input = b"select 1;\r\x10\r".to_vec();
    let mut editor = Editor::new(Cursor::new(input), Vec::new(), "> ", History::new(0));

    assert_eq!(editor.read_command().unwrap(), ReadOutcome::Command("select 1;".into()));
    assert_eq!(editor.read_command().unwrap(), ReadOutcome::Command("select 1;".into()));
}
