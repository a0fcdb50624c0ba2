//! Query execution and result rendering.
//!
//! `ResultSet`/`display()` are ported from `ResultSet`/`runQuery` (`config.go`)
//! and `display()` (`cmd/connect/main.go`), including the unprintable-header
//! substitution with `•`. `QueryExecutor` is a thin seam so the editor loop
//! doesn't depend on a specific driver; `MysqlExecutor` is the one real
//! implementation, backed by the `mysql` crate.

use mysql::prelude::Queryable;

use crate::config::Connection;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResultSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Anything that can run a statement and hand back a rectangular result.
pub trait QueryExecutor {
    type Error: std::error::Error;

    fn execute(&mut self, statement: &str) -> Result<ResultSet, Self::Error>;
}

pub struct MysqlExecutor {
    conn: mysql::Conn,
}

impl MysqlExecutor {
    /// Dial the database named by `conn`, over a Unix socket when `conn.host`
    /// names one (contains `/`), otherwise over TCP — the same scheme split
    /// used for DSN formatting and tunnel addresses.
    pub fn connect(conn: &Connection) -> Result<Self, mysql::Error> {
        let mut builder = mysql::OptsBuilder::new()
            .user(Some(conn.username.clone()))
            .pass(Some(conn.password.clone()))
            .db_name(Some(conn.database.clone()));
        builder = if conn.host.contains('/') {
            builder.socket(Some(conn.host.clone()))
        } else {
            builder.ip_or_hostname(Some(conn.host.clone())).tcp_port(conn.port)
        };
        let db_conn = mysql::Conn::new(builder)?;
        Ok(MysqlExecutor { conn: db_conn })
    }
}

impl QueryExecutor for MysqlExecutor {
    type Error = mysql::Error;

    fn execute(&mut self, statement: &str) -> Result<ResultSet, Self::Error> {
        let mut result = self.conn.query_iter(statement)?;
        let headers = result
            .columns()
            .as_ref()
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for row in result.by_ref() {
            let row = row?;
            let values = (0..row.len())
                .map(|i| row.as_ref(i).map(value_to_string).unwrap_or_default())
                .collect();
            rows.push(values);
        }

        Ok(ResultSet { headers, rows })
    }
}

fn value_to_string(value: &mysql::Value) -> String {
    match value {
        mysql::Value::NULL => "NULL".to_string(),
        mysql::Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        mysql::Value::Int(n) => n.to_string(),
        mysql::Value::UInt(n) => n.to_string(),
        mysql::Value::Float(f) => f.to_string(),
        mysql::Value::Double(d) => d.to_string(),
        other => format!("{other:?}"),
    }
}

/// Replace any character that isn't printable with `•`, matching the
/// original's header sanitation.
fn sanitize_header(header: &str) -> String {
    header
        .chars()
        .map(|c| if c.is_control() { '•' } else { c })
        .collect()
}

/// Render a result set as a `+---+` bordered table into `out`.
pub fn display<W: std::fmt::Write>(out: &mut W, result: &ResultSet) -> std::fmt::Result {
    let mut col_size: Vec<usize> = result.headers.iter().map(|h| h.chars().count()).collect();
    for row in &result.rows {
        for (i, value) in row.iter().enumerate() {
            if let Some(size) = col_size.get_mut(i) {
                *size = (*size).max(value.chars().count());
            }
        }
    }

    let print_separator = |out: &mut W| -> std::fmt::Result {
        write!(out, " +")?;
        for size in &col_size {
            write!(out, "{}+", "-".repeat(size + 2))?;
        }
        writeln!(out)
    };

    print_separator(out)?;
    for (i, header) in result.headers.iter().enumerate() {
        write!(out, " | {:width$}", sanitize_header(header), width = col_size[i])?;
    }
    writeln!(out, " |")?;
    print_separator(out)?;

    for row in &result.rows {
        for (i, value) in row.iter().enumerate() {
            write!(out, " | {:width$}", value, width = col_size[i])?;
        }
        writeln!(out, " |")?;
    }
    print_separator(out)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_bordered_table() {
        let result = ResultSet {
            headers: vec!["id".into(), "name".into()],
            rows: vec![vec!["1".into(), "alice".into()], vec!["2".into(), "bob".into()]],
        };
        let mut out = String::new();
        display(&mut out, &result).unwrap();
        assert!(out.starts_with(" +----+-------+\n"));
        assert!(out.contains(" | id | name  |\n"));
        assert!(out.contains(" | 1  | alice |\n"));
    }

    #[test]
    fn sanitizes_unprintable_header_chars() {
        assert_eq!(sanitize_header("a\tb"), "a•b");
        assert_eq!(sanitize_header("clean"), "clean");
    }

    #[test]
    fn empty_result_still_prints_borders() {
        let result = ResultSet { headers: vec!["only".into()], rows: vec![] };
        let mut out = String::new();
        display(&mut out, &result).unwrap();
        assert_eq!(out.lines().count(), 3);
    }
}
