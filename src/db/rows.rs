use rusqlite::{Connection, TransactionBehavior};

use crate::error::LoadError;
use crate::models::{ColumnValue, RowRecord};

/// Run `sql` inside one deferred transaction and collect every row in result
/// order. Transaction and statement failures map to distinct error kinds so
/// the caller can log them apart.
pub fn fetch_rows(conn: &mut Connection, sql: &str) -> Result<Vec<RowRecord>, LoadError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Deferred)
        .map_err(LoadError::Transaction)?;
    let rows = query_rows(&tx, sql).map_err(LoadError::Query)?;
    tx.commit().map_err(LoadError::Transaction)?;
    Ok(rows)
}

/// Execute a parameterless SELECT and copy each row out as a [`RowRecord`].
pub fn query_rows(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<RowRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut columns = Vec::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            columns.push((name.clone(), ColumnValue::from(row.get_ref(idx)?)));
        }
        records.push(RowRecord::new(columns));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE classes (id INTEGER PRIMARY KEY, nm_nome TEXT NOT NULL);
             INSERT INTO classes (id, nm_nome) VALUES (1, 'Gamma');
             INSERT INTO classes (id, nm_nome) VALUES (2, 'Alpha');
             INSERT INTO classes (id, nm_nome) VALUES (3, 'Beta');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn rows_follow_the_order_by_clause() {
        let mut conn = seeded();
        let rows = fetch_rows(&mut conn, "select * from classes order by nm_nome").unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.text("nm_nome")).collect();
        assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
        assert_eq!(rows[0].get("id"), Some(&ColumnValue::Integer(2)));
    }

    #[test]
    fn missing_table_is_a_query_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        let err = fetch_rows(&mut conn, "select * from classes order by nm_nome").unwrap_err();
        assert!(matches!(err, LoadError::Query(_)));
        assert!(err.to_string().contains("no such table: classes"));
    }

    #[test]
    fn nested_transaction_is_a_transaction_error() {
        let mut conn = seeded();
        conn.execute_batch("BEGIN").unwrap();
        let err = fetch_rows(&mut conn, "select * from classes").unwrap_err();
        assert!(matches!(err, LoadError::Transaction(_)));
    }
}
