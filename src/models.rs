//! Row data handed from the persistence layer to the view. The schema of the
//! seed database is not ours, so rows are kept as generic column/value pairs
//! instead of a dedicated struct per table.

use std::fmt;

use rusqlite::types::ValueRef;

#[derive(Debug, Clone, PartialEq)]
/// One SQLite value, owned so rows can outlive the statement that read them.
pub enum ColumnValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for ColumnValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => ColumnValue::Null,
            ValueRef::Integer(i) => ColumnValue::Integer(i),
            ValueRef::Real(r) => ColumnValue::Real(r),
            ValueRef::Text(t) => ColumnValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => ColumnValue::Blob(b.to_vec()),
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => Ok(()),
            ColumnValue::Integer(i) => write!(f, "{i}"),
            ColumnValue::Real(r) => write!(f, "{r}"),
            ColumnValue::Text(t) => f.write_str(t),
            ColumnValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// A fetched row: column names mapped to values, in result-set column order.
pub struct RowRecord {
    columns: Vec<(String, ColumnValue)>,
}

impl RowRecord {
    pub fn new(columns: Vec<(String, ColumnValue)>) -> Self {
        Self { columns }
    }

    /// Look up a column by name. SQLite column names are matched exactly.
    pub fn get(&self, name: &str) -> Option<&ColumnValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Render a column for display; missing columns render empty.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(ToString::to_string).unwrap_or_default()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RowRecord {
        RowRecord::new(vec![
            ("id".to_string(), ColumnValue::Integer(7)),
            ("nm_nome".to_string(), ColumnValue::Text("Bardo".to_string())),
            ("notes".to_string(), ColumnValue::Null),
        ])
    }

    #[test]
    fn lookups_by_column_name() {
        let row = sample();
        assert_eq!(row.get("id"), Some(&ColumnValue::Integer(7)));
        assert_eq!(row.text("nm_nome"), "Bardo");
        assert_eq!(row.text("notes"), "");
        assert_eq!(row.text("missing"), "");
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn blobs_render_as_their_size() {
        assert_eq!(ColumnValue::Blob(vec![0; 4]).to_string(), "<4 bytes>");
        assert_eq!(ColumnValue::Real(1.5).to_string(), "1.5");
    }
}
