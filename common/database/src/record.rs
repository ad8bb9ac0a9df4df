use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow};

/// A row type living in its own table, identified by a store-assigned `id`.
pub trait Record: for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;

    /// Every column read back by point lookups and listings, `id` included.
    const COLUMNS: &'static [&'static str];

    /// The shape that gets inserted: everything but the identity.
    type New: Send + Sync + 'static;

    fn insert_values(new: &Self::New) -> Vec<(&'static str, Value)>;

    fn from_new(id: i64, new: Self::New) -> Self;

    fn id(&self) -> i64;
}

/// A bindable column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

pub(crate) fn insert_statement(table: &str, columns: &[&str]) -> String {
    let placeholders = (1..=columns.len())
        .map(|position| format!("${position}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING id",
        columns.join(", ")
    )
}

pub(crate) fn select_one_statement(table: &str, columns: &[&str]) -> String {
    format!("SELECT {} FROM {table} WHERE id = $1", columns.join(", "))
}

pub(crate) fn select_all_statement(table: &str, columns: &[&str]) -> String {
    format!("SELECT {} FROM {table} ORDER BY id ASC", columns.join(", "))
}
