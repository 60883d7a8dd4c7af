//! Relational database access
//!
//! Every call opens one connection, does its work and closes it again.
//! There is no pool and nothing is retried.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shared_types::{Cell, Dataset};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Column, ColumnIndex, Connection, Decode, Executor, Row, Statement, Type, ValueRef};
use tracing::{debug, info, warn};

use crate::error::DataSourceError;
use crate::files::parse_field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    #[default]
    MySql,
    Sqlite,
}

impl DatabaseEngine {
    /// Quote a table name as an identifier. Embedded quote characters are
    /// doubled; names with a NUL byte or only whitespace are refused.
    pub fn quote_identifier(self, name: &str) -> Result<String, DataSourceError> {
        if name.trim().is_empty() || name.contains('\0') {
            return Err(DataSourceError::InvalidTableName(name.to_string()));
        }
        Ok(match self {
            DatabaseEngine::MySql => format!("`{}`", name.replace('`', "``")),
            DatabaseEngine::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        })
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseEngine::MySql => write!(f, "MySQL"),
            DatabaseEngine::Sqlite => write!(f, "SQLite"),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

/// Connection form values. For SQLite `database` is the file path and the
/// network fields are ignored.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    #[serde(default)]
    pub engine: DatabaseEngine,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionParams {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            engine: DatabaseEngine::Sqlite,
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            database: path.into(),
        }
    }

    fn mysql_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    fn sqlite_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.database)
            .create_if_missing(false)
    }
}

/// Dataset label for a loaded table, e.g. `MySQL: employees`
pub fn table_label(engine: DatabaseEngine, table: &str) -> String {
    format!("{}: {}", engine, table)
}

const SQLITE_TABLES: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

/// Connect, ping and disconnect
pub async fn test_connection(params: &ConnectionParams) -> Result<(), DataSourceError> {
    debug!(?params, "testing connection");
    match params.engine {
        DatabaseEngine::MySql => {
            let mut conn = MySqlConnection::connect_with(&params.mysql_options()).await?;
            conn.ping().await?;
            conn.close().await?;
        }
        DatabaseEngine::Sqlite => {
            let mut conn = SqliteConnection::connect_with(&params.sqlite_options()).await?;
            conn.ping().await?;
            conn.close().await?;
        }
    }
    info!(engine = %params.engine, database = %params.database, "connection ok");
    Ok(())
}

/// Names of the tables in the schema, sorted
pub async fn list_tables(params: &ConnectionParams) -> Result<Vec<String>, DataSourceError> {
    let mut tables = match params.engine {
        DatabaseEngine::MySql => {
            let mut conn = MySqlConnection::connect_with(&params.mysql_options()).await?;
            let rows = conn.fetch_all("SHOW TABLES").await?;
            conn.close().await?;
            rows.iter()
                .map(|row| row.try_get_unchecked::<String, _>(0))
                .collect::<Result<Vec<_>, _>>()?
        }
        DatabaseEngine::Sqlite => {
            let mut conn = SqliteConnection::connect_with(&params.sqlite_options()).await?;
            let rows = conn.fetch_all(SQLITE_TABLES).await?;
            conn.close().await?;
            rows.iter()
                .map(|row| row.try_get::<String, _>(0))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    tables.sort();
    debug!(count = tables.len(), "listed tables");
    Ok(tables)
}

/// Run the query on an open connection of either engine. Column names come
/// from the prepared statement so empty tables keep them.
macro_rules! fetch_dataset {
    ($conn:expr, $sql:expr, $label:expr) => {
        async {
            let columns: Vec<String> = $conn
                .prepare($sql)
                .await?
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            let rows = $conn.fetch_all($sql).await?;

            let mut dataset = Dataset::new($label, columns);
            for row in &rows {
                dataset.push_row((0..row.len()).map(|i| decode_cell(row, i)).collect());
            }
            Ok::<_, DataSourceError>(dataset)
        }
    };
}

/// `SELECT *` from one table into a dataset labelled `<Engine>: <table>`
pub async fn load_table(
    params: &ConnectionParams,
    table: &str,
) -> Result<Dataset, DataSourceError> {
    let sql = format!("SELECT * FROM {}", params.engine.quote_identifier(table)?);
    let label = table_label(params.engine, table);

    let dataset = match params.engine {
        DatabaseEngine::MySql => {
            let mut conn = MySqlConnection::connect_with(&params.mysql_options()).await?;
            let result = fetch_dataset!(conn, sql.as_str(), label).await;
            conn.close().await?;
            result?
        }
        DatabaseEngine::Sqlite => {
            let mut conn = SqliteConnection::connect_with(&params.sqlite_options()).await?;
            let result = fetch_dataset!(conn, sql.as_str(), label).await;
            conn.close().await?;
            result?
        }
    };

    info!(
        label = %dataset.label,
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "table loaded"
    );
    Ok(dataset)
}

/// Decode one value, trying the natural types in turn. Anything that fits
/// none of them (MySQL DECIMAL, for one) is read as text and typed the way a
/// CSV field would be; undecodable bytes become null.
fn decode_cell<'r, R>(row: &'r R, index: usize) -> Cell
where
    R: Row,
    usize: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    u64: Decode<'r, R::Database> + Type<R::Database>,
    f64: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
    NaiveDateTime: Decode<'r, R::Database> + Type<R::Database>,
    NaiveDate: Decode<'r, R::Database> + Type<R::Database>,
{
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Cell::Null,
        Ok(_) => {}
        Err(_) => return Cell::Null,
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Cell::Number(v as f64);
    }
    if let Ok(v) = row.try_get::<u64, _>(index) {
        return Cell::Number(v as f64);
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Cell::Number(v);
    }
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(index) {
        return Cell::Text(v.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
        return Cell::Text(v.format("%Y-%m-%d").to_string());
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Cell::Text(v);
    }
    match row.try_get_unchecked::<String, _>(index) {
        Ok(v) => untyped_cell(&v),
        Err(e) => {
            let column = row.columns().get(index).map(|c| c.name().to_string());
            warn!(?column, error = %e, "undecodable cell, stored as null");
            Cell::Null
        }
    }
}

/// Text of a column sqlx has no natural type for
fn untyped_cell(text: &str) -> Cell {
    parse_field(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn seeded_sqlite(dir: &TempDir) -> ConnectionParams {
        let path = dir.path().join("compliance.db");
        let options = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        for sql in [
            "CREATE TABLE trainings \
             (id INTEGER PRIMARY KEY, department TEXT, hours REAL, completed_on TEXT)",
            "CREATE TABLE incidents (id INTEGER PRIMARY KEY, severity TEXT)",
            "CREATE TABLE \"audit \"\"log\"\"\" (id INTEGER)",
            "INSERT INTO trainings (department, hours, completed_on) \
             VALUES ('Sales', 7.5, '2024-01-10'), ('Legal', 12, NULL)",
        ] {
            conn.execute(sql).await.unwrap();
        }
        conn.close().await.unwrap();
        ConnectionParams::sqlite(path.to_string_lossy())
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(DatabaseEngine::MySql.quote_identifier("users").unwrap(), "`users`");
        assert_eq!(
            DatabaseEngine::MySql.quote_identifier("a`; DROP TABLE x; --").unwrap(),
            "`a``; DROP TABLE x; --`"
        );
        assert_eq!(DatabaseEngine::Sqlite.quote_identifier("a\"b").unwrap(), "\"a\"\"b\"");
        assert!(matches!(
            DatabaseEngine::Sqlite.quote_identifier("  "),
            Err(DataSourceError::InvalidTableName(_))
        ));
    }

    #[test]
    fn test_labels_and_defaults() {
        assert_eq!(table_label(DatabaseEngine::MySql, "employees"), "MySQL: employees");
        let params: ConnectionParams =
            serde_json::from_str(r#"{"database":"compliance"}"#).unwrap();
        assert_eq!(params.engine, DatabaseEngine::MySql);
        assert_eq!((params.host.as_str(), params.port), ("localhost", 3306));
    }

    #[test]
    fn test_untyped_text_gets_natural_type() {
        assert_eq!(untyped_cell("1234.50"), Cell::Number(1234.5));
        assert_eq!(untyped_cell("42"), Cell::Number(42.0));
        assert_eq!(untyped_cell("pending"), Cell::Text("pending".to_string()));
        assert_eq!(untyped_cell(""), Cell::Null);
    }

    #[tokio::test]
    async fn test_sqlite_numeric_columns_are_numbers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("numeric.db");
        let options = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        conn.execute("CREATE TABLE budgets (id INTEGER, amount DECIMAL(10,2), label TEXT)")
            .await
            .unwrap();
        conn.execute("INSERT INTO budgets VALUES (9007199254740993, 1234.5, '42')")
            .await
            .unwrap();
        conn.close().await.unwrap();

        let ds = load_table(&ConnectionParams::sqlite(path.to_string_lossy()), "budgets")
            .await
            .unwrap();
        assert_eq!(ds.rows[0][0], Cell::Number(9007199254740993_i64 as f64));
        assert_eq!(ds.rows[0][1], Cell::Number(1234.5));
        // declared text stays text
        assert_eq!(ds.rows[0][2], Cell::Text("42".to_string()));
    }

    #[test]
    fn test_debug_hides_password() {
        let mut params = ConnectionParams::sqlite("x.db");
        params.password = "hunter2".to_string();
        assert!(!format!("{:?}", params).contains("hunter2"));
    }

    #[tokio::test]
    async fn test_sqlite_lists_exactly_the_tables() {
        let dir = TempDir::new().unwrap();
        let params = seeded_sqlite(&dir).await;
        test_connection(&params).await.unwrap();
        assert_eq!(
            list_tables(&params).await.unwrap(),
            vec!["audit \"log\"", "incidents", "trainings"]
        );
    }

    #[tokio::test]
    async fn test_sqlite_load_table() {
        let dir = TempDir::new().unwrap();
        let params = seeded_sqlite(&dir).await;
        let ds = load_table(&params, "trainings").await.unwrap();
        assert_eq!(ds.label, "SQLite: trainings");
        assert_eq!(ds.columns, vec!["id", "department", "hours", "completed_on"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.rows[0][1], Cell::Text("Sales".to_string()));
        assert_eq!(ds.rows[0][2], Cell::Number(7.5));
        assert_eq!(ds.rows[1][3], Cell::Null);
    }

    #[tokio::test]
    async fn test_sqlite_empty_table_keeps_columns() {
        let dir = TempDir::new().unwrap();
        let params = seeded_sqlite(&dir).await;
        let ds = load_table(&params, "incidents").await.unwrap();
        assert_eq!(ds.columns, vec!["id", "severity"]);
        assert_eq!(ds.row_count(), 0);
    }

    #[tokio::test]
    async fn test_quoted_table_name_loads() {
        let dir = TempDir::new().unwrap();
        let params = seeded_sqlite(&dir).await;
        let ds = load_table(&params, "audit \"log\"").await.unwrap();
        assert_eq!(ds.columns, vec!["id"]);
    }

    #[tokio::test]
    async fn test_missing_table_is_database_error() {
        let dir = TempDir::new().unwrap();
        let params = seeded_sqlite(&dir).await;
        assert!(matches!(
            load_table(&params, "nope").await,
            Err(DataSourceError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_sqlite_file_is_unreachable() {
        let dir = TempDir::new().unwrap();
        let params = ConnectionParams::sqlite(dir.path().join("absent.db").to_string_lossy());
        assert!(matches!(
            test_connection(&params).await,
            Err(DataSourceError::Unreachable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_mysql_host() {
        let params = ConnectionParams {
            engine: DatabaseEngine::MySql,
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "root".to_string(),
            password: String::new(),
            database: "compliance".to_string(),
        };
        assert!(matches!(
            test_connection(&params).await,
            Err(DataSourceError::Unreachable(_))
        ));
    }
}
