use sqlx::error::DatabaseError;
use sqlx::sqlite::SqliteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Database unreachable: {0}")]
    Unreachable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column {0} has no numeric values")]
    NoNumericValues(String),
}

impl DataSourceError {
    pub fn parse(file: &str, message: impl ToString) -> Self {
        Self::Parse {
            file: file.to_string(),
            message: message.to_string(),
        }
    }
}

/// SQLSTATE for rejected credentials (MySQL error 1045)
const ACCESS_DENIED: &str = "28000";
/// Primary SQLite result code for a database file that cannot be opened
const SQLITE_CANTOPEN: i32 = 14;

/// SQLite reports extended result codes; the low byte is the primary code
fn sqlite_cannot_open(db: &(dyn DatabaseError + 'static)) -> bool {
    db.try_downcast_ref::<SqliteError>().is_some()
        && db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| code & 0xff == SQLITE_CANTOPEN)
}

impl From<sqlx::Error> for DataSourceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                Self::Unreachable(err.to_string())
            }
            sqlx::Error::Database(db) if db.code().as_deref() == Some(ACCESS_DENIED) => {
                Self::AuthenticationFailed(db.message().to_string())
            }
            sqlx::Error::Database(db) if sqlite_cannot_open(&**db) => {
                Self::Unreachable(db.message().to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}
