//! Error types for the compliance server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use compliance_engine::CatalogError;
use data_sources::DataSourceError;
use report_pdf::ReportError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Pillar not found: {0}")]
    PillarNotFound(u32),

    #[error("Database unreachable: {0}")]
    DatabaseUnreachable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::UnsupportedFile(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE_TYPE"),
            ServerError::DatasetNotFound(_) => (StatusCode::NOT_FOUND, "DATASET_NOT_FOUND"),
            ServerError::ReportNotFound(_) => (StatusCode::NOT_FOUND, "REPORT_NOT_FOUND"),
            ServerError::TemplateNotFound(_) => (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND"),
            ServerError::PillarNotFound(_) => (StatusCode::NOT_FOUND, "PILLAR_NOT_FOUND"),
            ServerError::DatabaseUnreachable(_) => {
                (StatusCode::BAD_GATEWAY, "DATABASE_UNREACHABLE")
            }
            ServerError::AuthenticationFailed(_) => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED")
            }
            ServerError::Query(_) => (StatusCode::BAD_REQUEST, "QUERY_FAILED"),
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DataSourceError> for ServerError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::UnsupportedFileType(name) => ServerError::UnsupportedFile(name),
            DataSourceError::Unreachable(msg) => ServerError::DatabaseUnreachable(msg),
            DataSourceError::AuthenticationFailed(msg) => ServerError::AuthenticationFailed(msg),
            DataSourceError::Database(msg) => ServerError::Query(msg),
            other => ServerError::InvalidRequest(other.to_string()),
        }
    }
}

impl From<ReportError> for ServerError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::EmptyReport | ReportError::InvalidImage(_) => {
                ServerError::InvalidRequest(err.to_string())
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownPillar(number) => ServerError::PillarNotFound(number),
            CatalogError::UnknownTemplate(name) => ServerError::TemplateNotFound(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_errors_map_to_statuses() {
        let cases = [
            (DataSourceError::UnsupportedFileType("a.pdf".into()), StatusCode::BAD_REQUEST),
            (DataSourceError::Unreachable("refused".into()), StatusCode::BAD_GATEWAY),
            (DataSourceError::AuthenticationFailed("denied".into()), StatusCode::UNAUTHORIZED),
            (DataSourceError::UnknownColumn("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_report_errors_map_to_statuses() {
        assert_eq!(
            ServerError::from(ReportError::EmptyReport).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(
            ServerError::from(ReportError::Io(io)).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
