use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report has no sections")]
    EmptyReport,

    #[error("Invalid chart image: {0}")]
    InvalidImage(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
