use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("Unknown pillar: {0}")]
    UnknownPillar(u32),

    #[error("Unknown dashboard template: {0}")]
    UnknownTemplate(String),
}
