use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(String),

    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    #[error("Invalid filter document: {0}")]
    InvalidDocument(String),
}
