use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseEnumError {
    #[error("unknown status '{0}', expected one of Todo, Progress, Done")]
    Status(String),
    #[error("unknown priority '{0}', expected one of Minor, Low, Moderate, Important, Critical")]
    Priority(String),
}

/// Rejections raised while turning list query parameters into a query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid page '{0}', expected an integer >= 1")]
    Page(String),
    #[error("invalid limit '{0}', expected an integer >= 1")]
    Limit(String),
    #[error(transparent)]
    Filter(#[from] ParseEnumError),
}
