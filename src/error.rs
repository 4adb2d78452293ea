/// Errors that can occur when constructing a SafeMap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No hash function was configured, so keys cannot be routed to buckets.
    MissingHashFunction,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingHashFunction => write!(f, "hash function is required"),
        }
    }
}

impl std::error::Error for Error {}
