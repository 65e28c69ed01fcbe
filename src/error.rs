use thiserror::Error;

/// Failures raised by the domain resolver.
///
/// Both variants are turned into response values by the boundary
/// functions in [`crate::api`]; they never reach the navigation host as a fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("malformed URL `{input}`: {reason}")]
    MalformedUrl { input: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
