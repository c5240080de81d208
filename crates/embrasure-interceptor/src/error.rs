use thiserror::Error;

/// Errors from chain manipulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    #[error("no interceptor named '{0}' in chain")]
    UnknownAnchor(String),
}
