//! Common result and error types for the weft router.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in weft or in a
/// device model feeding it inconsistent data), not a routing failure.
/// Routing failures are reported through the route crate's own error type.
pub type WeftResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in weft, not a problem with the design.
///
/// These errors should never occur during normal operation. If one does
/// occur, it means an invariant of the binding state or the routing graph
/// has been violated.
#[derive(Debug, thiserror::Error)]
#[error("internal router error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("binding maps disagree");
        assert_eq!(
            format!("{err}"),
            "internal router error: binding maps disagree"
        );
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
