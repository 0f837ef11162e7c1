// ABOUTME: Error types for reader, evaluator, and primitive failures

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A primitive received a value of the wrong variant.
    #[error("TYPE ERROR: {position}-th arg for {name} is not a {expected}")]
    Type {
        name: String,
        position: usize,
        expected: String,
    },

    /// Surface syntax could not be read.
    #[error("PARSE ERROR: {0}")]
    Parse(String),

    /// Unbound symbol, arity violation, and friends.
    #[error("ERROR: {0}")]
    Eval(String),

    /// An underlying stream operation failed.
    #[error("IO ERROR: {0}")]
    Io(String),

    /// An evaluator invariant has been violated. Always fatal.
    #[error("INTERNAL ERROR: {0}")]
    Internal(String),
}

impl Error {
    /// Type error for the `position`-th argument of primitive `name`.
    pub fn type_error(name: &str, position: usize, expected: &str) -> Self {
        Error::Type {
            name: format!("subr \"{}\"", name),
            position,
            expected: expected.to_string(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    pub fn eval(message: impl Into<String>) -> Self {
        Error::Eval(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_error_message_format() {
        let err = Error::type_error("intern", 0, "string");
        assert_eq!(
            err.to_string(),
            "TYPE ERROR: 0-th arg for subr \"intern\" is not a string"
        );
    }

    #[test]
    fn test_eval_error_message() {
        let err = Error::eval("reference to unbound symbol.");
        assert_eq!(err.to_string(), "ERROR: reference to unbound symbol.");
    }
}
