//! Error types for command resolution, parsing and execution.
//!
//! [`ParseError`] covers bad user input plus the [`ParseError::HelpRequested`]
//! sentinel, which callers treat as a clean exit. [`Error`] is what
//! [`Command::exec`](crate::Command::exec) returns: either a parse failure or
//! whatever the run handler returned.
//!
//! Declaration mistakes in host code (two flags sharing a name in one
//! effective flag set) are not represented here; they panic at context
//! construction.

use thiserror::Error;

use crate::validate::ValidationError;
use crate::value::ValueError;

/// Boxed error returned by run handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to resolve or parse an argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Help was displayed; not a failure.
    #[error("help requested")]
    HelpRequested,
    /// The argument vector never named the root command.
    #[error("arguments do not start with root command {expected:?}")]
    RootMismatch { expected: String },
    /// Long-form token such as `---x` or `--=x`.
    #[error("unexpected flag {0}")]
    MalformedFlag(String),
    /// `--name` with no declared flag `name`.
    #[error("undefined flag: --{0}")]
    UndefinedFlag(String),
    /// `-c` with no declared short flag `c`.
    #[error("undefined shorthand flag: -{0}")]
    UndefinedShorthand(char),
    /// A flag that takes a value was the last token.
    #[error("flag {0} needs an argument")]
    MissingArgument(String),
    /// The flag's value rejected the supplied text.
    #[error(transparent)]
    InvalidValue(#[from] ValueError),
}

impl ParseError {
    pub fn is_help(&self) -> bool {
        matches!(self, Self::HelpRequested)
    }
}

/// Failure of a full invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Error returned by the command's run handler.
    #[error("command failed: {0}")]
    Handler(#[source] BoxError),
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to load a [`CommandSchema`](crate::CommandSchema) or build a
/// command tree from it.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The schema breaks a structural rule.
    #[error(
        "invalid schema: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Invalid(Vec<ValidationError>),

    /// A flag's declared default does not parse as the flag's type.
    #[error("invalid default for flag {flag}: {source}")]
    InvalidDefault {
        flag: String,
        #[source]
        source: ValueError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_errors_keep_their_own_message() {
        let err: ParseError = ValueError::InvalidBool("maybe".to_string()).into();
        assert_eq!(err.to_string(), "invalid bool value \"maybe\"");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ParseError::UndefinedFlag("unknown".to_string()).to_string(),
            "undefined flag: --unknown"
        );
        assert_eq!(
            ParseError::UndefinedShorthand('x').to_string(),
            "undefined shorthand flag: -x"
        );
        assert_eq!(
            ParseError::MissingArgument("thread".to_string()).to_string(),
            "flag thread needs an argument"
        );
        assert!(ParseError::HelpRequested.is_help());
    }

    #[test]
    fn test_schema_error_lists_every_problem() {
        let err = SchemaError::Invalid(vec![
            ValidationError::EmptyCommandName,
            ValidationError::DuplicateCommand("app sync".to_string()),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid schema: command name cannot be empty; duplicate command: app sync"
        );
    }
}
