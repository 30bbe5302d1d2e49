//! Command schema validation.
//!
//! Catches the declaration mistakes that would otherwise panic when a
//! parsing context is built (two flags sharing a long name or a short
//! character within one effective flag set), plus malformed names and
//! duplicate sibling commands, before a tree is built from the schema.
//!
//! The built-in `help`/`h` flag that execution injects into the root is
//! part of every effective set.
//!
//! # Examples
//!
//! ```
//! use argtree_core::*;
//!
//! let schema = CommandSchema::new("app")
//!     .with_flag(FlagSchema::new("verbose", ValueKind::Bool).with_short('v'))
//!     .with_command(CommandSchema::new("sync"));
//! assert!(validate_schema(&schema).is_empty());
//!
//! // Invalid: a child redeclares a root flag
//! let bad = CommandSchema::new("app")
//!     .with_flag(FlagSchema::new("verbose", ValueKind::Bool))
//!     .with_command(
//!         CommandSchema::new("sync").with_flag(FlagSchema::new("verbose", ValueKind::Bool)),
//!     );
//! assert!(!validate_schema(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::schema::{CommandSchema, FlagSchema};

/// Schema validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Two sibling commands share a name.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// A flag in the named command has an empty long name.
    #[error("flag name cannot be empty in {0}")]
    EmptyFlagName(String),
    /// Long name starts with `-` or contains `=`, so it can never be typed.
    #[error("invalid flag name: {0}")]
    InvalidFlagName(String),
    /// Short character that collides with token syntax.
    #[error("invalid short flag: {0:?}")]
    InvalidShortFlag(char),
    /// Two flags in one effective flag set share a long name.
    #[error("duplicate flag --{flag} in {command}")]
    DuplicateFlag { command: String, flag: String },
    /// Two flags in one effective flag set share a short character.
    #[error("duplicate short flag -{short} in {command}")]
    DuplicateShortFlag { command: String, short: char },
}

/// Validates a command schema and all of its subcommands.
///
/// Stops at the first problem found.
pub fn validate_schema(schema: &CommandSchema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schema.name.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return errors;
    }

    let help = FlagSchema::help();
    let mut path = vec![schema.name.clone()];
    errors.extend(validate_command(schema, &mut path, &[&help]));

    errors
}

fn validate_command<'s>(
    cmd: &'s CommandSchema,
    path: &mut Vec<String>,
    inherited: &[&'s FlagSchema],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let scope = path.join(" ");

    errors.extend(validate_flag_names(&cmd.flags, &scope));
    if !errors.is_empty() {
        return errors;
    }

    let mut longs: HashSet<&str> = HashSet::new();
    let mut shorts: HashSet<char> = HashSet::new();
    for flag in cmd.flags.iter().chain(inherited.iter().copied()) {
        if !longs.insert(flag.name.as_str()) {
            errors.push(ValidationError::DuplicateFlag {
                command: scope,
                flag: flag.name.clone(),
            });
            return errors;
        }
        if let Some(short) = flag.short {
            if !shorts.insert(short) {
                errors.push(ValidationError::DuplicateShortFlag {
                    command: scope,
                    short,
                });
                return errors;
            }
        }
    }

    let is_root = path.len() == 1;
    let mut passed_down = inherited.to_vec();
    passed_down.extend(cmd.flags.iter().filter(|flag| is_root || flag.persistent));

    let mut seen: HashSet<&str> = HashSet::new();
    for child in &cmd.commands {
        let name = child.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyCommandName);
            return errors;
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateCommand(format!("{scope} {name}")));
            return errors;
        }

        path.push(name.to_string());
        errors.extend(validate_command(child, path, &passed_down));
        path.pop();
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_flag_names(flags: &[FlagSchema], scope: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for flag in flags {
        if flag.name.trim().is_empty() {
            errors.push(ValidationError::EmptyFlagName(scope.to_string()));
            return errors;
        }
        if flag.name.starts_with('-') || flag.name.contains('=') {
            errors.push(ValidationError::InvalidFlagName(flag.name.clone()));
            return errors;
        }
        if let Some(short) = flag.short {
            if short == '-' || short == '=' || short.is_whitespace() {
                errors.push(ValidationError::InvalidShortFlag(short));
                return errors;
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use crate::schema::ValueKind;

    use super::*;

    fn flag(name: &str) -> FlagSchema {
        FlagSchema::new(name, ValueKind::Bool)
    }

    #[test]
    fn test_validate_schema_accepts_valid_schema() {
        let schema = CommandSchema::new("app")
            .with_flag(flag("verbose").with_short('v'))
            .with_command(
                CommandSchema::new("remote")
                    .with_flag(flag("local").with_short('l'))
                    .with_command(CommandSchema::new("add").with_flag(flag("local"))),
            )
            .with_command(CommandSchema::new("sync").with_flag(flag("local")));

        assert!(validate_schema(&schema).is_empty());
    }

    #[test]
    fn test_validate_schema_rejects_empty_name() {
        let schema = CommandSchema::new("  ");
        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::EmptyCommandName]
        );
    }

    #[test]
    fn test_validate_schema_rejects_duplicate_sibling() {
        let schema = CommandSchema::new("app")
            .with_command(CommandSchema::new("sync"))
            .with_command(CommandSchema::new("sync"));
        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::DuplicateCommand("app sync".to_string())]
        );
    }

    #[test]
    fn test_validate_schema_rejects_help_collision() {
        let schema = CommandSchema::new("app").with_flag(flag("hidden").with_short('h'));
        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::DuplicateShortFlag {
                command: "app".to_string(),
                short: 'h',
            }]
        );
    }

    #[test]
    fn test_validate_schema_rejects_persistent_collision() {
        let schema = CommandSchema::new("app").with_command(
            CommandSchema::new("remote")
                .with_flag(flag("force").persistent())
                .with_command(CommandSchema::new("add").with_flag(flag("force"))),
        );
        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::DuplicateFlag {
                command: "app remote add".to_string(),
                flag: "force".to_string(),
            }]
        );
    }

    #[test]
    fn test_validate_schema_rejects_bad_names() {
        let schema = CommandSchema::new("app").with_flag(flag("--verbose"));
        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::InvalidFlagName("--verbose".to_string())]
        );

        let schema = CommandSchema::new("app").with_flag(flag("dash").with_short('-'));
        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::InvalidShortFlag('-')]
        );
    }
}
