//! Declarative command schemas.
//!
//! A [`CommandSchema`] describes a command tree as data so it can live in a
//! JSON or YAML file. [`CommandSchema::build`] validates it and produces a
//! live [`Command`] tree without run handlers.
//!
//! # Example YAML
//!
//! ```yaml
//! name: example
//! usage: A command line app demonstrating subcommands.
//! flags:
//!   - name: address
//!     type: ip
//!     default: 127.0.0.1
//!   - name: verbose
//!     short: v
//!     type: bool
//!     persistent: true
//! commands:
//!   - name: download
//!     args: [file]
//!     options:
//!       undefined_flags: true
//!     flags:
//!       - name: thread
//!         short: t
//!         type: int
//!         default: "2"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::{Command, HELP_FLAG, HELP_SHORT, Options};
use crate::error::SchemaError;
use crate::flag::Flag;
use crate::validate::validate_schema;
use crate::value::{BoolValue, IntValue, IpValue, StringValue, Value};

/// Scalar type of a declared flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Free-form text (the default).
    #[default]
    String,
    /// Signed integer.
    Int,
    /// Boolean switch.
    Bool,
    /// IPv4 or IPv6 address.
    #[serde(alias = "IP")]
    Ip,
}

/// Behavior toggles of a command, mirrored from [`Options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Tolerate and skip undeclared flags.
    pub undefined_flags: bool,
    /// Print parse errors and exit with status 2.
    pub exit_on_error: bool,
}

impl From<SchemaOptions> for Options {
    fn from(opts: SchemaOptions) -> Self {
        let mut options = Options::empty();
        if opts.undefined_flags {
            options |= Options::UNDEFINED_FLAGS;
        }
        if opts.exit_on_error {
            options |= Options::EXIT_ON_ERROR;
        }
        options
    }
}

/// Schema for one flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSchema {
    /// Long name, written `--name` on the command line.
    pub name: String,
    /// Single-character alias, written `-c`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(default, rename = "type")]
    pub kind: ValueKind,
    /// Default value as command-line text; the type's zero value if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Inherited by every descendant command.
    #[serde(default)]
    pub persistent: bool,
}

impl FlagSchema {
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            usage: String::new(),
            kind,
            default: None,
            persistent: false,
        }
    }

    /// The built-in flag execution injects into every root.
    pub fn help() -> Self {
        Self::new(HELP_FLAG, ValueKind::Bool).with_short(HELP_SHORT)
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_string();
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Builds the live flag, parsing the default with the flag's own value
    /// type.
    pub fn to_flag(&self) -> Result<Flag, SchemaError> {
        let mut flag = match self.kind {
            ValueKind::String => Flag::new(&self.name, self.parse_default(StringValue::default())?),
            ValueKind::Int => Flag::new(&self.name, self.parse_default(IntValue::default())?),
            ValueKind::Bool => Flag::new(&self.name, self.parse_default(BoolValue::default())?),
            ValueKind::Ip => Flag::new(&self.name, self.parse_default(IpValue::default())?),
        }
        .with_usage(&self.usage);
        if let Some(short) = self.short {
            flag = flag.with_short(short);
        }
        if self.persistent {
            flag = flag.persistent();
        }
        Ok(flag)
    }

    fn parse_default<V: Value>(&self, mut value: V) -> Result<V, SchemaError> {
        if let Some(default) = &self.default {
            value
                .set(default)
                .map_err(|source| SchemaError::InvalidDefault {
                    flag: self.name.clone(),
                    source,
                })?;
        }
        Ok(value)
    }
}

/// Schema for a command and its subcommands.
///
/// # Examples
///
/// ```
/// use argtree_core::{CommandSchema, FlagSchema, ValueKind};
///
/// let schema = CommandSchema::from_json(
///     r#"{"name": "app", "flags": [{"name": "count", "type": "int", "default": "3"}],
///         "commands": [{"name": "sync"}]}"#,
/// )
/// .unwrap();
/// assert_eq!(schema.flags[0], FlagSchema::new("count", ValueKind::Int).with_default("3"));
///
/// let root = schema.build().unwrap();
/// assert_eq!(root.children()[0].name(), "sync");
/// assert_eq!(root.flags()[0].value_string(), "3");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub example: String,
    /// Positional argument names, shown in help.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default)]
    pub options: SchemaOptions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandSchema>,
}

impl CommandSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_flag(mut self, flag: FlagSchema) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_command(mut self, command: CommandSchema) -> Self {
        self.commands.push(command);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Loads a schema file; `.yaml`/`.yml` files are read as YAML, anything
    /// else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&raw),
            _ => Self::from_json(&raw),
        }
    }

    /// Validates the schema and builds the command tree.
    pub fn build(&self) -> Result<Command, SchemaError> {
        let errors = validate_schema(self);
        if !errors.is_empty() {
            return Err(SchemaError::Invalid(errors));
        }
        self.build_unchecked()
    }

    fn build_unchecked(&self) -> Result<Command, SchemaError> {
        let mut cmd = Command::new(&self.name)
            .with_usage(&self.usage)
            .with_version(&self.version)
            .with_example(&self.example)
            .with_options(self.options.into());
        for arg in &self.args {
            cmd = cmd.with_arg(arg);
        }
        for flag in &self.flags {
            cmd.add_flag(flag.to_flag()?);
        }
        for child in &self.commands {
            cmd.add_command(child.build_unchecked()?);
        }
        Ok(cmd)
    }
}
