//! Per-invocation parsing context and tokenizer.
//!
//! A [`Context`] is built for one resolved command. Its flag indexes hold
//! the command's own flags, every root flag, and the persistent flags of the
//! ancestors in between. [`Context::parse`] then walks the residual tokens
//! once, left to right:
//!
//! - `--name`, `--name=value`, `--name value`
//! - `-x`, `-xyz` (bundled booleans), `-kvalue`, `-k=value`, `-k value`
//! - `--` turns every remaining token into a positional argument
//! - anything else (including `-` alone) is a positional argument
//!
//! Boolean flags never consume the following token.

use std::collections::HashMap;
use std::io::{self, Write};
use std::net::IpAddr;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::command::{Cancellation, Command, HELP_FLAG, HELP_SHORT, Options};
use crate::error::ParseError;
use crate::flag::FlagRef;
use crate::help::write_help;
use crate::value::{BoolValue, IntValue, IpValue, StringValue};

/// Effective flag set of the last command in `path`, own flags first.
///
/// Own flags are always included, root flags are always inherited, and any
/// other ancestor only contributes its persistent flags. The set is
/// recomputed on every call.
pub(crate) fn effective_flags(path: &[&Command]) -> Vec<(FlagRef, bool)> {
    let mut flags = Vec::new();
    for (depth, cmd) in path.iter().enumerate().rev() {
        let own = depth + 1 == path.len();
        let root = depth == 0;
        for flag in cmd.flags() {
            if own || root || flag.is_persistent() {
                flags.push((Rc::clone(flag), own));
            }
        }
    }
    flags
}

/// Parsing state for one invocation of one command.
///
/// # Examples
///
/// ```
/// use argtree_core::{Command, Context, Flag};
///
/// let root = Command::new("app")
///     .with_flag(Flag::int("count", 0))
///     .with_command(Command::new("sync"));
/// let args: Vec<String> = ["app", "sync", "--count", "5", "x"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
///
/// let resolution = root.find(&args).unwrap();
/// let mut ctx = Context::new(resolution.path());
/// ctx.parse(resolution.residual()).unwrap();
///
/// assert_eq!(ctx.command().name(), "sync");
/// assert_eq!(ctx.int("count"), 5);
/// assert_eq!(ctx.args(), ["x"]);
/// ```
pub struct Context<'a> {
    path: Vec<&'a Command>,
    long: HashMap<String, FlagRef>,
    short: HashMap<char, FlagRef>,
    order: Vec<FlagRef>,
    args: Vec<String>,
    out: Box<dyn Write + 'a>,
    cancellation: Cancellation,
}

impl<'a> Context<'a> {
    /// Builds the context for the last command of `path`, which must run
    /// from the root down to that command.
    ///
    /// # Panics
    ///
    /// Panics if `path` is empty, or if two flags of the effective set share
    /// a long name or a short character. Both are declaration mistakes in
    /// host code, not bad input.
    pub fn new(path: &[&'a Command]) -> Self {
        assert!(!path.is_empty(), "context needs at least the root command");

        let mut ctx = Self {
            path: path.to_vec(),
            long: HashMap::new(),
            short: HashMap::new(),
            order: Vec::new(),
            args: Vec::new(),
            out: Box::new(io::stdout()),
            cancellation: Cancellation::new(),
        };
        for (flag, _) in effective_flags(path) {
            ctx.add(flag);
        }
        debug!(
            command = ctx.command().name(),
            flags = ctx.order.len(),
            "Built parsing context"
        );
        ctx
    }

    /// Sends help output to `out` instead of stdout.
    pub fn with_output(mut self, out: impl Write + 'a) -> Self {
        self.out = Box::new(out);
        self
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    fn add(&mut self, flag: FlagRef) {
        let name = flag.name();
        if self.long.contains_key(name) {
            panic!("flag {name} redefined");
        }
        if let Some(short) = flag.short() {
            if let Some(used) = self.short.get(&short) {
                panic!("short flag {short} is used by flag {}", used.name());
            }
            self.short.insert(short, Rc::clone(&flag));
        }
        self.long.insert(name.to_string(), Rc::clone(&flag));
        self.order.push(flag);
    }

    /// The resolved command.
    pub fn command(&self) -> &'a Command {
        self.path[self.path.len() - 1]
    }

    /// Commands from the root down to [`command`](Context::command).
    pub fn path(&self) -> &[&'a Command] {
        &self.path
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Looks up any effective flag by long name.
    pub fn get(&self, name: &str) -> Option<&FlagRef> {
        self.long.get(name)
    }

    /// String flag value; empty when absent or not a string flag.
    pub fn string(&self, key: &str) -> String {
        self.long
            .get(key)
            .and_then(|flag| flag.downcast::<StringValue, _>(|v| v.get().to_string()))
            .unwrap_or_default()
    }

    /// Int flag value; 0 when absent or not an int flag.
    pub fn int(&self, key: &str) -> i64 {
        self.long
            .get(key)
            .and_then(|flag| flag.downcast::<IntValue, _>(IntValue::get))
            .unwrap_or_default()
    }

    /// Bool flag value; false when absent or not a bool flag.
    pub fn bool(&self, key: &str) -> bool {
        self.long
            .get(key)
            .and_then(|flag| flag.downcast::<BoolValue, _>(BoolValue::get))
            .unwrap_or_default()
    }

    /// IP flag value; `None` when absent, unset, or not an IP flag.
    pub fn ip(&self, key: &str) -> Option<IpAddr> {
        self.long
            .get(key)
            .and_then(|flag| flag.downcast::<IpValue, _>(IpValue::get))
            .flatten()
    }

    /// Positional arguments in encounter order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Every effective flag, own flags first.
    pub fn flags(&self) -> impl Iterator<Item = &FlagRef> {
        self.order.iter()
    }

    /// Effective flags marked persistent.
    pub fn persistent_flags(&self) -> impl Iterator<Item = &FlagRef> {
        self.order.iter().filter(|flag| flag.is_persistent())
    }

    /// Parses residual tokens into flag values and positional arguments.
    ///
    /// Returns [`ParseError::HelpRequested`] after writing help when
    /// `--help` or `-h` is seen. If the command has
    /// [`Options::EXIT_ON_ERROR`], any other error is printed to stderr and
    /// the process exits with status 2.
    pub fn parse(&mut self, args: &[String]) -> Result<(), ParseError> {
        match self.parse_tokens(args) {
            Err(err) if !err.is_help() && self.options().contains(Options::EXIT_ON_ERROR) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
            result => result,
        }
    }

    fn options(&self) -> Options {
        self.command().options()
    }

    fn tolerates_undefined(&self) -> bool {
        self.options().contains(Options::UNDEFINED_FLAGS)
    }

    fn parse_tokens(&mut self, args: &[String]) -> Result<(), ParseError> {
        self.args = Vec::with_capacity(args.len());

        let mut rest = args;
        while let Some((arg, tail)) = rest.split_first() {
            rest = tail;
            if arg.len() < 2 || !arg.starts_with('-') {
                self.args.push(arg.clone());
                continue;
            }
            if arg == "--" {
                self.args.extend_from_slice(rest);
                break;
            }
            rest = match arg.strip_prefix("--") {
                Some(name) => self.parse_long(arg, name, rest)?,
                None => self.parse_short(&arg[1..], rest)?,
            };
        }
        Ok(())
    }

    fn parse_long<'t>(
        &mut self,
        arg: &'t str,
        name: &'t str,
        rest: &'t [String],
    ) -> Result<&'t [String], ParseError> {
        if name.starts_with('-') || name.starts_with('=') {
            return Err(ParseError::MalformedFlag(arg.to_string()));
        }
        let (key, inline) = match name.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (name, None),
        };

        let Some(flag) = self.long.get(key).cloned() else {
            if key == HELP_FLAG {
                return Err(self.show_help());
            }
            if self.tolerates_undefined() {
                trace!(flag = key, "Skipping undefined flag");
                return Ok(match inline {
                    Some(_) => rest,
                    None => skip_undefined_value(rest),
                });
            }
            return Err(ParseError::UndefinedFlag(key.to_string()));
        };
        if flag.name() == HELP_FLAG {
            return Err(self.show_help());
        }

        let (value, rest) = match inline {
            Some(value) => (value, rest),
            None if flag.is_optional_value() => ("true", rest),
            None => match rest.split_first() {
                Some((next, tail)) => (next.as_str(), tail),
                None => return Err(ParseError::MissingArgument(key.to_string())),
            },
        };
        flag.set(value)?;
        debug!(flag = key, value, "Set long flag");
        Ok(rest)
    }

    fn parse_short<'t>(
        &mut self,
        keys: &'t str,
        rest: &'t [String],
    ) -> Result<&'t [String], ParseError> {
        for (i, ch) in keys.char_indices() {
            let tail = &keys[i + ch.len_utf8()..];

            let Some(flag) = self.short.get(&ch).cloned() else {
                if ch == HELP_SHORT {
                    return Err(self.show_help());
                }
                if self.tolerates_undefined() {
                    trace!(flag = %ch, "Skipping undefined shorthand flag");
                    return Ok(skip_undefined_value(rest));
                }
                return Err(ParseError::UndefinedShorthand(ch));
            };
            if flag.name() == HELP_FLAG {
                return Err(self.show_help());
            }

            // -k=value
            if let Some(value) = tail.strip_prefix('=').filter(|value| !value.is_empty()) {
                flag.set(value)?;
                debug!(flag = flag.name(), value, "Set short flag");
                return Ok(rest);
            }
            // -k, bundling continues
            if flag.is_optional_value() {
                flag.set("true")?;
                debug!(flag = flag.name(), "Set short switch");
                continue;
            }
            // -kvalue
            if !tail.is_empty() {
                flag.set(tail)?;
                debug!(flag = flag.name(), value = tail, "Set short flag");
                return Ok(rest);
            }
            // -k value
            return match rest.split_first() {
                Some((next, remaining)) => {
                    flag.set(next)?;
                    debug!(flag = flag.name(), value = %next, "Set short flag");
                    Ok(remaining)
                }
                None => Err(ParseError::MissingArgument(flag.name().to_string())),
            };
        }
        Ok(rest)
    }

    fn show_help(&mut self) -> ParseError {
        debug!(command = self.command().name(), "Help requested");
        if let Err(err) = write_help(&mut self.out, &self.path) {
            warn!(error = %err, "Failed to write help");
        }
        ParseError::HelpRequested
    }
}

/// Drops the token following an undefined flag when it does not look like a
/// flag itself, on the guess that it was the flag's value.
fn skip_undefined_value(rest: &[String]) -> &[String] {
    match rest.split_first() {
        Some((next, tail)) if !next.starts_with('-') => tail,
        _ => rest,
    }
}
