//! Command tree, resolver and invocation entry point.
//!
//! A host builds a tree of [`Command`]s once, then calls
//! [`Command::exec`] on the root with the process arguments. Execution
//! resolves the target command ([`Command::find`]), builds a fresh
//! [`Context`] for it, parses the residual tokens and finally calls the
//! command's run handler.
//!
//! The tree is meant for single-threaded use: flags are shared through
//! [`Rc`] and mutated in place while parsing.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::context::Context;
use crate::error::{BoxError, Error, ParseError, Result};
use crate::flag::{Flag, FlagRef};
use crate::help::command_path;

/// Name of the flag injected into every root on first execution.
pub const HELP_FLAG: &str = "help";
/// Short alias of [`HELP_FLAG`].
pub const HELP_SHORT: char = 'h';

/// Handler invoked with the populated context once parsing succeeds.
pub type RunFn = Box<dyn Fn(&Context<'_>) -> std::result::Result<(), BoxError>>;

/// Per-command behavior toggles.
///
/// # Examples
///
/// ```
/// use argtree_core::Options;
///
/// let opts = Options::UNDEFINED_FLAGS | Options::EXIT_ON_ERROR;
/// assert!(opts.contains(Options::UNDEFINED_FLAGS));
/// assert!(!Options::default().contains(Options::EXIT_ON_ERROR));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Options(u8);

impl Options {
    /// Tolerate and skip flags that are not declared.
    pub const UNDEFINED_FLAGS: Options = Options(1);
    /// Print parse errors and exit the process with status 2.
    pub const EXIT_ON_ERROR: Options = Options(1 << 1);

    pub const fn empty() -> Self {
        Options(0)
    }

    pub const fn contains(self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Options {
    type Output = Options;

    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Options) {
        self.0 |= rhs.0;
    }
}

/// Cancellation handle passed through to run handlers.
///
/// The parser never looks at it; long-running handlers can poll
/// [`is_cancelled`](Cancellation::is_cancelled).
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A node in the command tree.
///
/// Children are moved into their parent, so a command can never be its own
/// child.
///
/// # Examples
///
/// ```
/// use argtree_core::{Command, Flag};
///
/// let root = Command::new("example")
///     .with_usage("A command line app demonstrating subcommands.")
///     .with_flag(Flag::ip("address", "127.0.0.1"))
///     .with_command(
///         Command::new("download")
///             .with_flag(Flag::int("thread", 2).with_short('t')),
///     );
///
/// let args: Vec<String> = ["example", "--address", "10.0.0.1", "download", "-t4"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// let resolution = root.find(&args).unwrap();
/// assert_eq!(resolution.command().name(), "download");
/// assert_eq!(resolution.residual(), ["--address", "10.0.0.1", "-t4"]);
/// ```
pub struct Command {
    name: String,
    version: String,
    example: String,
    usage: String,
    args: Vec<String>,
    flags: Vec<FlagRef>,
    options: Options,
    run: Option<RunFn>,
    children: Vec<Command>,
    help_injected: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            example: String::new(),
            usage: String::new(),
            args: Vec::new(),
            flags: Vec::new(),
            options: Options::empty(),
            run: None,
            children: Vec::new(),
            help_injected: false,
        }
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    /// Declares a positional argument name (used by help output only).
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.add_flag(flag);
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options |= options;
        self
    }

    pub fn with_run<F>(mut self, run: F) -> Self
    where
        F: Fn(&Context<'_>) -> std::result::Result<(), BoxError> + 'static,
    {
        self.run = Some(Box::new(run));
        self
    }

    pub fn with_command(mut self, child: Command) -> Self {
        self.children.push(child);
        self
    }

    /// Declares a flag and returns the shared handle, so the host can read
    /// the parsed value after execution.
    pub fn add_flag(&mut self, flag: Flag) -> FlagRef {
        let flag = Rc::new(flag);
        self.flags.push(Rc::clone(&flag));
        flag
    }

    /// Declares an already shared flag.
    pub fn add_flag_ref(&mut self, flag: FlagRef) {
        self.flags.push(flag);
    }

    /// Adds a child command and returns it for further wiring.
    pub fn add_command(&mut self, child: Command) -> &mut Command {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Flags declared directly on this command.
    pub fn flags(&self) -> &[FlagRef] {
        &self.flags
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn children(&self) -> &[Command] {
        &self.children
    }

    pub fn has_run(&self) -> bool {
        self.run.is_some()
    }

    /// Direct child with exactly this name.
    pub fn find_child(&self, name: &str) -> Option<&Command> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Injects the built-in `help`/`h` boolean flag, once per root.
    pub fn init_help_flag(&mut self) {
        if self.help_injected {
            return;
        }
        self.flags.push(Rc::new(
            Flag::bool(HELP_FLAG, false)
                .with_short(HELP_SHORT)
                .with_usage("show help message"),
        ));
        self.help_injected = true;
    }

    /// Resolves, parses and runs `args` against this command as root.
    pub fn exec<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.exec_with(Cancellation::new(), args)
    }

    /// Like [`exec`](Command::exec), handing `cancellation` to the handler.
    ///
    /// Element 0 of `args` is replaced by this command's name before
    /// resolution. A help request returns `Ok(())` without running the
    /// handler.
    pub fn exec_with<I>(&mut self, cancellation: Cancellation, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.init_help_flag();

        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        if let Some(first) = args.first_mut() {
            first.clone_from(&self.name);
        }

        let resolution = self.find(&args)?;
        let mut ctx = Context::new(resolution.path()).with_cancellation(cancellation);
        match ctx.parse(resolution.residual()) {
            Ok(()) => {}
            Err(ParseError::HelpRequested) => return Ok(()),
            Err(err) => return Err(err.into()),
        }

        match &ctx.command().run {
            Some(run) => run(&ctx).map_err(Error::Handler),
            None => Ok(()),
        }
    }

    /// Finds the deepest command named by the leading non-flag tokens.
    ///
    /// `args[0]` must be this command's name. Tokens starting with `-` and
    /// tokens that name no child of the current command are kept as
    /// residual tokens. A `--` token stops the scan; it and everything after
    /// it are kept verbatim for the tokenizer.
    pub fn find(&self, args: &[String]) -> std::result::Result<Resolution<'_>, ParseError> {
        if args.is_empty() {
            return Ok(Resolution {
                path: vec![self],
                residual: Vec::new(),
            });
        }

        let mut path: Vec<&Command> = Vec::new();
        let mut residual = Vec::with_capacity(args.len());

        for (i, arg) in args.iter().enumerate() {
            if arg == "--" {
                residual.extend_from_slice(&args[i..]);
                break;
            }
            if arg.starts_with('-') {
                residual.push(arg.clone());
                continue;
            }
            let next = match path.last() {
                None => (arg == &self.name).then_some(self),
                Some(&cmd) => cmd.find_child(arg),
            };
            match next {
                Some(cmd) => path.push(cmd),
                // a flag's value, e.g. "4" in `app --thread 4 download`
                None => residual.push(arg.clone()),
            }
        }

        if path.is_empty() {
            return Err(ParseError::RootMismatch {
                expected: self.name.clone(),
            });
        }

        debug!(
            command = %command_path(&path),
            residual = residual.len(),
            "Resolved command"
        );
        Ok(Resolution { path, residual })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("flags", &self.flags)
            .field("options", &self.options)
            .field("run", &self.run.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Result of [`Command::find`].
#[derive(Debug)]
pub struct Resolution<'a> {
    path: Vec<&'a Command>,
    residual: Vec<String>,
}

impl<'a> Resolution<'a> {
    /// The resolved command.
    pub fn command(&self) -> &'a Command {
        // `find` never builds an empty path
        self.path[self.path.len() - 1]
    }

    /// Commands from the root down to the resolved command.
    pub fn path(&self) -> &[&'a Command] {
        &self.path
    }

    /// Tokens left for the tokenizer.
    pub fn residual(&self) -> &[String] {
        &self.residual
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn tree() -> Command {
        Command::new("app")
            .with_flag(Flag::int("thread", 2))
            .with_command(Command::new("upload"))
            .with_command(
                Command::new("download").with_command(Command::new("resume")),
            )
    }

    fn names(resolution: &Resolution<'_>) -> Vec<String> {
        resolution
            .path()
            .iter()
            .map(|cmd| cmd.name().to_string())
            .collect()
    }

    #[test]
    fn test_find_empty_args_returns_root() {
        let root = tree();
        let resolution = root.find(&[]).unwrap();
        assert_eq!(resolution.command().name(), "app");
        assert!(resolution.residual().is_empty());
    }

    #[test]
    fn test_find_descends_greedily() {
        let root = tree();
        let resolution = root
            .find(&argv(&["app", "download", "resume", "file"]))
            .unwrap();
        assert_eq!(names(&resolution), ["app", "download", "resume"]);
        assert_eq!(resolution.residual(), ["file"]);
    }

    #[test]
    fn test_find_flag_value_is_residual() {
        let root = tree();
        let resolution = root
            .find(&argv(&["app", "--thread", "4", "download"]))
            .unwrap();
        assert_eq!(resolution.command().name(), "download");
        assert_eq!(resolution.residual(), ["--thread", "4"]);
    }

    #[test]
    fn test_find_siblings_unreachable_after_descent() {
        let root = tree();
        let resolution = root.find(&argv(&["app", "download", "upload"])).unwrap();
        assert_eq!(resolution.command().name(), "download");
        assert_eq!(resolution.residual(), ["upload"]);
    }

    #[test]
    fn test_find_stops_at_double_dash() {
        let root = tree();
        let resolution = root
            .find(&argv(&["app", "--", "download", "-x"]))
            .unwrap();
        assert_eq!(resolution.command().name(), "app");
        assert_eq!(resolution.residual(), ["--", "download", "-x"]);
    }

    #[test]
    fn test_find_exact_match_only() {
        let root = tree();
        let resolution = root.find(&argv(&["app", "down"])).unwrap();
        assert_eq!(resolution.command().name(), "app");
        assert_eq!(resolution.residual(), ["down"]);
    }

    #[test]
    fn test_find_rejects_foreign_root() {
        let root = tree();
        let err = root.find(&argv(&["other", "download"])).unwrap_err();
        assert_eq!(
            err,
            ParseError::RootMismatch {
                expected: "app".to_string()
            }
        );
    }

    #[test]
    fn test_help_flag_injected_once() {
        let mut root = tree();
        root.exec(["ignored"]).unwrap();
        root.exec(["ignored"]).unwrap();
        let helps = root
            .flags()
            .iter()
            .filter(|flag| flag.name() == HELP_FLAG)
            .count();
        assert_eq!(helps, 1);
    }

    #[test]
    fn test_exec_overwrites_program_name_and_runs_handler() {
        let ran = Rc::new(Cell::new(false));
        let seen = Rc::clone(&ran);
        let mut root = Command::new("app").with_command(Command::new("sync").with_run(
            move |ctx| {
                assert_eq!(ctx.command().name(), "sync");
                seen.set(true);
                Ok(())
            },
        ));

        root.exec(["/usr/bin/whatever", "sync"]).unwrap();
        assert!(ran.get());
    }

    #[test]
    fn test_exec_help_skips_handler() {
        let ran = Rc::new(Cell::new(false));
        let seen = Rc::clone(&ran);
        let mut root = Command::new("app").with_run(move |_| {
            seen.set(true);
            Ok(())
        });

        root.exec(["app", "-h"]).unwrap();
        assert!(!ran.get());
    }

    #[test]
    fn test_exec_handler_error_is_wrapped() {
        let mut root = Command::new("app").with_run(|_| Err("boom".into()));
        let err = root.exec(["app"]).unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(err.to_string(), "command failed: boom");
    }

    #[test]
    fn test_exec_passes_cancellation() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let mut root = Command::new("app").with_run(|ctx| {
            if ctx.cancellation().is_cancelled() {
                Err("cancelled".into())
            } else {
                Ok(())
            }
        });
        assert!(root.exec_with(cancel, ["app"]).is_err());
    }
}
