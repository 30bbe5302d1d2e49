//! Command trees and flag parsing for command-line programs.
//!
//! This crate resolves which command an argument vector targets and parses
//! the remaining tokens into typed flag values and positional arguments:
//!
//! - [`Command`] — a node of the command tree, with its flags, declared
//!   positional names, children and an optional run handler.
//! - [`Flag`] — a named option (`--name`, optional `-c` alias) holding a
//!   [`Value`]. Flags marked persistent are inherited by descendants; root
//!   flags are always inherited.
//! - [`Value`] — the typed-value contract, implemented by [`StringValue`],
//!   [`IntValue`], [`BoolValue`] and [`IpValue`].
//! - [`Context`] — the per-invocation parse state handed to run handlers.
//!
//! Trees can also be described as data with [`CommandSchema`] and checked
//! with [`validate_schema`] before being built.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use argtree_core::{Command, Flag};
//!
//! let seen = Rc::new(Cell::new(0));
//! let record = Rc::clone(&seen);
//!
//! let mut root = Command::new("app")
//!     .with_flag(Flag::int("count", 0).with_short('c'))
//!     .with_command(Command::new("sync").with_run(move |ctx| {
//!         record.set(ctx.int("count"));
//!         assert_eq!(ctx.args(), ["x"]);
//!         Ok(())
//!     }));
//!
//! root.exec(["app", "sync", "-c", "5", "x"]).unwrap();
//! assert_eq!(seen.get(), 5);
//! ```

mod command;
mod context;
mod error;
mod flag;
mod help;
mod schema;
mod validate;
mod value;

pub use command::{Cancellation, Command, HELP_FLAG, HELP_SHORT, Options, Resolution, RunFn};
pub use context::Context;
pub use error::{BoxError, Error, ParseError, Result, SchemaError};
pub use flag::{Flag, FlagRef};
pub use help::{command_path, render_help, write_help};
pub use schema::{CommandSchema, FlagSchema, SchemaOptions, ValueKind};
pub use validate::{ValidationError, validate_schema};
pub use value::{
    BOOL_TYPE, BoolValue, INT_TYPE, IP_TYPE, IntValue, IpValue, STRING_TYPE, StringValue, Value,
    ValueError,
};
