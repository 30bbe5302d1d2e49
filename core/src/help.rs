//! Help text rendering.
//!
//! # Example output
//!
//! ```text
//! download a file
//!
//! Usage:
//!   example download <file> [option]*
//!
//! Available options:
//!   -t, --thread int  specify the number of threads (default 2)
//!
//! Global options:
//!       --address IP  specify an IP address (default 127.0.0.1)
//!   -h, --help        show help message
//!
//! Use "example download [command] --help" for more information about a command.
//! ```

use std::io::{self, Write};

use crate::command::Command;
use crate::context::effective_flags;
use crate::flag::FlagRef;

/// Space-joined names from the root down, e.g. `"app download"`.
pub fn command_path(path: &[&Command]) -> String {
    path.iter()
        .map(|cmd| cmd.name())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders help for the last command of `path` into a string.
pub fn render_help(path: &[&Command]) -> String {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_help(&mut buf, path);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Writes help for the last command of `path`, which runs from the root down.
pub fn write_help<W: Write + ?Sized>(w: &mut W, path: &[&Command]) -> io::Result<()> {
    let Some(cmd) = path.last() else {
        return Ok(());
    };
    let name = command_path(path);
    let flags = effective_flags(path);
    let (own, inherited): (Vec<_>, Vec<_>) = flags.into_iter().partition(|(_, own)| *own);

    let mut out = String::new();
    if !cmd.usage().is_empty() {
        out.push_str(&format!("{}\n\n", cmd.usage()));
    }

    out.push_str(&format!("Usage:\n  {name}"));
    for arg in cmd.args() {
        out.push_str(&format!(" <{arg}>"));
    }
    if !cmd.children().is_empty() {
        out.push_str(" [command]");
    }
    if !own.is_empty() || !inherited.is_empty() {
        out.push_str(" [option]*");
    }
    out.push('\n');

    if !cmd.example().is_empty() {
        out.push_str(&format!("\nExample:\n  {}\n", cmd.example()));
    }

    if !cmd.children().is_empty() {
        out.push_str("\nAvailable commands:\n");
        let rows: Vec<(String, String)> = cmd
            .children()
            .iter()
            .map(|child| (child.name().to_string(), child.usage().to_string()))
            .collect();
        push_table(&mut out, &rows);
    }

    if !own.is_empty() {
        out.push_str("\nAvailable options:\n");
        push_table(&mut out, &flag_rows(own.iter().map(|(flag, _)| flag)));
    }

    if !inherited.is_empty() {
        out.push_str("\nGlobal options:\n");
        push_table(&mut out, &flag_rows(inherited.iter().map(|(flag, _)| flag)));
    }

    out.push_str(&format!(
        "\nUse \"{name} [command] --help\" for more information about a command.\n"
    ));
    w.write_all(out.as_bytes())?;
    w.flush()
}

fn flag_rows<'f>(flags: impl Iterator<Item = &'f FlagRef>) -> Vec<(String, String)> {
    flags
        .map(|flag| {
            let mut left = match flag.short() {
                Some(short) => format!("-{short}, --{}", flag.name()),
                None => format!("    --{}", flag.name()),
            };
            if !flag.is_optional_value() {
                left.push(' ');
                left.push_str(flag.type_name());
            }

            let mut right = flag.usage().to_string();
            let default = flag.value_string();
            if !flag.is_optional_value() && !default.is_empty() {
                right.push_str(&format!(" (default {default})"));
            }
            (left, right)
        })
        .collect()
}

fn push_table(out: &mut String, rows: &[(String, String)]) {
    let width = rows
        .iter()
        .map(|(left, _)| left.chars().count())
        .max()
        .unwrap_or(0);
    for (left, right) in rows {
        let line = format!("  {left:<width$}  {right}");
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use crate::flag::Flag;

    use super::*;

    fn example_tree() -> Command {
        let mut root = Command::new("example")
            .with_usage("A command line app demonstrating subcommands.")
            .with_flag(Flag::ip("address", "127.0.0.1").with_usage("specify an IP address"))
            .with_flag(Flag::bool("verbose", false).with_usage("show tails when running"))
            .with_command(Command::new("upload").with_usage("upload a file"))
            .with_command(
                Command::new("download")
                    .with_usage("download a file")
                    .with_arg("file")
                    .with_flag(
                        Flag::int("thread", 2)
                            .with_short('t')
                            .with_usage("specify the number of threads"),
                    ),
            );
        root.init_help_flag();
        root
    }

    #[test]
    fn test_command_path() {
        let root = example_tree();
        let download = root.find_child("download").unwrap();
        assert_eq!(command_path(&[&root, download]), "example download");
    }

    #[test]
    fn test_root_help() {
        let root = example_tree();
        let help = render_help(&[&root]);
        let expected = "\
A command line app demonstrating subcommands.

Usage:
  example [command] [option]*

Available commands:
  upload    upload a file
  download  download a file

Available options:
      --address IP  specify an IP address (default 127.0.0.1)
      --verbose     show tails when running
  -h, --help        show help message

Use \"example [command] --help\" for more information about a command.
";
        assert_eq!(help, expected);
    }

    #[test]
    fn test_subcommand_help_lists_inherited_flags() {
        let root = example_tree();
        let download = root.find_child("download").unwrap();
        let help = render_help(&[&root, download]);
        let expected = "\
download a file

Usage:
  example download <file> [option]*

Available options:
  -t, --thread int  specify the number of threads (default 2)

Global options:
      --address IP  specify an IP address (default 127.0.0.1)
      --verbose     show tails when running
  -h, --help        show help message

Use \"example download [command] --help\" for more information about a command.
";
        assert_eq!(help, expected);
    }

    #[test]
    fn test_example_section() {
        let root = Command::new("hello")
            .with_arg("name")
            .with_example("hello world");
        let help = render_help(&[&root]);
        assert!(help.contains("Usage:\n  hello <name>\n"));
        assert!(help.contains("\nExample:\n  hello world\n"));
    }
}
