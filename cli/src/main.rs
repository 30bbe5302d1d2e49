use std::path::{Path, PathBuf};
use std::process::ExitCode;

use argtree_core::{
    Command as Tree, CommandSchema, Context, ParseError, SchemaError, render_help, validate_schema,
};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod report;

use report::{ParseReport, ResolveReport, format_report};

/// Output format for reports.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argtree")]
#[command(about = "Inspect how arguments resolve and parse against a command schema")]
#[command(version)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a command schema file.
    Validate(SchemaArgs),
    /// Show which command an argument vector targets and the leftover tokens.
    Resolve(InvocationArgs),
    /// Parse an argument vector and show positionals and flag values.
    Parse(InvocationArgs),
    /// Render help for a command of the schema.
    Help(HelpArgs),
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Schema file (.json, .yaml or .yml).
    #[arg(long)]
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct InvocationArgs {
    /// Schema file (.json, .yaml or .yml).
    #[arg(long)]
    schema: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Argument vector to inspect; element 0 stands for the program name.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct HelpArgs {
    /// Schema file (.json, .yaml or .yml).
    #[arg(long)]
    schema: PathBuf,
    /// Subcommand names leading from the root to the command to describe.
    path: Vec<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{0}")]
    Output(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Parse(_) => 2,
            _ => 1,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Resolve(args) => run_resolve(args),
        Command::Parse(args) => run_parse(args),
        Command::Help(args) => run_help(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Loads the schema and builds the tree the way execution would see it.
fn load_tree(path: &Path) -> Result<Tree, CliError> {
    let schema = CommandSchema::from_path(path)?;
    let mut root = schema.build()?;
    root.init_help_flag();
    debug!(schema = %path.display(), root = root.name(), "Loaded command tree");
    Ok(root)
}

/// Replaces element 0 with the root's name, as execution does.
fn invocation(root: &Tree, mut args: Vec<String>) -> Vec<String> {
    if let Some(first) = args.first_mut() {
        *first = root.name().to_string();
    }
    args
}

fn run_validate(args: SchemaArgs) -> Result<(), CliError> {
    let schema = CommandSchema::from_path(&args.schema)?;
    let errors = validate_schema(&schema);
    if !errors.is_empty() {
        return Err(SchemaError::Invalid(errors).into());
    }

    let (commands, flags) = count(&schema);
    println!(
        "Validated schema for {}: {commands} command(s), {flags} flag(s).",
        schema.name
    );
    Ok(())
}

fn count(schema: &CommandSchema) -> (usize, usize) {
    schema
        .commands
        .iter()
        .map(count)
        .fold((1, schema.flags.len()), |(commands, flags), (c, f)| {
            (commands + c, flags + f)
        })
}

fn run_resolve(args: InvocationArgs) -> Result<(), CliError> {
    let root = load_tree(&args.schema)?;
    let argv = invocation(&root, args.args);
    let resolution = root.find(&argv)?;

    let raw = format_report(&ResolveReport::new(&resolution), args.format)
        .map_err(CliError::Output)?;
    println!("{raw}");
    Ok(())
}

fn run_parse(args: InvocationArgs) -> Result<(), CliError> {
    let root = load_tree(&args.schema)?;
    let argv = invocation(&root, args.args);
    let resolution = root.find(&argv)?;

    let mut ctx = Context::new(resolution.path());
    match ctx.parse(resolution.residual()) {
        Ok(()) => {}
        Err(ParseError::HelpRequested) => return Ok(()),
        Err(err) => return Err(err.into()),
    }

    let raw = format_report(&ParseReport::new(&ctx), args.format).map_err(CliError::Output)?;
    println!("{raw}");
    Ok(())
}

fn run_help(args: HelpArgs) -> Result<(), CliError> {
    let root = load_tree(&args.schema)?;

    let mut path = vec![&root];
    for name in &args.path {
        let current: &Tree = path[path.len() - 1];
        let Some(child) = current.find_child(name) else {
            let mut names: Vec<&str> = path.iter().map(|cmd| cmd.name()).collect();
            names.push(name);
            return Err(CliError::UnknownCommand(names.join(" ")));
        };
        path.push(child);
    }

    print!("{}", render_help(&path));
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_subcommand_takes_command_path() {
        let cli = Cli::try_parse_from(["argtree", "help", "--schema", "app.yaml", "download"])
            .unwrap();
        match cli.command {
            Command::Help(args) => {
                assert_eq!(args.schema, PathBuf::from("app.yaml"));
                assert_eq!(args.path, ["download"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
