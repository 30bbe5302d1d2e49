//! Host program with global flags and two subcommands.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p argtree-demos --example subcommand -- --address 10.0.0.1
//! cargo run -p argtree-demos --example subcommand -- download -t8 a.txt b.txt
//! cargo run -p argtree-demos --example subcommand -- upload --help
//! RUST_LOG=debug cargo run -p argtree-demos --example subcommand -- -v upload x
//! ```

use std::process::ExitCode;

use argtree_core::{Command, Flag, Options};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let upload = Command::new("upload")
        .with_usage("upload a file")
        .with_arg("file")
        .with_options(Options::UNDEFINED_FLAGS)
        .with_run(|ctx| {
            println!("uploading {:?} (verbose: {})", ctx.args(), ctx.bool("verbose"));
            Ok(())
        });

    let download = Command::new("download")
        .with_usage("download a file")
        .with_arg("file")
        .with_options(Options::EXIT_ON_ERROR)
        .with_flag(
            Flag::int("thread", 2)
                .with_short('t')
                .with_usage("specify the number of threads"),
        )
        .with_run(|ctx| {
            println!(
                "downloading {:?} from {} with {} thread(s)",
                ctx.args(),
                ctx.ip("address").map(|ip| ip.to_string()).unwrap_or_default(),
                ctx.int("thread"),
            );
            Ok(())
        });

    let mut root = Command::new("example")
        .with_usage("A command line app demonstrating subcommands.")
        .with_example("example download -t4 file.txt")
        .with_flag(Flag::ip("address", "127.0.0.1").with_usage("specify an IP address"))
        .with_flag(Flag::int("hash", 53748191).with_usage("specify a hash number"))
        .with_flag(
            Flag::bool("verbose", false)
                .with_short('v')
                .with_usage("show tails when running"),
        )
        .with_run(|ctx| {
            match ctx.ip("address") {
                Some(ip) => println!("{ip}"),
                None => println!("no address"),
            }
            Ok(())
        })
        .with_command(upload)
        .with_command(download);

    match root.exec(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
