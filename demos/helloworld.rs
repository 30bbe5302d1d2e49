//! Smallest possible host program: one root command, one positional.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p argtree-demos --example helloworld -- world
//! ```

use std::process::ExitCode;

use argtree_core::Command;

fn main() -> ExitCode {
    let mut root = Command::new("hello")
        .with_usage("A helloworld command line app.")
        .with_arg("name")
        .with_run(|ctx| {
            let name = ctx.args().first().ok_or("missing <name>")?;
            println!("Hello, {name}");
            Ok(())
        });

    match root.exec(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
