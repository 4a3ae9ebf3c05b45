//! `devsetup` binary entry point.
use anyhow::Result;
use clap::{CommandFactory as _, Parser};
use std::sync::Arc;

use devsetup_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    match args.command {
        cli::Command::Install(ref opts) => {
            logging::init_subscriber(args.verbose, logging::ConsoleTarget::Terminal, "install");
            let log = Arc::new(logging::Logger::new("install"));
            commands::install::run(&args.global, opts, &log)
        }
        cli::Command::Verify(ref opts) => {
            let console = if opts.json {
                logging::ConsoleTarget::Stderr
            } else {
                logging::ConsoleTarget::Terminal
            };
            logging::init_subscriber(args.verbose, console, "verify");
            let log = Arc::new(logging::Logger::new("verify"));
            commands::verify::run(&args.global, opts, &log)
        }
        cli::Command::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut cli::Cli::command(),
                "devsetup",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        cli::Command::Version => {
            let version = option_env!("DEVSETUP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            #[allow(clippy::print_stdout)]
            {
                println!("devsetup {version}");
            }
            Ok(())
        }
    }
}
