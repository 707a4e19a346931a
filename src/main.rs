mod cli;
mod commands;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::Context;
use kbin::{log_error, logger};

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);

    if let Err(err) = run(cli) {
        if logger::is_debug_enabled() {
            log_error!("error: {:?}", err);
        } else {
            log_error!("error: {:#}", err);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        root,
        os,
        arch,
        command,
        ..
    } = cli;
    let context = |max: Option<usize>, retries: Option<u32>| {
        Context::new(root.as_deref(), os.as_deref(), arch.as_deref(), max, retries)
    };

    match command {
        Commands::Get {
            tool,
            version,
            force,
            max,
            retries,
        } => commands::get::run(&context(max, retries)?, &tool, &version, force),
        Commands::List {
            tool,
            installed,
            max,
        } => commands::list::run(&context(max, None)?, &tool, installed),
        Commands::Rm {
            tool,
            versions,
            purge,
        } => commands::remove::run(&context(None, None)?, &tool, &versions, purge),
        Commands::Current { tool } => commands::current::run(&context(None, None)?, &tool),
        Commands::Tools => {
            commands::tools::run();
            Ok(())
        }
    }
}
