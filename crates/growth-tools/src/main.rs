use clap::Parser;
use tracing_subscriber::EnvFilter;

use growth_tools::cli::{Cli, Commands};
use growth_tools::{extract_cmd, show_cmd, summary_cmd};

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Show { file } => show_cmd::run(file),
        Commands::Extract(args) => extract_cmd::run(args),
        Commands::Summary { file } => summary_cmd::run(file),
    };

    match result {
        Ok(text) => print!("{text}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
