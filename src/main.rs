use clap::Parser;
use rusty_todo_lists::cli::Cli;
use rusty_todo_lists::commands;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = std::io::stdout();
    let stdin = std::io::stdin();
    if let Err(e) = commands::execute(cli, &mut stdout.lock(), &mut stdin.lock()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
