use crate::catalog::{run_quote, run_search, QuoteArgs, SearchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rentease::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "RentEase",
    about = "Run the RentEase rental marketplace service or query listings offline",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the interest and video request fees charged for a rent
    Quote(QuoteArgs),
    /// Search a JSON export of listings the way the public listing page does
    Search(SearchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_quote(args),
        Command::Search(args) => run_search(args),
    }
}
