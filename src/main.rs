use clap::Parser;

use budget::cli::{Cli, Command, run_calc};
use budget::config::ServerConfig;
use budget::logging::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve(args) => match ServerConfig::from_args(args) {
            Ok(config) => budget::api::run_http_server(config).await,
            Err(e) => Err(e),
        },
        Command::Calc(args) => run_calc(&args).map(|report| print!("{report}")),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
