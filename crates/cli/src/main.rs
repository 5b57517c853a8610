use std::process::ExitCode;

use clap::Parser;

use odata_sql_cli::{run, Command};
use odata_sql_configuration::environment::ProcessEnvironment;

/// Compile entity requests to SQL, and fold result rows back into entities.
#[derive(Parser)]
#[command(name = "odata-sql", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(args.command, ProcessEnvironment).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
