use gatecheck_cli::{args, run, CliArgs};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = args::command().get_matches();
    run(CliArgs::from_matches(&matches)).await.into()
}
