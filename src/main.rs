use apisuite::cmd::{Cli, Command, run_server, run_suite};
use apisuite::log::init_tracing;
use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(Command::Serve { port }) = cli.command {
        run_server(port).await?;
        return Ok(());
    }

    let code = match run_suite(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            1
        }
    };
    std::process::exit(code);
}
