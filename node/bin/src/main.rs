use clap::Parser;
use pectra_batch_cli::cli::{Cli, run};
use pectra_batch_observability::init_logs;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logs(cli.log_format)?;
    run(cli.command)
        .await
        .inspect_err(|err| tracing::error!("{err:#}"))
}
