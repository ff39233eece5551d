use crate::config::{OperationKind, OperationsFile};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pectra_batch_l1_sender::{Outcome, SenderConfig, SigningMode, broadcast_transfer_file};
use pectra_batch_observability::LogFormat;
use pectra_batch_types::parse_sender_address;
use secrecy::SecretString;
use std::convert::Infallible;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "pectra-cli",
    version,
    about = "Batch validator operations (switch, consolidate, exit) through an EIP-7702 delegated batch contract"
)]
pub struct Cli {
    /// Log output format: plain, json or logfmt. Filtering follows RUST_LOG.
    #[arg(long, global = true, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Switch withdrawal credentials of validators from 0x01 to 0x02.
    Switch(OperationArgs),
    /// Consolidate source validators into a target validator.
    Consolidate(OperationArgs),
    /// Request partial withdrawals or full exits from the execution layer.
    ElExit(OperationArgs),
    /// Remove the delegation from the sender's account.
    UnsetCode(OperationArgs),
    /// Broadcast a transaction signed by the offline signer.
    Broadcast(BroadcastArgs),
}

#[derive(Debug, Args)]
pub struct OperationArgs {
    /// Operations file.
    #[arg(long, short)]
    pub config: PathBuf,
    /// Write the unsigned transaction to a file instead of signing and sending it.
    #[arg(long, short)]
    pub airgapped: bool,
    /// Sender address in airgapped mode.
    #[arg(long, env = "PECTRA_FROM")]
    pub from: Option<String>,
    /// Private key of the sender in online mode.
    #[arg(long, env = "PECTRA_PRIVATE_KEY", hide_env_values = true, value_parser = parse_secret)]
    pub private_key: Option<SecretString>,
    /// Where to write the unsigned transaction in airgapped mode.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct BroadcastArgs {
    /// Signed transaction file produced by the offline signer.
    #[arg(long, short)]
    pub file: PathBuf,
    /// Operations file providing the RPC endpoint.
    #[arg(long, short)]
    pub config: PathBuf,
}

fn parse_secret(raw: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::from(raw.to_owned()))
}

impl OperationArgs {
    fn signing_mode(&self, config: &SenderConfig) -> anyhow::Result<SigningMode> {
        if self.airgapped {
            let from = self
                .from
                .as_deref()
                .context("airgapped mode needs the sender address: pass --from or set PECTRA_FROM")?;
            Ok(SigningMode::Airgapped {
                sender: parse_sender_address(from)?,
                path: self
                    .output
                    .clone()
                    .unwrap_or_else(|| config.unsigned_tx_path.clone().into()),
            })
        } else {
            let key = self
                .private_key
                .as_ref()
                .context("online mode needs a private key: pass --private-key or set PECTRA_PRIVATE_KEY")?;
            Ok(SigningMode::online(key)?)
        }
    }
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    let sender_config = SenderConfig::default();
    match command {
        Command::Switch(args) => execute(OperationKind::Switch, args, &sender_config).await,
        Command::Consolidate(args) => execute(OperationKind::Consolidate, args, &sender_config).await,
        Command::ElExit(args) => execute(OperationKind::Exit, args, &sender_config).await,
        Command::UnsetCode(args) => execute(OperationKind::UnsetCode, args, &sender_config).await,
        Command::Broadcast(args) => broadcast(args, &sender_config).await,
    }
}

async fn execute(
    kind: OperationKind,
    args: OperationArgs,
    sender_config: &SenderConfig,
) -> anyhow::Result<()> {
    let config = OperationsFile::load_from_file(&args.config)?;
    // input is validated before anything touches the network
    let operation = config.operation(kind)?;
    let batch_contract = config.batch_contract()?;
    let mode = args.signing_mode(sender_config)?;
    tracing::info!(airgapped = args.airgapped, "{operation}");

    let provider = connect(&config.rpc_url).await?;
    let outcome = pectra_batch_l1_sender::execute_operation(
        &provider,
        batch_contract,
        &operation,
        &mode,
        config.block_explorer_url.as_deref(),
        sender_config,
    )
    .await?;

    match outcome {
        Outcome::Confirmed(confirmation) => tracing::info!(
            tx_hash = %confirmation.tx_hash,
            block_number = ?confirmation.block_number,
            explorer = confirmation.explorer_link.as_deref().unwrap_or("n/a"),
            "{} completed",
            operation.name()
        ),
        Outcome::UnsignedWritten { path, chain_id } => tracing::info!(
            path = %path.display(),
            chain_id,
            "unsigned transaction written; sign it with pectra-offline-signer, then run `pectra-cli broadcast`"
        ),
    }
    Ok(())
}

async fn broadcast(args: BroadcastArgs, sender_config: &SenderConfig) -> anyhow::Result<()> {
    let config = OperationsFile::load_from_file(&args.config)?;
    let provider = connect(&config.rpc_url).await?;
    let confirmation = broadcast_transfer_file(
        &provider,
        &args.file,
        config.block_explorer_url.as_deref(),
        sender_config,
    )
    .await?;
    tracing::info!(
        tx_hash = %confirmation.tx_hash,
        block_number = ?confirmation.block_number,
        explorer = confirmation.explorer_link.as_deref().unwrap_or("n/a"),
        "broadcast completed"
    );
    Ok(())
}

async fn connect(rpc_url: &str) -> anyhow::Result<DynProvider> {
    let provider = ProviderBuilder::new()
        .connect(rpc_url.trim())
        .await
        .with_context(|| format!("failed to connect to {rpc_url}"))?;
    Ok(provider.erased())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use clap::CommandFactory;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_airgapped_exit() {
        let cli = Cli::try_parse_from([
            "pectra-cli",
            "el-exit",
            "-c",
            "ops.json",
            "-a",
            "--from",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::ElExit(args) = cli.command else {
            panic!("expected el-exit");
        };
        let mode = args.signing_mode(&SenderConfig::default()).unwrap();
        assert_matches!(
            mode,
            SigningMode::Airgapped { path, .. } if path == PathBuf::from("unsigned_txn.json")
        );
    }

    #[test]
    fn online_mode_derives_sender_from_key() {
        let cli = Cli::try_parse_from([
            "pectra-cli",
            "switch",
            "--config",
            "ops.json",
            "--private-key",
            KEY,
        ])
        .unwrap();
        let Command::Switch(args) = cli.command else {
            panic!("expected switch");
        };
        let mode = args.signing_mode(&SenderConfig::default()).unwrap();
        assert_eq!(
            mode.sender().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn airgapped_mode_checks_sender_address() {
        let cli = Cli::try_parse_from([
            "pectra-cli",
            "unset-code",
            "-c",
            "ops.json",
            "--airgapped",
            "--from",
            "0x1234",
            "--output",
            "out.json",
        ])
        .unwrap();
        let Command::UnsetCode(args) = cli.command else {
            panic!("expected unset-code");
        };
        assert!(args.signing_mode(&SenderConfig::default()).is_err());
    }

    #[test]
    fn broadcast_requires_file_and_config() {
        assert!(Cli::try_parse_from(["pectra-cli", "broadcast", "-c", "ops.json"]).is_err());
        assert!(Cli::try_parse_from(["pectra-cli", "broadcast", "-f", "signed_txn.json", "-c", "ops.json"]).is_ok());
    }
}
