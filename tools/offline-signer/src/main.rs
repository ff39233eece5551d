//! Signs transactions written by `pectra-cli --airgapped`.
//!
//! Meant to run on an offline machine: it reads the unsigned file, signs the
//! delegation and the transaction, and writes the signed file. It never
//! connects to a network.

use std::convert::Infallible;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pectra_batch_l1_sender::signer::parse_private_key;
use pectra_batch_l1_sender::{SenderConfig, sign_transfer_file};
use pectra_batch_observability::{LogFormat, init_logs};
use secrecy::SecretString;

#[derive(Parser)]
#[command(author, version, about = "Sign an unsigned pectra-cli transaction offline", long_about = None)]
struct Args {
    /// Unsigned transaction file (defaults to unsigned_txn.json)
    file: Option<PathBuf>,
    /// Where to write the signed transaction (defaults to signed_txn.json)
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Private key of the sender
    #[arg(long, env = "PECTRA_PRIVATE_KEY", hide_env_values = true, value_parser = parse_secret)]
    private_key: SecretString,
    #[arg(long, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

fn parse_secret(raw: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::from(raw.to_owned()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logs(args.log_format)?;

    let defaults = SenderConfig::default();
    let input = args.file.unwrap_or_else(|| defaults.unsigned_tx_path.into());
    let output = args.output.unwrap_or_else(|| defaults.signed_tx_path.into());

    let signer = parse_private_key(&args.private_key)?;
    let signed = sign_transfer_file(&signer, &input, &output)
        .with_context(|| format!("failed to sign {}", input.display()))?;
    tracing::info!(
        tx_hash = %signed.hash(),
        sender = %signer.address(),
        "signed transaction, broadcast it with `pectra-cli broadcast -f {}`",
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn defaults_apply_without_positional_file() {
        Args::command().debug_assert();
        let args = Args::try_parse_from(["pectra-offline-signer", "--private-key", "0x01"]).unwrap();
        assert!(args.file.is_none());
        assert!(args.output.is_none());
    }
}
