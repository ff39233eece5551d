use anyhow::Context;
use pectra_batch_l1_sender::payload::exit_amount;
use pectra_batch_types::{ExitRequest, Operation};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;

/// Operations file: network endpoints plus one section per operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationsFile {
    pub rpc_url: String,
    #[serde(default)]
    pub block_explorer_url: Option<String>,
    pub pectra_batch_contract: String,
    #[serde(default)]
    pub switch: SwitchSection,
    #[serde(default)]
    pub consolidate: ConsolidateSection,
    #[serde(default)]
    pub el_exit: ElExitSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchSection {
    #[serde(default)]
    pub validators: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidateSection {
    #[serde(default)]
    pub source_validators: Vec<String>,
    #[serde(default)]
    pub target_validator: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElExitSection {
    /// Exit details keyed by validator public key, in file order.
    #[serde(default, deserialize_with = "ordered_entries")]
    pub validators: Vec<(String, ElExitDetails)>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElExitDetails {
    /// Gwei; zero requests a full exit.
    #[serde(default)]
    pub amount: Option<serde_json::Number>,
    #[serde(default)]
    pub confirm_full_exit: bool,
}

/// Operation requested on the command line, before its section is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Switch,
    Consolidate,
    Exit,
    UnsetCode,
}

impl OperationsFile {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open config file {}", path.display()))?;
        let config: Self = serde_json::from_reader(file)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.rpc_url.trim().is_empty(),
            "rpcUrl is required in the configuration"
        );
        anyhow::ensure!(
            !self.pectra_batch_contract.trim().is_empty(),
            "pectraBatchContract is required in the configuration"
        );
        Ok(())
    }

    pub fn batch_contract(&self) -> anyhow::Result<alloy::primitives::Address> {
        self.pectra_batch_contract
            .trim()
            .parse()
            .with_context(|| format!("invalid pectraBatchContract {}", self.pectra_batch_contract))
    }

    /// Builds the validated operation from the matching section only.
    pub fn operation(&self, kind: OperationKind) -> anyhow::Result<Operation> {
        let operation = match kind {
            OperationKind::Switch => Operation::switch(&self.switch.validators)?,
            OperationKind::Consolidate => Operation::consolidate(
                &self.consolidate.source_validators,
                self.consolidate.target_validator.trim(),
            )?,
            OperationKind::Exit => {
                let entries = self
                    .el_exit
                    .validators
                    .iter()
                    .map(|(key, details)| -> anyhow::Result<(&str, ExitRequest)> {
                        let amount_gwei = match &details.amount {
                            Some(amount) => exit_amount(key, amount)?,
                            None => 0,
                        };
                        Ok((
                            key.as_str(),
                            ExitRequest {
                                amount_gwei,
                                confirm_full_exit: details.confirm_full_exit,
                            },
                        ))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;
                Operation::exit(&entries)?
            }
            OperationKind::UnsetCode => Operation::unset_code(),
        };
        Ok(operation)
    }
}

fn ordered_entries<'de, D>(deserializer: D) -> Result<Vec<(String, ElExitDetails)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, ElExitDetails)>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map from validator public key to exit details")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}
