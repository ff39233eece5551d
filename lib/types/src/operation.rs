use crate::pubkey::normalize;
use crate::{ExitRequest, ValidationError, ValidatorPubkey};
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

/// Batch contract limit for `batchSwitch`.
pub const MAX_SWITCH_VALIDATORS: usize = 200;
/// Batch contract limit for source validators of `batchConsolidation`.
pub const MAX_CONSOLIDATION_SOURCES: usize = 63;
/// Batch contract limit for `batchELExit`.
pub const MAX_EXIT_VALIDATORS: usize = 200;

/// A validated batch operation.
///
/// Values are built through the validating constructors ([`Operation::switch`],
/// [`Operation::consolidate`], [`Operation::exit`], [`Operation::unset_code`]);
/// validator lists are deduplicated and within the batch contract's limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Switch withdrawal credentials of validators from 0x01 to 0x02.
    Switch { validators: Vec<ValidatorPubkey> },
    /// Consolidate `sources` into `target`.
    Consolidate {
        sources: Vec<ValidatorPubkey>,
        target: ValidatorPubkey,
    },
    /// Partial or full execution-layer exits, in input order.
    Exit {
        entries: Vec<(ValidatorPubkey, ExitRequest)>,
    },
    /// Remove the delegation previously installed on the sender's account.
    UnsetCode,
}

impl Operation {
    pub const SWITCH: &'static str = "switch";
    pub const CONSOLIDATE: &'static str = "consolidate";
    pub const EXIT: &'static str = "el-exit";
    pub const UNSET_CODE: &'static str = "unset-code";

    pub fn switch<S: AsRef<str>>(validators: &[S]) -> Result<Self, ValidationError> {
        let validators = dedup_preserving_order(validators);
        if validators.is_empty() {
            return Err(ValidationError::Empty {
                operation: Self::SWITCH,
            });
        }
        check_limit(Self::SWITCH, MAX_SWITCH_VALIDATORS, validators.len())?;
        Ok(Self::Switch {
            validators: parse_all(&validators)?,
        })
    }

    pub fn consolidate<S: AsRef<str>>(sources: &[S], target: &str) -> Result<Self, ValidationError> {
        let sources = dedup_preserving_order(sources);
        if sources.is_empty() || target.is_empty() {
            return Err(ValidationError::Empty {
                operation: Self::CONSOLIDATE,
            });
        }
        check_limit(Self::CONSOLIDATE, MAX_CONSOLIDATION_SOURCES, sources.len())?;
        let sources = parse_all(&sources)?;
        let target_key: ValidatorPubkey = target.parse()?;
        if sources.contains(&target_key) {
            return Err(ValidationError::TargetAmongSources {
                target: target.to_owned(),
            });
        }
        Ok(Self::Consolidate {
            sources,
            target: target_key,
        })
    }

    /// Builds an exit operation. Entries repeating an earlier key with the
    /// same request are dropped; repeating it with a different request is an
    /// error.
    pub fn exit<S: AsRef<str>>(entries: &[(S, ExitRequest)]) -> Result<Self, ValidationError> {
        let mut seen: HashMap<String, ExitRequest> = HashMap::with_capacity(entries.len());
        let mut unique = Vec::with_capacity(entries.len());
        for (raw, request) in entries {
            let raw = raw.as_ref();
            match seen.get(&normalize(raw)) {
                Some(previous) if previous == request => continue,
                Some(_) => {
                    return Err(ValidationError::ConflictingExitRequests {
                        key: raw.to_owned(),
                    });
                }
                None => {
                    seen.insert(normalize(raw), *request);
                    unique.push((raw, *request));
                }
            }
        }
        if unique.is_empty() {
            return Err(ValidationError::Empty {
                operation: Self::EXIT,
            });
        }
        check_limit(Self::EXIT, MAX_EXIT_VALIDATORS, unique.len())?;

        let entries = unique
            .into_iter()
            .map(|(raw, request)| {
                let key: ValidatorPubkey = raw.parse()?;
                request.check(raw)?;
                Ok((key, request))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        Ok(Self::Exit { entries })
    }

    pub const fn unset_code() -> Self {
        Self::UnsetCode
    }

    /// Command name of the operation.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Switch { .. } => Self::SWITCH,
            Self::Consolidate { .. } => Self::CONSOLIDATE,
            Self::Exit { .. } => Self::EXIT,
            Self::UnsetCode => Self::UNSET_CODE,
        }
    }

    /// Number of validators the batch contract charges a fee for.
    pub fn validator_count(&self) -> usize {
        match self {
            Self::Switch { validators } => validators.len(),
            Self::Consolidate { sources, .. } => sources.len(),
            Self::Exit { entries } => entries.len(),
            Self::UnsetCode => 0,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consolidate { sources, target } => {
                write!(f, "consolidate {} validators into {target}", sources.len())
            }
            Self::UnsetCode => f.write_str("unset-code"),
            other => write!(f, "{} for {} validators", other.name(), other.validator_count()),
        }
    }
}

/// Removes repeated keys, comparing the normalized form and keeping the first
/// occurrence in input order.
pub fn dedup_preserving_order<S: AsRef<str>>(raw: &[S]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.iter()
        .map(AsRef::as_ref)
        .filter(|key| seen.insert(normalize(key)))
        .collect()
}

fn check_limit(operation: &'static str, limit: usize, actual: usize) -> Result<(), ValidationError> {
    if actual > limit {
        return Err(ValidationError::TooManyValidators {
            operation,
            limit,
            actual,
        });
    }
    Ok(())
}

fn parse_all(raw: &[&str]) -> Result<Vec<ValidatorPubkey>, ValidationError> {
    raw.iter().map(|key| key.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Deterministic, distinct 96-character keys.
    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{:096x}", i + 1)).collect()
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let a = "aa".repeat(48);
        let b = "bb".repeat(48);
        let raw = vec![
            b.clone(),
            a.clone(),
            format!("0x{b}"),
            b.to_ascii_uppercase(),
            a.clone(),
        ];
        assert_eq!(dedup_preserving_order(&raw), vec![b.as_str(), a.as_str()]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut raw = keys(5);
        raw.extend(keys(3));
        raw.push(format!("0x{}", keys(1)[0]));

        let once: Vec<String> = dedup_preserving_order(&raw)
            .into_iter()
            .map(str::to_owned)
            .collect();
        let twice = dedup_preserving_order(&once);
        assert_eq!(once, twice);

        assert_eq!(
            Operation::switch(&raw).unwrap(),
            Operation::switch(&once).unwrap()
        );
    }

    #[test]
    fn switch_limit_is_exact() {
        assert_matches!(
            Operation::switch(&keys(MAX_SWITCH_VALIDATORS)),
            Ok(Operation::Switch { validators }) if validators.len() == 200
        );
        assert_matches!(
            Operation::switch(&keys(MAX_SWITCH_VALIDATORS + 1)),
            Err(ValidationError::TooManyValidators {
                limit: 200,
                actual: 201,
                ..
            })
        );
    }

    #[test]
    fn duplicates_do_not_count_towards_the_limit() {
        let mut raw = keys(MAX_SWITCH_VALIDATORS);
        raw.push(raw[0].clone());
        assert!(Operation::switch(&raw).is_ok());
    }

    #[test]
    fn switch_rejects_empty_and_malformed() {
        let empty: Vec<String> = vec![];
        assert_matches!(
            Operation::switch(&empty),
            Err(ValidationError::Empty { operation: "switch" })
        );
        assert_matches!(
            Operation::switch(&["0x1234"]),
            Err(ValidationError::PubkeyLength { actual: 4, .. })
        );
    }

    #[test]
    fn consolidation_limit_is_exact() {
        let target = format!("{:096x}", 10_000);
        assert!(Operation::consolidate(&keys(MAX_CONSOLIDATION_SOURCES), &target).is_ok());
        assert_matches!(
            Operation::consolidate(&keys(MAX_CONSOLIDATION_SOURCES + 1), &target),
            Err(ValidationError::TooManyValidators {
                limit: 63,
                actual: 64,
                ..
            })
        );
    }

    #[test]
    fn consolidation_rejects_target_among_sources() {
        let sources = keys(3);
        let target = format!("0x{}", sources[1].to_ascii_uppercase());
        assert_matches!(
            Operation::consolidate(&sources, &target),
            Err(ValidationError::TargetAmongSources { .. })
        );
        assert_matches!(
            Operation::consolidate(&sources, ""),
            Err(ValidationError::Empty { operation: "consolidate" })
        );
    }

    #[test]
    fn exit_checks_flags_and_conflicts() {
        let k = keys(3);
        let ok = Operation::exit(&[
            (k[0].clone(), ExitRequest::full()),
            (k[1].clone(), ExitRequest::partial(1_000_000_000)),
            (format!("0x{}", k[0]), ExitRequest::full()),
        ])
        .unwrap();
        assert_eq!(ok.validator_count(), 2);

        assert_matches!(
            Operation::exit(&[(k[2].clone(), ExitRequest::partial(0))]),
            Err(ValidationError::ZeroAmountWithoutConfirmation { .. })
        );
        assert_matches!(
            Operation::exit(&[
                (k[0].clone(), ExitRequest::full()),
                (k[0].clone(), ExitRequest::partial(5)),
            ]),
            Err(ValidationError::ConflictingExitRequests { .. })
        );
    }

    #[test]
    fn exit_limit_is_exact() {
        let entries = |n| {
            keys(n)
                .into_iter()
                .map(|k| (k, ExitRequest::partial(1)))
                .collect::<Vec<_>>()
        };
        assert!(Operation::exit(&entries(MAX_EXIT_VALIDATORS)).is_ok());
        assert_matches!(
            Operation::exit(&entries(MAX_EXIT_VALIDATORS + 1)),
            Err(ValidationError::TooManyValidators { actual: 201, .. })
        );
    }

    #[test]
    fn exit_preserves_input_order() {
        let k = keys(3);
        let op = Operation::exit(&[
            (k[2].clone(), ExitRequest::partial(3)),
            (k[0].clone(), ExitRequest::partial(1)),
            (k[1].clone(), ExitRequest::partial(2)),
        ])
        .unwrap();
        let Operation::Exit { entries } = op else {
            panic!("expected exit operation");
        };
        let amounts: Vec<u64> = entries.iter().map(|(_, r)| r.amount_gwei).collect();
        assert_eq!(amounts, vec![3, 1, 2]);
    }
}
