use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// Execution-layer exit requested for a single validator.
///
/// `amount_gwei == 0` means a full exit and must be confirmed explicitly with
/// `confirm_full_exit`; a non-zero amount is a partial withdrawal and must not
/// carry the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRequest {
    pub amount_gwei: u64,
    pub confirm_full_exit: bool,
}

impl ExitRequest {
    pub const fn full() -> Self {
        Self {
            amount_gwei: 0,
            confirm_full_exit: true,
        }
    }

    pub const fn partial(amount_gwei: u64) -> Self {
        Self {
            amount_gwei,
            confirm_full_exit: false,
        }
    }

    pub const fn is_full_exit(&self) -> bool {
        self.amount_gwei == 0
    }

    /// Checks that the amount and the confirmation flag agree.
    pub fn check(&self, key: &str) -> Result<(), ValidationError> {
        match (self.amount_gwei, self.confirm_full_exit) {
            (0, true) => Ok(()),
            (0, false) => Err(ValidationError::ZeroAmountWithoutConfirmation {
                key: key.to_owned(),
            }),
            (amount_gwei, true) => Err(ValidationError::ConfirmationWithNonZeroAmount {
                key: key.to_owned(),
                amount_gwei,
            }),
            (_, false) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn flag_must_match_amount() {
        assert!(ExitRequest::full().check("k").is_ok());
        assert!(ExitRequest::partial(1_000_000_000).check("k").is_ok());
        assert_matches!(
            ExitRequest::partial(0).check("k"),
            Err(ValidationError::ZeroAmountWithoutConfirmation { .. })
        );
        assert_matches!(
            ExitRequest {
                amount_gwei: 32,
                confirm_full_exit: true
            }
            .check("k"),
            Err(ValidationError::ConfirmationWithNonZeroAmount { amount_gwei: 32, .. })
        );
    }

    #[test]
    fn accepted_requests_satisfy_invariant() {
        let candidates = [0u64, 1, 32_000_000_000, u64::MAX];
        for amount_gwei in candidates {
            for confirm_full_exit in [false, true] {
                let request = ExitRequest {
                    amount_gwei,
                    confirm_full_exit,
                };
                if request.check("k").is_ok() {
                    assert_eq!(request.amount_gwei == 0, request.confirm_full_exit);
                }
            }
        }
    }

    #[test]
    fn deserializes_camel_case() {
        let request: ExitRequest =
            serde_json::from_str(r#"{"amountGwei": 0, "confirmFullExit": true}"#).unwrap();
        assert_eq!(request, ExitRequest::full());
    }
}
