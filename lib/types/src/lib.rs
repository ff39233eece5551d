//! Validated inputs of the batch validator operations: validator public keys,
//! exit requests, operations and the sender address used in airgapped mode.

mod address;
mod error;
mod exit;
mod operation;
mod pubkey;

pub use address::parse_sender_address;
pub use error::ValidationError;
pub use exit::ExitRequest;
pub use operation::{
    MAX_CONSOLIDATION_SOURCES, MAX_EXIT_VALIDATORS, MAX_SWITCH_VALIDATORS, Operation,
    dedup_preserving_order,
};
pub use pubkey::{PUBKEY_HEX_LENGTH, PUBKEY_LENGTH, ValidatorPubkey};
