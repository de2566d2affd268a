//! Core types used throughout the system
//!
//! Identifiers shared by the account ledger, the TCC engine and the
//! transaction store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account ID - business key of an account.
///
/// # Constraints:
/// - **Immutable**: Once assigned, NEVER changes
/// - **Positive**: `0` is reserved for "no account" (see [`NO_ACCOUNT`])
/// - Distinct from the storage row id
pub type AccountId = i64;

/// Placeholder party id stored on empty-rollback fund movements.
pub const NO_ACCOUNT: AccountId = 0;

/// Transaction ID - ULID generated by the orchestrator.
///
/// Using ULID provides:
/// - Time-sortable IDs (expiry scans read roughly in creation order)
/// - No coordination between orchestrator instances
/// - Independence from any store's autoincrement id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(ulid::Ulid);

impl TransactionId {
    /// Generate a new unique TransactionId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for TransactionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_parse_display() {
        let id = TransactionId::new();
        let parsed: TransactionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_transaction_id_rejects_garbage() {
        assert!("not-a-ulid".parse::<TransactionId>().is_err());
    }

    #[test]
    fn test_transaction_id_json() {
        let id = TransactionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
