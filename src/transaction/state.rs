//! Transaction Status Definitions
//!
//! Status IDs are stored as SMALLINT in `transactions_tb`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transaction status
///
/// ```text
/// PENDING ──▶ PROCESSING ──▶ FULFILLED | REFUNDED | FAILED
///    └────────────────────────▲
/// ```
/// Terminal: FULFILLED (3), REFUNDED (4), FAILED (5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum TransactionStatus {
    /// Persisted, Try not yet acknowledged
    Pending = 1,
    /// Try succeeded, Confirm not yet acknowledged
    Processing = 2,
    /// Terminal: destination credited
    Fulfilled = 3,
    /// Terminal: compensated after Confirm was refused
    Refunded = 4,
    /// Terminal: Try rejected, timed out or expired
    Failed = 5,
}

const TERMINAL: [TransactionStatus; 3] = [
    TransactionStatus::Fulfilled,
    TransactionStatus::Refunded,
    TransactionStatus::Failed,
];

impl TransactionStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        TERMINAL.contains(self)
    }

    /// Position in the forward-only order; terminal statuses share the top rank
    fn rank(&self) -> u8 {
        match self {
            TransactionStatus::Pending => 0,
            TransactionStatus::Processing => 1,
            _ => 2,
        }
    }

    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        next.rank() > self.rank()
    }

    /// Statuses a CAS write of `self` may replace
    pub fn predecessors(&self) -> &'static [TransactionStatus] {
        match self {
            TransactionStatus::Pending => &[],
            TransactionStatus::Processing => &[TransactionStatus::Pending],
            _ => &[TransactionStatus::Pending, TransactionStatus::Processing],
        }
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransactionStatus::Pending),
            2 => Some(TransactionStatus::Processing),
            3 => Some(TransactionStatus::Fulfilled),
            4 => Some(TransactionStatus::Refunded),
            5 => Some(TransactionStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Fulfilled => "FULFILLED",
            TransactionStatus::Refunded => "REFUNDED",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransactionStatus::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(Fulfilled.is_terminal());
        assert!(Refunded.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Processing.is_terminal());
    }

    #[test]
    fn test_transitions_are_forward_only() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Fulfilled));
        assert!(Processing.can_transition_to(Refunded));

        assert!(!Processing.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Processing));
        assert!(!Fulfilled.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Processing));
    }

    #[test]
    fn test_predecessors_match_transitions() {
        let all = [Pending, Processing, Fulfilled, Refunded, Failed];
        for from in all {
            for to in all {
                assert_eq!(
                    to.predecessors().contains(&from),
                    from.can_transition_to(to),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_status_ids() {
        for status in [Pending, Processing, Fulfilled, Refunded, Failed] {
            assert_eq!(TransactionStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(TransactionStatus::from_id(0), None);
        assert_eq!(Refunded.id(), 4);
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        assert_eq!(serde_json::to_string(&Processing).unwrap(), "\"PROCESSING\"");
        assert_eq!(Failed.to_string(), "FAILED");
    }
}
