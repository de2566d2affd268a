//! TCC Engine
//!
//! Try / Confirm / Cancel over account balances. One fund movement row per
//! transaction id is the idempotency anchor: every operation starts with a
//! locking read of that row, so all calls for the same transaction are
//! linearized no matter how many callers retry concurrently.
//!
//! ```text
//!              Try                Confirm
//!   (none) ──────────▶ TRIED ───────────────▶ CONFIRMED
//!     │                  │
//!     │ Cancel           │ Cancel
//!     ▼                  ▼
//!   CANCELED (amount 0)  CANCELED (hold returned)
//! ```

pub mod engine;
pub mod error;


pub use engine::TccEngine;
pub use error::TccError;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::core_types::{AccountId, TransactionId};
use crate::money::Amount;

/// Successful Cancel result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// A Tried hold was returned to the source account
    Refunded,
    /// Fund movement was already Canceled, no-op
    AlreadyCanceled,
    /// No Try had run; a zero-amount Canceled record now blocks any late Try
    EmptyRollback,
}

impl CancelOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelOutcome::Refunded => "REFUNDED",
            CancelOutcome::AlreadyCanceled => "ALREADY_CANCELED",
            CancelOutcome::EmptyRollback => "EMPTY_ROLLBACK",
        }
    }
}

impl fmt::Display for CancelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three TCC phases
///
/// All methods MUST be idempotent - calling with the same transaction id any
/// number of times, in any order, concurrently, has the same balance effect
/// as the first successful call.
#[async_trait]
pub trait Tcc: Send + Sync {
    /// Reserve `amount` by debiting the source account
    async fn try_transfer(
        &self,
        transaction_id: &TransactionId,
        source_account_id: AccountId,
        destination_account_id: AccountId,
        amount: Amount,
    ) -> Result<(), TccError>;

    /// Credit the destination with the reserved amount
    async fn confirm(&self, transaction_id: &TransactionId) -> Result<(), TccError>;

    /// Release the reservation back to the source
    async fn cancel(&self, transaction_id: &TransactionId) -> Result<CancelOutcome, TccError>;
}

/// Run one TCC call under `limit`; an elapsed deadline becomes `TccError::Timeout`
///
/// The outcome of a timed-out call is unknown, so callers treat it like any
/// other retryable error.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, TccError>
where
    F: Future<Output = Result<T, TccError>>,
{
    tokio::time::timeout(limit, call).await?
}

/// Mock TCC for orchestrator tests
///
/// Delegates to a real engine, with injectable latency and transient failures.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::ledger::LedgerError;

    pub struct MockTcc {
        inner: Arc<dyn Tcc>,
        try_delay: Mutex<Duration>,
        confirm_delay: Mutex<Duration>,
        cancel_delay: Mutex<Duration>,
        /// Upcoming calls that fail with a transient ledger error
        fail_tries: AtomicUsize,
        fail_confirms: AtomicUsize,
        fail_cancels: AtomicUsize,
        /// Upcoming Trys that commit, then report a transient error
        lose_try_acks: AtomicUsize,
        try_count: AtomicUsize,
        confirm_count: AtomicUsize,
        cancel_count: AtomicUsize,
    }

    fn take_one(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn transient() -> TccError {
        TccError::Ledger(LedgerError::Database("injected failure".into()))
    }

    impl MockTcc {
        pub fn new(inner: Arc<dyn Tcc>) -> Self {
            Self {
                inner,
                try_delay: Mutex::new(Duration::ZERO),
                confirm_delay: Mutex::new(Duration::ZERO),
                cancel_delay: Mutex::new(Duration::ZERO),
                fail_tries: AtomicUsize::new(0),
                fail_confirms: AtomicUsize::new(0),
                fail_cancels: AtomicUsize::new(0),
                lose_try_acks: AtomicUsize::new(0),
                try_count: AtomicUsize::new(0),
                confirm_count: AtomicUsize::new(0),
                cancel_count: AtomicUsize::new(0),
            }
        }

        pub fn set_try_delay(&self, delay: Duration) {
            *self.try_delay.lock().unwrap() = delay;
        }

        pub fn set_confirm_delay(&self, delay: Duration) {
            *self.confirm_delay.lock().unwrap() = delay;
        }

        pub fn set_cancel_delay(&self, delay: Duration) {
            *self.cancel_delay.lock().unwrap() = delay;
        }

        pub fn fail_next_tries(&self, n: usize) {
            self.fail_tries.store(n, Ordering::SeqCst);
        }

        pub fn fail_next_confirms(&self, n: usize) {
            self.fail_confirms.store(n, Ordering::SeqCst);
        }

        pub fn fail_next_cancels(&self, n: usize) {
            self.fail_cancels.store(n, Ordering::SeqCst);
        }

        pub fn lose_next_try_acks(&self, n: usize) {
            self.lose_try_acks.store(n, Ordering::SeqCst);
        }

        pub fn try_count(&self) -> usize {
            self.try_count.load(Ordering::SeqCst)
        }

        pub fn confirm_count(&self) -> usize {
            self.confirm_count.load(Ordering::SeqCst)
        }

        pub fn cancel_count(&self) -> usize {
            self.cancel_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Tcc for MockTcc {
        async fn try_transfer(
            &self,
            transaction_id: &TransactionId,
            source_account_id: AccountId,
            destination_account_id: AccountId,
            amount: Amount,
        ) -> Result<(), TccError> {
            self.try_count.fetch_add(1, Ordering::SeqCst);
            let delay = *self.try_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if take_one(&self.fail_tries) {
                return Err(transient());
            }
            self.inner
                .try_transfer(
                    transaction_id,
                    source_account_id,
                    destination_account_id,
                    amount,
                )
                .await?;
            if take_one(&self.lose_try_acks) {
                return Err(transient());
            }
            Ok(())
        }

        async fn confirm(&self, transaction_id: &TransactionId) -> Result<(), TccError> {
            self.confirm_count.fetch_add(1, Ordering::SeqCst);
            let delay = *self.confirm_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if take_one(&self.fail_confirms) {
                return Err(transient());
            }
            self.inner.confirm(transaction_id).await
        }

        async fn cancel(&self, transaction_id: &TransactionId) -> Result<CancelOutcome, TccError> {
            self.cancel_count.fetch_add(1, Ordering::SeqCst);
            let delay = *self.cancel_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if take_one(&self.fail_cancels) {
                return Err(transient());
            }
            self.inner.cancel(transaction_id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_maps_elapsed_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, TccError>(())
        };
        let result = bounded(Duration::from_secs(1), slow).await;
        assert_eq!(result, Err(TccError::Timeout));
        assert!(TccError::Timeout.is_retryable());
    }

    #[tokio::test]
    async fn test_bounded_passes_through_result() {
        let refused = bounded(Duration::from_secs(1), async {
            Err::<(), _>(TccError::PaymentNotDone)
        })
        .await;
        assert_eq!(refused, Err(TccError::PaymentNotDone));
        assert_eq!(
            bounded(Duration::from_secs(1), async { Ok(CancelOutcome::Refunded) }).await,
            Ok(CancelOutcome::Refunded)
        );
    }
}
