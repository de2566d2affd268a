//! TCC engine over a [`LedgerStore`]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::error::TccError;
use super::{CancelOutcome, Tcc};
use crate::core_types::{AccountId, TransactionId};
use crate::ledger::{FundMovement, FundMovementStage, LedgerError, LedgerStore, lock_account_pair};
use crate::money::Amount;

/// TCC engine
///
/// Each phase runs in exactly one storage transaction. Early returns drop
/// the transaction, which rolls back everything it staged.
pub struct TccEngine {
    store: Arc<dyn LedgerStore>,
}

impl TccEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// One Cancel attempt. `Ok(None)` means the empty-rollback insert lost a
    /// creation race and the caller should re-read.
    async fn cancel_once(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<CancelOutcome>, TccError> {
        let mut tx = self.store.begin().await?;

        let Some(movement) = tx.lock_fund_movement(transaction_id).await? else {
            match tx
                .insert_fund_movement(&FundMovement::empty_rollback(*transaction_id))
                .await
            {
                Ok(()) => {}
                Err(LedgerError::DuplicateFundMovement(_)) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
            tx.commit().await?;
            info!(transaction_id = %transaction_id, "Empty rollback recorded");
            return Ok(Some(CancelOutcome::EmptyRollback));
        };

        match movement.stage {
            FundMovementStage::Confirmed => Err(TccError::Confirmed),
            FundMovementStage::Canceled => {
                debug!(transaction_id = %transaction_id, "Cancel: already canceled");
                Ok(Some(CancelOutcome::AlreadyCanceled))
            }
            FundMovementStage::Tried => {
                let (source, _destination) = lock_account_pair(
                    tx.as_mut(),
                    movement.source_account_id,
                    movement.destination_account_id,
                )
                .await?;

                let refunded = source.balance.checked_add(movement.amount)?;
                tx.set_balance(source.account_id, refunded).await?;
                tx.update_stage(transaction_id, FundMovementStage::Canceled)
                    .await?;
                tx.commit().await?;

                info!(
                    transaction_id = %transaction_id,
                    source = source.account_id,
                    amount = %movement.amount,
                    "Hold returned to source"
                );
                Ok(Some(CancelOutcome::Refunded))
            }
        }
    }
}

#[async_trait]
impl Tcc for TccEngine {
    async fn try_transfer(
        &self,
        transaction_id: &TransactionId,
        source_account_id: AccountId,
        destination_account_id: AccountId,
        amount: Amount,
    ) -> Result<(), TccError> {
        let mut tx = self.store.begin().await?;

        if let Some(movement) = tx.lock_fund_movement(transaction_id).await? {
            return match movement.stage {
                FundMovementStage::Tried | FundMovementStage::Confirmed => {
                    debug!(
                        transaction_id = %transaction_id,
                        stage = %movement.stage,
                        "Try: already applied"
                    );
                    Ok(())
                }
                FundMovementStage::Canceled => Err(TccError::Rollbacked),
            };
        }

        let (source, destination) =
            lock_account_pair(tx.as_mut(), source_account_id, destination_account_id).await?;

        let debited = source
            .balance
            .checked_sub(amount)
            .map_err(|_| TccError::InsufficientBalance)?;
        destination
            .balance
            .checked_add(amount)
            .map_err(|_| TccError::Overflow)?;

        tx.set_balance(source_account_id, debited).await?;

        let movement = FundMovement::tried(
            *transaction_id,
            source_account_id,
            destination_account_id,
            amount,
        );
        let inserted = tx.insert_fund_movement(&movement).await;
        match inserted {
            Ok(()) => {}
            Err(LedgerError::DuplicateFundMovement(_)) => {
                // Discard our debit, then answer from the winner's row
                drop(tx);
                warn!(transaction_id = %transaction_id, "Try: lost creation race");
                return match self.store.get_fund_movement(transaction_id).await? {
                    Some(winner) if winner.stage == FundMovementStage::Canceled => {
                        Err(TccError::Rollbacked)
                    }
                    Some(_) => Ok(()),
                    None => Err(TccError::Ledger(LedgerError::DuplicateFundMovement(
                        transaction_id.to_string(),
                    ))),
                };
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        info!(
            transaction_id = %transaction_id,
            source = source_account_id,
            destination = destination_account_id,
            amount = %amount,
            "Try: amount on hold"
        );
        Ok(())
    }

    async fn confirm(&self, transaction_id: &TransactionId) -> Result<(), TccError> {
        let mut tx = self.store.begin().await?;

        let movement = tx
            .lock_fund_movement(transaction_id)
            .await?
            .ok_or(TccError::PaymentNotDone)?;

        match movement.stage {
            FundMovementStage::Confirmed => {
                debug!(transaction_id = %transaction_id, "Confirm: already confirmed");
                return Ok(());
            }
            FundMovementStage::Canceled => return Err(TccError::Rollbacked),
            FundMovementStage::Tried => {}
        }

        let (_source, destination) = lock_account_pair(
            tx.as_mut(),
            movement.source_account_id,
            movement.destination_account_id,
        )
        .await?;

        let credited = destination.balance.checked_add(movement.amount)?;
        tx.set_balance(destination.account_id, credited).await?;
        tx.update_stage(transaction_id, FundMovementStage::Confirmed)
            .await?;
        tx.commit().await?;

        info!(
            transaction_id = %transaction_id,
            destination = destination.account_id,
            amount = %movement.amount,
            "Confirm: destination credited"
        );
        Ok(())
    }

    async fn cancel(&self, transaction_id: &TransactionId) -> Result<CancelOutcome, TccError> {
        if let Some(outcome) = self.cancel_once(transaction_id).await? {
            return Ok(outcome);
        }
        // The row exists now, a second pass resolves against it
        self.cancel_once(transaction_id).await?.ok_or_else(|| {
            TccError::Ledger(LedgerError::DuplicateFundMovement(
                transaction_id.to_string(),
            ))
        })
    }
}
