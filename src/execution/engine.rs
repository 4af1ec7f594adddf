//! Transaction executor: submit with endpoint rotation, then wait for confirmations

use alloy::primitives::TxHash;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};
use crate::{
    errors::{BotError, BotResult},
    network::{with_rotation, ChainClient, Connector, EndpointPool, RetryConfig},
    types::{
        HaltReason, ReceiptSummary, SequenceReport, TransactionIntent, TransactionOutcome,
        TransactionState,
    },
};

#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub min_confirmations: u64,
    /// Upper bound on the confirmation wait for one transaction.
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    /// Submission attempts are additionally capped at the pool size.
    pub submission: RetryConfig,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            min_confirmations: 1,
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
            submission: RetryConfig {
                initial_delay_ms: 250,
                ..Default::default()
            },
        }
    }
}

/// Result of watching one submitted transaction.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub state: TransactionState,
    pub confirmations: u64,
    pub receipt: Option<ReceiptSummary>,
}

pub struct TransactionExecutor<K: Connector> {
    pool: Arc<EndpointPool>,
    connector: K,
    config: ExecutionConfig,
}

impl<K: Connector> TransactionExecutor<K> {
    pub fn new(pool: Arc<EndpointPool>, connector: K, config: ExecutionConfig) -> Self {
        Self { pool, connector, config }
    }

    /// Runs dependent intents in order, stopping at the first one that does not confirm.
    ///
    /// Earlier confirmed transactions are reported as they stand; nothing is rolled back.
    pub async fn execute_sequence(&self, intents: &[TransactionIntent]) -> SequenceReport {
        let mut outcomes = Vec::with_capacity(intents.len());

        for (index, intent) in intents.iter().enumerate() {
            info!(
                "🚀 [{}/{}] Executing {}",
                index + 1, intents.len(), intent.method_name()
            );

            let outcome = match self.execute(intent).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let halted = submission_halt(index, e);
                    error!("Sequence halted at step {}: {:?}", index + 1, halted);
                    return SequenceReport { outcomes, halted: Some(halted) };
                }
            };

            let halted = match outcome.state {
                TransactionState::Confirmed => None,
                TransactionState::Rejected => Some(HaltReason::Rejected {
                    index,
                    tx_hash: Some(outcome.transaction_id),
                    reason: "transaction reverted".to_string(),
                }),
                _ => Some(HaltReason::PendingTimeout {
                    index,
                    tx_hash: outcome.transaction_id,
                }),
            };

            outcomes.push(outcome);
            if let Some(halted) = halted {
                warn!("Sequence halted at step {}: {:?}", index + 1, halted);
                return SequenceReport { outcomes, halted: Some(halted) };
            }
        }

        SequenceReport { outcomes, halted: None }
    }

    /// Submits one intent and waits for it.
    ///
    /// `Err` means it never reached the chain; reverts and timeouts come back as outcomes.
    pub async fn execute(&self, intent: &TransactionIntent) -> BotResult<TransactionOutcome> {
        let started = Instant::now();
        let submitted_at = Utc::now();
        let (client, tx_hash) = self.submit(intent).await?;

        info!(
            tx_hash = %tx_hash,
            endpoint = client.endpoint(),
            "📡 {} submitted", intent.method_name()
        );

        let confirmation = self.wait_for_confirmation(&client, tx_hash).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match confirmation.state {
            TransactionState::Confirmed => info!(
                tx_hash = %tx_hash,
                confirmations = confirmation.confirmations,
                "✅ {} confirmed", intent.method_name()
            ),
            TransactionState::Rejected => error!(
                tx_hash = %tx_hash,
                "❌ {} reverted on chain", intent.method_name()
            ),
            _ => warn!(
                tx_hash = %tx_hash,
                confirmations = confirmation.confirmations,
                "⏳ {} still pending after {:?}", intent.method_name(), self.config.confirmation_timeout
            ),
        }

        Ok(TransactionOutcome {
            method: intent.method.clone(),
            transaction_id: tx_hash,
            endpoint: client.endpoint().to_string(),
            state: confirmation.state,
            confirmed: confirmation.state == TransactionState::Confirmed,
            confirmations_observed: confirmation.confirmations,
            receipt_summary: confirmation.receipt,
            submitted_at,
            elapsed_ms,
        })
    }

    /// One attempt per endpoint, rotating after each transport failure.
    async fn submit(&self, intent: &TransactionIntent) -> BotResult<(K::Client, TxHash)> {
        let context = format!("submission of {}", intent.method_name());
        let submitted = with_rotation(
            &self.pool,
            &self.connector,
            &self.config.submission,
            &context,
            |client| async move { client.send(intent).await },
        )
        .await;

        submitted.map_err(|e| match e {
            BotError::Network { source, retry_count, .. } => BotError::SubmissionExhausted {
                method: intent.method.clone(),
                attempts: retry_count,
                last_error: source,
            },
            other => other,
        })
    }

    /// Polls for the receipt until enough confirmations are seen or the deadline passes.
    pub async fn wait_for_confirmation(&self, client: &K::Client, tx_hash: TxHash) -> Confirmation {
        let deadline = Instant::now() + self.config.confirmation_timeout;
        let required = self.config.min_confirmations.max(1);
        let mut confirmations = 0;
        let mut last_receipt = None;

        loop {
            match client.receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    if !receipt.success {
                        return Confirmation {
                            state: TransactionState::Rejected,
                            confirmations: 0,
                            receipt: Some(receipt),
                        };
                    }

                    match client.block_number().await {
                        Ok(head) => confirmations = confirmations_at(head, receipt.block_number),
                        Err(e) => warn!(tx_hash = %tx_hash, "Head block unavailable while confirming: {}", e),
                    }
                    let done = confirmations >= required;
                    last_receipt = Some(receipt);
                    if done {
                        return Confirmation {
                            state: TransactionState::Confirmed,
                            confirmations,
                            receipt: last_receipt,
                        };
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(tx_hash = %tx_hash, "Receipt poll failed: {}", e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Confirmation {
                    state: TransactionState::PendingTimeout,
                    confirmations,
                    receipt: last_receipt,
                };
            }
            tokio::time::sleep(self.config.poll_interval.min(deadline - now)).await;
        }
    }
}

fn confirmations_at(head: u64, included_in: Option<u64>) -> u64 {
    match included_in {
        Some(block) if head >= block => head - block + 1,
        _ => 0,
    }
}

fn submission_halt(index: usize, error: BotError) -> HaltReason {
    match error {
        BotError::NodeRejected { reason, .. } => HaltReason::Rejected {
            index,
            tx_hash: None,
            reason,
        },
        BotError::SubmissionExhausted { attempts, last_error, .. } => HaltReason::SubmissionFailed {
            index,
            attempts,
            cause: last_error
                .map(|e| format!("{:#}", e))
                .unwrap_or_else(|| "no endpoint accepted the transaction".to_string()),
        },
        other => HaltReason::SubmissionFailed {
            index,
            attempts: 0,
            cause: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_confirmations_inclusively() {
        assert_eq!(confirmations_at(100, Some(100)), 1);
        assert_eq!(confirmations_at(105, Some(100)), 6);
        assert_eq!(confirmations_at(99, Some(100)), 0);
        assert_eq!(confirmations_at(100, None), 0);
    }

    #[test]
    fn node_refusal_halts_as_rejected() {
        let halted = submission_halt(2, BotError::NodeRejected {
            endpoint: "rpc-0".to_string(),
            method: "flashloan(address,uint256)".to_string(),
            reason: "insufficient funds".to_string(),
        });
        assert_eq!(halted, HaltReason::Rejected {
            index: 2,
            tx_hash: None,
            reason: "insufficient funds".to_string(),
        });
    }
}
