//! Ledger collaborator: blockhashes, transaction submission, confirmation
//! and log subscriptions.

use async_trait::async_trait;
use gpt_oracle_protocol::Notification;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::error::ClientError;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Latest blockhash and the last block height at which a transaction
    /// referencing it can still land.
    async fn latest_blockhash(&self) -> Result<(Hash, u64), ClientError>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, ClientError>;

    /// Wait until `signature` is confirmed. Fails once the chain passes
    /// `expiry_height` or the transaction is rejected.
    async fn confirm(&self, signature: &Signature, expiry_height: u64) -> Result<(), ClientError>;

    /// Open a log subscription for transactions mentioning `address`.
    async fn subscribe_logs(&self, address: Pubkey) -> Result<LogSubscription, ClientError>;
}

/// Owned handle to a live log subscription.
///
/// Notifications are buffered until read with [`LogSubscription::recv`].
/// Closing or dropping the handle tears the upstream subscription down.
pub struct LogSubscription {
    address:  Pubkey,
    rx:       mpsc::UnboundedReceiver<Notification>,
    shutdown: Option<oneshot::Sender<()>>,
    task:     Option<JoinHandle<()>>,
}

impl LogSubscription {
    pub fn new(
        address: Pubkey,
        rx: mpsc::UnboundedReceiver<Notification>,
        shutdown: oneshot::Sender<()>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self { address, rx, shutdown: Some(shutdown), task }
    }

    /// Subscription fed from an in-process sender rather than a websocket.
    pub fn channel(address: Pubkey) -> (mpsc::UnboundedSender<Notification>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, _) = oneshot::channel();
        (tx, Self::new(address, rx, shutdown, None))
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    /// Next notification, or `None` once the upstream stream has ended.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    pub fn is_open(&self) -> bool {
        self.shutdown.is_some()
    }

    pub fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            tracing::debug!(address = %self.address, "closing log subscription");
            let _ = shutdown.send(());
        }
        self.rx.close();
        // The task unsubscribes on its own once signalled; detach it.
        self.task.take();
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for LogSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSubscription")
            .field("address", &self.address)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_subscription_delivers_in_order() {
        let address = Pubkey::new_unique();
        let (tx, mut sub) = LogSubscription::channel(address);
        tx.send(Notification::new("S1", vec![])).unwrap();
        tx.send(Notification::new("S2", vec![])).unwrap();

        assert_eq!(sub.address(), address);
        assert_eq!(sub.recv().await.unwrap().signature, "S1");
        assert_eq!(sub.recv().await.unwrap().signature, "S2");
    }

    #[tokio::test]
    async fn dropping_subscription_closes_sender() {
        let (tx, sub) = LogSubscription::channel(Pubkey::new_unique());
        assert!(!tx.is_closed());
        drop(sub);
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (tx, mut sub) = LogSubscription::channel(Pubkey::new_unique());
        sub.close();
        sub.close();
        assert!(!sub.is_open());
        assert!(tx.send(Notification::new("late", vec![])).is_err());
    }
}
