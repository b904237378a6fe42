//! Solana JSON-RPC + pubsub implementation of [`Ledger`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::StreamExt;
use gpt_oracle_protocol::Notification;
use solana_client::{
    nonblocking::{pubsub_client::PubsubClient, rpc_client::RpcClient},
    rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use tokio::sync::{mpsc, oneshot};

use crate::{
    error::ClientError,
    ledger::{Ledger, LogSubscription},
};

/// Ledger backed by a nonblocking `RpcClient` (HTTP) and a `PubsubClient`
/// (websocket) opened per subscription.
pub struct RpcLedger {
    rpc: Arc<RpcClient>,
    ws_url: String,
    poll_interval: Duration,
}

impl RpcLedger {
    pub fn new(rpc: Arc<RpcClient>, ws_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self { rpc, ws_url: ws_url.into(), poll_interval }
    }

    pub fn rpc(&self) -> &Arc<RpcClient> {
        &self.rpc
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), ClientError> {
        self.rpc
            .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
            .await
            .map_err(|e| ClientError::Rpc(format!("get_latest_blockhash: {e}")))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, ClientError> {
        self.rpc
            .send_transaction(tx)
            .await
            .map_err(|e| ClientError::Send(e.to_string()))
    }

    async fn confirm(&self, signature: &Signature, expiry_height: u64) -> Result<(), ClientError> {
        let confirmed = CommitmentConfig::confirmed();
        loop {
            let statuses = self
                .rpc
                .get_signature_statuses(&[*signature])
                .await
                .map_err(|e| ClientError::Confirmation(format!("get_signature_statuses: {e}")))?;

            if let Some(Some(status)) = statuses.value.into_iter().next() {
                if let Some(err) = status.err {
                    return Err(ClientError::Confirmation(format!(
                        "transaction {signature} failed: {err}"
                    )));
                }
                if status.satisfies_commitment(confirmed) {
                    return Ok(());
                }
            }

            let height = self
                .rpc
                .get_block_height()
                .await
                .map_err(|e| ClientError::Confirmation(format!("get_block_height: {e}")))?;
            if height > expiry_height {
                return Err(ClientError::Expired {
                    signature: signature.to_string(),
                    expiry_height,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn subscribe_logs(&self, address: Pubkey) -> Result<LogSubscription, ClientError> {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), ClientError>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let ws_url = self.ws_url.clone();

        let task = tokio::spawn(async move {
            let client = match PubsubClient::new(&ws_url).await {
                Ok(c) => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(ClientError::Subscription(format!(
                        "connect {ws_url}: {e}"
                    ))));
                    return;
                }
            };

            pump_logs(&client, address, ready_tx, notify_tx, shutdown_rx).await;
            if let Err(e) = client.shutdown().await {
                tracing::debug!("pubsub shutdown: {e}");
            }
            tracing::debug!(%address, "Log subscription torn down");
        });

        match ready_rx.await {
            Ok(Ok(())) => Ok(LogSubscription::new(address, notify_rx, shutdown_tx, Some(task))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ClientError::Subscription("subscription task exited".into())),
        }
    }
}

/// Forward log notifications for `address` until the receiver goes away, the
/// stream ends or `shutdown_rx` fires. Every borrow of `client` ends here.
async fn pump_logs(
    client: &PubsubClient,
    address: Pubkey,
    ready_tx: oneshot::Sender<Result<(), ClientError>>,
    notify_tx: mpsc::UnboundedSender<Notification>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    // Processed commitment: the reply is shown as soon as the callback
    // executes; redeliveries are filtered by the session.
    let subscribed = client
        .logs_subscribe(
            RpcTransactionLogsFilter::Mentions(vec![address.to_string()]),
            RpcTransactionLogsConfig {
                commitment: Some(CommitmentConfig::processed()),
            },
        )
        .await;
    let (mut stream, unsubscribe) = match subscribed {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready_tx.send(Err(ClientError::Subscription(format!(
                "logs_subscribe {address}: {e}"
            ))));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));
    tracing::info!(%address, "Subscribed to interaction logs");

    loop {
        tokio::select! {
            item = stream.next() => match item {
                Some(response) => {
                    let logs = response.value;
                    tracing::debug!(
                        signature = %logs.signature,
                        slot      = response.context.slot,
                        lines     = logs.logs.len(),
                        "Log notification",
                    );
                    if notify_tx.send(Notification::new(logs.signature, logs.logs)).is_err() {
                        break;
                    }
                }
                None => {
                    tracing::warn!(%address, "Log stream ended");
                    break;
                }
            },
            _ = &mut shutdown_rx => break,
        }
    }

    drop(stream);
    unsubscribe().await;
}

/// Websocket endpoint for an RPC URL: `http(s)` becomes `ws(s)` and an
/// explicit port is bumped by one, matching the validator's default layout.
pub fn websocket_url_for(rpc_url: &str) -> String {
    let (scheme, rest) = match rpc_url.split_once("://") {
        Some(("https", rest)) => ("wss", rest),
        Some(("http", rest)) => ("ws", rest),
        Some((other, rest)) => (other, rest),
        None => ("ws", rpc_url),
    };

    let (authority, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };

    let authority = match authority.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(p) => format!("{host}:{}", p.saturating_add(1)),
            Err(_) => authority.to_owned(),
        },
        None => authority.to_owned(),
    };

    format!("{scheme}://{authority}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_logs_reports_unreachable_websocket() {
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1".to_owned()));
        let ledger = RpcLedger::new(rpc, "ws://127.0.0.1:1", Duration::from_millis(10));

        let err = ledger.subscribe_logs(Pubkey::new_unique()).await.unwrap_err();
        assert!(matches!(err, ClientError::Subscription(ref m) if m.starts_with("connect ")));
    }

    #[test]
    fn websocket_url_swaps_scheme() {
        assert_eq!(
            websocket_url_for("https://api.devnet.solana.com"),
            "wss://api.devnet.solana.com"
        );
        assert_eq!(websocket_url_for("http://example.com/rpc"), "ws://example.com/rpc");
    }

    #[test]
    fn websocket_url_bumps_explicit_port() {
        assert_eq!(websocket_url_for("http://127.0.0.1:8899"), "ws://127.0.0.1:8900");
        assert_eq!(
            websocket_url_for("https://rpc.example.com:443/key"),
            "wss://rpc.example.com:444/key"
        );
    }
}
