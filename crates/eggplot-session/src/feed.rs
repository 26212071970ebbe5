//! Live status feed.
//!
//! Consumes partial status messages from the device connection, merges them
//! into a [`PrintStatus`] and publishes every change over a watch channel.
//! Connection failures and missed heartbeats trigger an indefinite
//! reconnect loop with a fixed backoff.

use async_trait::async_trait;
use eggplot_core::ConnectionError;
use eggplot_protocol::{PrintStatus, PrintStatusUpdate};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// A connection missing messages for this long is considered dead.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(2);

/// One established connection delivering raw status messages.
#[async_trait]
pub trait StatusFeed: Send {
    /// Next raw message from the device. Heartbeat responses count as
    /// messages for liveness even if they carry no status fields.
    async fn next_message(&mut self) -> std::result::Result<String, ConnectionError>;
}

/// Opens connections for the reconnect loop.
#[async_trait]
pub trait StatusFeedConnector: Send + Sync {
    async fn connect(&self) -> std::result::Result<Box<dyn StatusFeed>, ConnectionError>;
}

/// Drives the status feed until every receiver of `tx` is gone.
///
/// The device is the source of truth: each decoded message is shallow-merged
/// into the running [`PrintStatus`] and the result published. Connect
/// failures, read errors and heartbeat timeouts all back off for
/// [`RECONNECT_DELAY`] and reconnect; malformed messages are dropped without
/// touching the connection.
pub async fn run_status_feed<C: StatusFeedConnector>(connector: C, tx: watch::Sender<PrintStatus>) {
    let mut status = PrintStatus::default();

    while !tx.is_closed() {
        let mut feed = match connector.connect().await {
            Ok(feed) => feed,
            Err(err) => {
                warn!(%err, "status feed connect failed, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
        };
        info!("status feed connected");

        loop {
            let message = match tokio::time::timeout(HEARTBEAT_TIMEOUT, feed.next_message()).await
            {
                Err(_) => {
                    let err = ConnectionError::HeartbeatTimeout {
                        timeout_ms: HEARTBEAT_TIMEOUT.as_millis() as u64,
                    };
                    warn!(%err, "status feed stalled, reconnecting");
                    break;
                }
                Ok(Err(err)) => {
                    warn!(%err, "status feed dropped, reconnecting");
                    break;
                }
                Ok(Ok(message)) => message,
            };

            match PrintStatusUpdate::from_json(&message) {
                Ok(update) => {
                    status.apply(&update);
                    if tx.send(status.clone()).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    let err = ConnectionError::BadMessage {
                        reason: err.to_string(),
                    };
                    warn!(%err, message, "dropping malformed status message");
                }
            }
        }

        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
