use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::{trace, warn};

use super::NavigationSignal;

/// Receiving end held by one mounted session.
///
/// Dropping it is the unsubscription; nothing global is left behind.
pub struct NavigationSubscription {
    receiver: broadcast::Receiver<NavigationSignal>,
}

impl NavigationSubscription {
    /// Wait for the next signal. Returns `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<NavigationSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => return Some(signal),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Navigation subscriber lagged, skipped {} signals", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive without blocking
    pub fn try_recv(&mut self) -> Option<NavigationSignal> {
        loop {
            match self.receiver.try_recv() {
                Ok(signal) => return Some(signal),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[derive(Debug, Default)]
struct HubStats {
    published: AtomicU64,
    undelivered: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationHubStats {
    pub published: u64,
    pub undelivered: u64,
    pub subscriber_count: usize,
}

/// Registration point for navigation signals.
///
/// The host application publishes every route change, link click and page
/// teardown here; each mounted session subscribes for its lifetime.
#[derive(Debug, Clone)]
pub struct NavigationHub {
    sender: broadcast::Sender<NavigationSignal>,
    stats: Arc<HubStats>,
}

impl Default for NavigationHub {
    fn default() -> Self {
        Self::new(32)
    }
}

impl NavigationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));

        Self {
            sender,
            stats: Arc::new(HubStats::default()),
        }
    }

    /// Fan a signal out to every mounted session. Never blocks.
    pub fn publish(&self, signal: NavigationSignal) -> usize {
        trace!("Publishing navigation signal: {:?}", signal);
        self.stats.published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(signal) {
            Ok(receivers) => receivers,
            Err(_) => {
                // No mounted players is normal
                self.stats.undelivered.fetch_add(1, Ordering::Relaxed);
                0
            }
        }
    }

    pub fn subscribe(&self) -> NavigationSubscription {
        NavigationSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn stats(&self) -> NavigationHubStats {
        NavigationHubStats {
            published: self.stats.published.load(Ordering::Relaxed),
            undelivered: self.stats.undelivered.load(Ordering::Relaxed),
            subscriber_count: self.subscriber_count(),
        }
    }
}
