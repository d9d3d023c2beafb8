use tokio::sync::mpsc;
use tracing::trace;

/// Fire-and-forget transport that survives the sender going away.
///
/// `send_beacon` must never block or wait on the network: it only reports
/// whether the payload was accepted for delivery.
pub trait Beacon: Send + Sync {
    fn send_beacon(&self, url: &str, body: &[u8]) -> bool;
}

/// A payload accepted by the beacon, waiting for the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconRequest {
    pub url: String,
    pub body: Vec<u8>,
}

/// Beacon backed by a bounded queue drained by a long-lived dispatcher.
///
/// Reports handed to it outlive the session that produced them. A full or
/// closed queue refuses the payload so the caller can fall back.
#[derive(Debug, Clone)]
pub struct QueuedBeacon {
    sender: mpsc::Sender<BeaconRequest>,
}

impl QueuedBeacon {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<BeaconRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl Beacon for QueuedBeacon {
    fn send_beacon(&self, url: &str, body: &[u8]) -> bool {
        let request = BeaconRequest {
            url: url.to_string(),
            body: body.to_vec(),
        };

        match self.sender.try_send(request) {
            Ok(()) => true,
            Err(e) => {
                trace!("Beacon queue refused payload: {}", e);
                false
            }
        }
    }
}
