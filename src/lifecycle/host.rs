//! Host start/stop notifications.

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    Start,
    Stop,
}

/// Broadcasts host start/stop to every subscribed coordinator.
#[derive(Debug, Clone)]
pub struct HostLifecycle {
    tx: broadcast::Sender<HostSignal>,
}

impl HostLifecycle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostSignal> {
        self.tx.subscribe()
    }

    pub fn start(&self) {
        self.send(HostSignal::Start);
    }

    pub fn stop(&self) {
        self.send(HostSignal::Stop);
    }

    /// Number of coordinators still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn send(&self, signal: HostSignal) {
        if self.tx.send(signal).is_err() {
            tracing::debug!(?signal, "Host signal sent with no subscribers");
        }
    }
}

impl Default for HostLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signals_reach_every_subscriber() {
        let host = HostLifecycle::new();
        let mut a = host.subscribe();
        let mut b = host.subscribe();
        assert_eq!(host.receiver_count(), 2);

        host.start();
        host.stop();
        assert_eq!(a.recv().await.unwrap(), HostSignal::Start);
        assert_eq!(a.recv().await.unwrap(), HostSignal::Stop);
        assert_eq!(b.recv().await.unwrap(), HostSignal::Start);
    }

    #[test]
    fn test_send_without_subscribers_is_harmless() {
        HostLifecycle::new().stop();
    }
}
