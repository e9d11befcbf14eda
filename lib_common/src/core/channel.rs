//! # Bounded Notification Channel
//!
//! The only structure shared between the producer task and the relay. It is a
//! bounded tokio MPSC channel used strictly single-producer/single-consumer:
//!
//! - a full channel suspends the producer's `send` (backpressure),
//! - an empty channel suspends the relay's `recv`,
//! - FIFO order means messages leave in the order their lines were read.
//!
//! End of stream is an explicit `Envelope::EndOfStream` value rather than a
//! magic payload, so no real message can ever be mistaken for it.

use tokio::sync::mpsc;

/// Slot count used when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 1000;

/// # Envelope
///
/// Element type of the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// A rendered notification to publish.
    Message(String),
    /// Terminal sentinel: the producer will send nothing more.
    EndOfStream,
}

/// Producer half of the channel.
pub type EnvelopeSender = mpsc::Sender<Envelope>;
/// Relay half of the channel.
pub type EnvelopeReceiver = mpsc::Receiver<Envelope>;

/// Creates the channel for one run. A capacity of zero is raised to one.
pub fn bounded(capacity: usize) -> (EnvelopeSender, EnvelopeReceiver) {
    mpsc::channel(capacity.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_envelopes_keep_fifo_order() {
        let (tx, mut rx) = bounded(4);
        tx.send(Envelope::Message("a".into())).await.unwrap();
        tx.send(Envelope::Message("b".into())).await.unwrap();
        tx.send(Envelope::EndOfStream).await.unwrap();

        assert_eq!(rx.recv().await, Some(Envelope::Message("a".into())));
        assert_eq!(rx.recv().await, Some(Envelope::Message("b".into())));
        assert_eq!(rx.recv().await, Some(Envelope::EndOfStream));
    }

    #[tokio::test]
    async fn test_second_send_waits_for_first_receive() {
        let (tx, mut rx) = bounded(1);
        tx.send(Envelope::Message("first".into())).await.unwrap();

        let sender = tokio::spawn(async move { tx.send(Envelope::Message("second".into())).await });
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(!sender.is_finished(), "second send returned while the channel was full");

        assert_eq!(rx.recv().await, Some(Envelope::Message("first".into())));
        tokio::time::timeout(std::time::Duration::from_secs(1), sender)
            .await
            .expect("send still blocked after the first receive")
            .unwrap()
            .unwrap();
        assert_eq!(rx.recv().await, Some(Envelope::Message("second".into())));
    }

    #[tokio::test]
    async fn test_zero_capacity_is_usable() {
        let (tx, mut rx) = bounded(0);
        tx.send(Envelope::EndOfStream).await.unwrap();
        assert_eq!(rx.recv().await, Some(Envelope::EndOfStream));
    }

    #[test]
    fn test_full_channel_refuses_more() {
        let (tx, _rx) = bounded(1);
        assert!(tx.try_send(Envelope::Message("first".into())).is_ok());
        assert!(tx.try_send(Envelope::Message("second".into())).is_err());
    }
}
