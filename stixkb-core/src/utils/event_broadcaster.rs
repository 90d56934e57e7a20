use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

/// Keyed fan-out of events over `tokio::sync::broadcast` channels.
///
/// Channels are created lazily by the first subscriber of a key. Publishing
/// never blocks and never creates a channel: an event for a key nobody listens
/// to is dropped. Each receiver observes events of its key in publish order;
/// a receiver more than `buffer_size` events behind gets `RecvError::Lagged`.
///
/// ```rust
/// use stixkb::utils::EventBroadcaster;
///
/// # async fn example() {
/// let broadcaster = EventBroadcaster::<&'static str, u32>::new(16);
/// let mut rx = broadcaster.subscribe("edit");
/// assert_eq!(broadcaster.publish(&"edit", 7), 1);
/// assert_eq!(rx.recv().await.unwrap(), 7);
/// # }
/// ```
pub struct EventBroadcaster<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    channels: Arc<DashMap<K, broadcast::Sender<V>>>,
    buffer_size: usize,
}

impl<K, V> EventBroadcaster<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn subscribe(&self, key: K) -> broadcast::Receiver<V> {
        self.channels
            .entry(key)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }

    /// Returns the number of receivers the event was handed to.
    pub fn publish(&self, key: &K, event: V) -> usize {
        match self.channels.get(key) {
            // send only fails when every receiver is gone
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    #[cfg(test)]
    pub fn receiver_count(&self, key: &K) -> usize {
        self.channels
            .get(key)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Drops channels without receivers, returns how many were removed.
    pub fn cleanup_idle(&self) -> usize {
        let before = self.channels.len();
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
        before - self.channels.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl<K, V> Clone for EventBroadcaster<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            buffer_size: self.buffer_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn subscribers_of_a_key_receive_in_publish_order() {
        let broadcaster = EventBroadcaster::<u8, u32>::new(8);
        let mut first = broadcaster.subscribe(1);
        let mut second = broadcaster.subscribe(1);

        for n in 0..3 {
            assert_eq!(broadcaster.publish(&1, n), 2);
        }
        for n in 0..3 {
            assert_eq!(first.recv().await.unwrap(), n);
            assert_eq!(second.recv().await.unwrap(), n);
        }
    }

    #[tokio::test]
    async fn publish_without_channel_is_dropped() {
        let broadcaster = EventBroadcaster::<u8, u32>::new(8);
        assert_eq!(broadcaster.publish(&9, 1), 0);
        assert_eq!(broadcaster.channel_count(), 0);
    }

    #[tokio::test]
    async fn idle_channels_are_cleaned() {
        let broadcaster = EventBroadcaster::<u8, u32>::new(8);
        {
            let _rx = broadcaster.subscribe(1);
            assert_eq!(broadcaster.receiver_count(&1), 1);
        }
        assert_eq!(broadcaster.receiver_count(&1), 0);
        assert_eq!(broadcaster.publish(&1, 5), 0);
        assert_eq!(broadcaster.cleanup_idle(), 1);
        assert_eq!(broadcaster.channel_count(), 0);
    }

    #[tokio::test]
    async fn slow_receiver_lags() {
        let broadcaster = EventBroadcaster::<u8, u32>::new(2);
        let mut rx = broadcaster.subscribe(1);
        for n in 0..5 {
            broadcaster.publish(&1, n);
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(rx.recv().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn clones_share_channels() {
        let broadcaster = EventBroadcaster::<u8, u32>::new(4);
        let clone = broadcaster.clone();
        let mut rx = broadcaster.subscribe(3);
        let handle = tokio::spawn(async move { clone.publish(&3, 42) });
        assert_eq!(handle.await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), 42);
    }
}
