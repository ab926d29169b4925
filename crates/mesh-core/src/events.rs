//! Change notifications for registry subscribers.
//!
//! Every membership change publishes the full `RegistrySnapshot`. Delivery is
//! synchronous and in subscription order; late subscribers see only changes
//! made after they subscribe.

use crate::RegistrySnapshot;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

type Callback = Arc<dyn Fn(&RegistrySnapshot) + Send + Sync>;

/// Subscription handle. Call `unsubscribe()` or drop it to stop receiving snapshots.
pub struct Subscription {
    notifier: Weak<Notifier>,
    id: usize,
}

impl Subscription {
    /// Stop receiving snapshots.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.remove(self.id);
        }
    }
}

/// Observer list for registry snapshots.
///
/// Wrap in `Arc` to enable subscriptions.
pub struct Notifier {
    callbacks: RwLock<Vec<(usize, Callback)>>,
    next_id: AtomicUsize,
}

impl Default for Notifier {
    fn default() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        }
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to snapshots. Returns `Subscription` that unsubscribes on drop.
    pub fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn(&RegistrySnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(callback)));
        Subscription {
            notifier: Arc::downgrade(self),
            id,
        }
    }

    fn remove(&self, id: usize) {
        // publish never holds the lock while callbacks run, so waiting here is safe
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(i, _)| *i != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Deliver a snapshot to all current subscribers.
    pub fn publish(&self, snapshot: &RegistrySnapshot) {
        // Copy the list so a callback may subscribe without deadlocking
        let callbacks: Vec<_> = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PeerRecord;
    use std::sync::Mutex;

    fn snapshot() -> RegistrySnapshot {
        RegistrySnapshot {
            current: PeerRecord::new("alpha", "a:1000"),
            clients: Vec::new(),
        }
    }

    #[test]
    fn test_subscribe_and_publish() {
        let notifier = Arc::new(Notifier::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let _sub = notifier.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });

        notifier.publish(&snapshot());
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let notifier = Arc::new(Notifier::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                notifier.subscribe(move |_| order.lock().unwrap().push(i))
            })
            .collect();

        notifier.publish(&snapshot());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let notifier = Arc::new(Notifier::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let sub = notifier.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });
        notifier.publish(&snapshot());
        sub.unsubscribe();
        notifier.publish(&snapshot());

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_partial_unsubscribe() {
        let notifier = Arc::new(Notifier::new());
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        let count1_clone = Arc::clone(&count1);
        let count2_clone = Arc::clone(&count2);

        let sub1 = notifier.subscribe(move |_| {
            count1_clone.fetch_add(1, Ordering::Relaxed);
        });
        let _sub2 = notifier.subscribe(move |_| {
            count2_clone.fetch_add(1, Ordering::Relaxed);
        });

        notifier.publish(&snapshot());
        drop(sub1);
        notifier.publish(&snapshot());

        assert_eq!(count1.load(Ordering::Relaxed), 1);
        assert_eq!(count2.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_unsubscribe_while_list_is_read_elsewhere() {
        let notifier = Arc::new(Notifier::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let sub = notifier.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });

        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        std::thread::scope(|scope| {
            let reader = Arc::clone(&notifier);
            scope.spawn(move || {
                let _guard = reader.callbacks.read().unwrap();
                locked_tx.send(()).unwrap();
                std::thread::sleep(std::time::Duration::from_millis(50));
            });

            locked_rx.recv().unwrap();
            // Waits for the reader instead of being skipped
            sub.unsubscribe();
        });

        notifier.publish(&snapshot());
        assert_eq!(notifier.subscriber_count(), 0);
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let notifier = Arc::new(Notifier::new());
        notifier.publish(&snapshot());

        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let _sub = notifier.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_callback_may_subscribe() {
        let notifier = Arc::new(Notifier::new());
        let inner = Arc::new(Mutex::new(Vec::new()));
        let notifier_clone = Arc::clone(&notifier);
        let inner_clone = Arc::clone(&inner);

        let _sub = notifier.subscribe(move |_| {
            let sub = notifier_clone.subscribe(|_| {});
            inner_clone.lock().unwrap().push(sub);
        });

        notifier.publish(&snapshot());
        assert_eq!(notifier.subscriber_count(), 2);
    }
}
