//! Push notifications for data changes.
//!
//! Screens that display a list subscribe to the scope they render and drain
//! their [`Subscription`] once per event-loop iteration, reloading when
//! anything arrived. Dropping the subscription unregisters it, so a screen
//! that goes away can never receive stale notifications.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{channel, Receiver, Sender};

/// What a subscriber is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Repertoire list of one owner.
    Repertoires { owner_id: i64 },
    /// Songs of one repertoire.
    Songs { repertoire_id: i64 },
    /// Band and members of one owner.
    Band { owner_id: i64 },
    /// Sign-in state of the identity provider.
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

/// A single notification. `id` is the primary key of the touched row (or the
/// user id for [`Scope::Session`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub scope: Scope,
    pub kind: ChangeKind,
    pub id: i64,
}

impl Change {
    pub fn new(scope: Scope, kind: ChangeKind, id: i64) -> Self {
        Self { scope, kind, id }
    }
}

struct Subscriber {
    id: u64,
    scope: Scope,
    sender: Sender<Change>,
}

#[derive(Default)]
struct FeedInner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Fan-out point shared by every service that publishes changes. Cloning the
/// feed yields another handle onto the same subscriber list.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    inner: Rc<RefCell<FeedInner>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `scope`.
    pub fn subscribe(&self, scope: Scope) -> Subscription {
        let (sender, receiver) = channel();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber { id, scope, sender });

        Subscription {
            id,
            scope,
            receiver,
            feed: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver `change` to every subscriber of its scope.
    pub fn publish(&self, change: Change) {
        let mut inner = self.inner.borrow_mut();
        inner
            .subscribers
            .retain(|sub| sub.scope != change.scope || sub.sender.send(change).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// Scoped handle returned by [`ChangeFeed::subscribe`]. Unsubscribes on drop.
pub struct Subscription {
    id: u64,
    scope: Scope,
    receiver: Receiver<Change>,
    feed: Weak<RefCell<FeedInner>>,
}

impl Subscription {
    /// Take every notification received since the last call.
    pub fn drain(&self) -> Vec<Change> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.feed.upgrade() {
            inner
                .borrow_mut()
                .subscribers
                .retain(|sub| sub.id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_only_matching_scope() {
        let feed = ChangeFeed::new();
        let songs = feed.subscribe(Scope::Songs { repertoire_id: 1 });
        let other = feed.subscribe(Scope::Songs { repertoire_id: 2 });

        feed.publish(Change::new(
            Scope::Songs { repertoire_id: 1 },
            ChangeKind::Added,
            10,
        ));

        let received = songs.drain();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id, 10);
        assert!(other.drain().is_empty());
        assert!(songs.drain().is_empty());
    }

    #[test]
    fn dropping_subscription_unregisters_it() {
        let feed = ChangeFeed::new();
        let first = feed.subscribe(Scope::Session);
        let second = feed.subscribe(Scope::Session);
        assert_eq!(feed.subscriber_count(), 2);

        drop(first);
        assert_eq!(feed.subscriber_count(), 1);

        feed.publish(Change::new(Scope::Session, ChangeKind::Removed, 0));
        assert_eq!(second.drain().len(), 1);
    }

    #[test]
    fn subscription_outliving_feed_drops_cleanly() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe(Scope::Band { owner_id: 3 });
        drop(feed);
        assert!(sub.drain().is_empty());
        drop(sub);
    }
}
