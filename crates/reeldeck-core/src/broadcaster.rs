// crates/reeldeck-core/src/broadcaster.rs
//
// The "reactive deep-watched state" pattern flagged in §9, modeled as an
// explicit observer list rather than a framework-level reactivity system.
// Every module state slice embeds a `Broadcaster<T>` and calls `notify()`
// after each mutation; auto-save, the command change-detection wrappers,
// and (eventually) a host UI attach listeners the same way.
//
// Listeners are plain `Fn(&T)`, not `Fn(&T) + Send` — the core is
// single-threaded and cooperative (§5), and the registry wires modules to
// each other through `Rc<RefCell<_>>`, which isn't `Send`.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Broadcaster<T> {
    listeners: Vec<(SubscriptionId, Box<dyn Fn(&T)>)>,
    next_id: AtomicU64,
}

impl<T> Broadcaster<T> {
    pub fn new() -> Self {
        Self { listeners: Vec::new(), next_id: AtomicU64::new(1) }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&T)>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    pub fn notify(&self, value: &T) {
        for (_, listener) in &self.listeners {
            listener(value);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}
