// crates/reeldeck-core/src/modules/selection.rs
//
// §4.7 "Selection": a single set is the source of truth; everything else
// is derived. Phase-2 (selection tracks timeline item ids, so it is listed
// alongside the other phase-2 modules in §2, though it has no direct field
// dependency on TimelineModule — ids are looked up lazily by callers).

use crate::broadcaster::{Broadcaster, SubscriptionId};
use crate::ids::TimelineItemId;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    Replace,
    Toggle,
}

pub struct SelectionModule {
    selected: HashSet<TimelineItemId>,
    broadcaster: Broadcaster<HashSet<TimelineItemId>>,
}

impl SelectionModule {
    pub fn new() -> Self {
        Self { selected: HashSet::new(), broadcaster: Broadcaster::new() }
    }

    pub fn selected(&self) -> &HashSet<TimelineItemId> {
        &self.selected
    }

    pub fn selected_timeline_item_id(&self) -> Option<TimelineItemId> {
        if self.selected.len() == 1 {
            self.selected.iter().next().copied()
        } else {
            None
        }
    }

    pub fn is_multi_select_mode(&self) -> bool {
        self.selected.len() > 1
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn apply(&mut self, ids: &[TimelineItemId], mode: SelectionMode) {
        match mode {
            SelectionMode::Replace => {
                self.selected.clear();
                self.selected.extend(ids.iter().copied());
            }
            SelectionMode::Toggle => {
                for id in ids {
                    if !self.selected.remove(id) {
                        self.selected.insert(*id);
                    }
                }
            }
        }
        self.notify();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.notify();
    }

    /// Called when a timeline item is removed elsewhere, so a stale id
    /// never lingers in the selection set.
    pub fn remove_id(&mut self, id: TimelineItemId) {
        if self.selected.remove(&id) {
            self.notify();
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&HashSet<TimelineItemId>)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }

    fn notify(&self) {
        self.broadcaster.notify(&self.selected);
    }
}

impl Default for SelectionModule {
    fn default() -> Self {
        Self::new()
    }
}
