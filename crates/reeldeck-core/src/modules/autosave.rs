// crates/reeldeck-core/src/modules/autosave.rs
//
// §4.6 Auto-Save Engine. Scheduling logic only — actually performing a
// save (assembling `UnifiedProjectConfig`, writing through
// `ProjectFilesystem`) is `modules::project`'s job; this module answers
// "is it time to save" and tracks retry backoff, matching the single-
// threaded cooperative scheduling model of §5 (no real timers — callers
// drive it with an explicit `now: Instant` on each tick).

use super::config::AutoSaveConfig;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveTrigger {
    Debounce,
    Throttle,
    Retry,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutoSaveState {
    pub is_enabled: bool,
    pub is_dirty: bool,
    pub is_saving: bool,
    pub save_count: u32,
    pub error_count: u32,
}

pub struct AutoSaveModule {
    config: AutoSaveConfig,
    is_enabled: bool,
    is_dirty: bool,
    is_saving: bool,
    save_count: u32,
    error_count: u32,
    last_save_time: Option<Instant>,
    debounce_deadline: Option<Instant>,
    throttle_deadline: Option<Instant>,
    retry_attempt: u32,
    retry_at: Option<Instant>,
}

impl AutoSaveModule {
    pub fn new(config: AutoSaveConfig) -> Self {
        Self {
            is_enabled: config.enabled,
            config,
            is_dirty: false,
            is_saving: false,
            save_count: 0,
            error_count: 0,
            last_save_time: None,
            debounce_deadline: None,
            throttle_deadline: None,
            retry_attempt: 0,
            retry_at: None,
        }
    }

    pub fn state(&self) -> AutoSaveState {
        AutoSaveState {
            is_enabled: self.is_enabled,
            is_dirty: self.is_dirty,
            is_saving: self.is_saving,
            save_count: self.save_count,
            error_count: self.error_count,
        }
    }

    pub fn last_save_time(&self) -> Option<Instant> {
        self.last_save_time
    }

    /// A deep-watcher fired on `{timelineItems, tracks, mediaItems,
    /// projectConfig}` (§4.6): marks dirty, (re)arms the trailing debounce,
    /// and arms the throttle deadline only once per dirty streak so a
    /// continuous stream of edits still forces a save every
    /// `throttleTime` (§4.6).
    pub fn mark_dirty(&mut self, now: Instant) {
        if !self.is_enabled {
            return;
        }
        self.is_dirty = true;
        self.debounce_deadline = Some(now + Duration::from_millis(self.config.debounce_ms));
        if self.throttle_deadline.is_none() {
            self.throttle_deadline = Some(now + Duration::from_millis(self.config.throttle_ms));
        }
    }

    /// Whether a save should run now, and why. A pending retry preempts
    /// normal debounce/throttle scheduling.
    pub fn due_for_save(&self, now: Instant) -> Option<SaveTrigger> {
        if !self.is_enabled || self.is_saving || !self.is_dirty {
            return None;
        }
        if let Some(retry_at) = self.retry_at {
            return if now >= retry_at { Some(SaveTrigger::Retry) } else { None };
        }
        if self.debounce_deadline.is_some_and(|d| now >= d) {
            return Some(SaveTrigger::Debounce);
        }
        if self.throttle_deadline.is_some_and(|t| now >= t) {
            return Some(SaveTrigger::Throttle);
        }
        None
    }

    /// §4.6 "A save call is a no-op if the project module is already
    /// saving." Returns `false` when a save is already in flight.
    pub fn begin_save(&mut self) -> bool {
        if self.is_saving {
            return false;
        }
        self.is_saving = true;
        true
    }

    /// Record the outcome of a save attempt started via [`Self::begin_save`].
    pub fn record_save_result(&mut self, now: Instant, result: Result<(), String>) {
        self.is_saving = false;
        match result {
            Ok(()) => {
                self.is_dirty = false;
                self.last_save_time = Some(now);
                self.save_count += 1;
                self.debounce_deadline = None;
                self.throttle_deadline = None;
                self.retry_attempt = 0;
                self.retry_at = None;
            }
            Err(message) => {
                self.error_count += 1;
                tracing::error!(attempt = self.retry_attempt + 1, message = %message, "auto-save failed");
                if self.retry_attempt < self.config.max_retries {
                    self.retry_attempt += 1;
                    self.retry_at = Some(now + Duration::from_secs(5 * self.retry_attempt as u64));
                } else {
                    self.retry_at = None;
                }
            }
        }
    }

    pub fn enable(&mut self) {
        self.is_enabled = true;
    }

    /// Cancels pending timers and removes watchers (§4.6); idempotent.
    pub fn disable(&mut self) {
        self.is_enabled = false;
        self.debounce_deadline = None;
        self.throttle_deadline = None;
        self.retry_at = None;
        self.retry_attempt = 0;
    }

    pub fn destroy(&mut self) {
        self.disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AutoSaveConfig {
        AutoSaveConfig { debounce_ms: 2000, throttle_ms: 30_000, max_retries: 3, enabled: true }
    }

    #[test]
    fn debounce_fires_after_quiet_period_but_not_before() {
        let mut autosave = AutoSaveModule::new(config());
        let t0 = Instant::now();
        autosave.mark_dirty(t0);
        assert_eq!(autosave.due_for_save(t0 + Duration::from_millis(500)), None);
        assert_eq!(autosave.due_for_save(t0 + Duration::from_millis(2001)), Some(SaveTrigger::Debounce));
    }

    #[test]
    fn continuous_edits_force_a_throttled_save_within_the_window() {
        let mut autosave = AutoSaveModule::new(config());
        let t0 = Instant::now();
        let mut t = t0;
        let mut forced = false;
        while t < t0 + Duration::from_secs(45) {
            autosave.mark_dirty(t);
            if autosave.due_for_save(t) == Some(SaveTrigger::Throttle) {
                forced = true;
                break;
            }
            t += Duration::from_millis(500);
        }
        assert!(forced, "throttle should force a save within the 30s window");
    }

    #[test]
    fn failed_save_schedules_linear_backoff_capped_at_max_retries() {
        let mut autosave = AutoSaveModule::new(config());
        let t0 = Instant::now();
        autosave.mark_dirty(t0);
        autosave.begin_save();
        autosave.record_save_result(t0, Err("disk full".into()));
        assert_eq!(autosave.state().error_count, 1);
        assert_eq!(autosave.due_for_save(t0 + Duration::from_secs(4)), None);
        assert_eq!(autosave.due_for_save(t0 + Duration::from_secs(6)), Some(SaveTrigger::Retry));
    }

    #[test]
    fn successful_save_clears_dirty_and_increments_save_count() {
        let mut autosave = AutoSaveModule::new(config());
        let t0 = Instant::now();
        autosave.mark_dirty(t0);
        autosave.begin_save();
        autosave.record_save_result(t0, Ok(()));
        assert!(!autosave.state().is_dirty);
        assert_eq!(autosave.state().save_count, 1);
    }

    #[test]
    fn begin_save_is_a_no_op_while_already_saving() {
        let mut autosave = AutoSaveModule::new(config());
        assert!(autosave.begin_save());
        assert!(!autosave.begin_save());
    }
}
