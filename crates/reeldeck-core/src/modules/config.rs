// crates/reeldeck-core/src/modules/config.rs
//
// Phase-1 leaf module: project-wide settings other modules read at
// construction time (§2 "module registry … phase 1 instantiates leaf
// modules"). Generalizes the teacher's flat `ProjectState` fields
// (`timeline_zoom`, `aspect_ratio`) into one settings slice instead of
// scattering defaults across every module that needs one.

use crate::broadcaster::{Broadcaster, SubscriptionId};
use crate::project::{ProjectSettings, VideoResolution};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoSaveConfig {
    pub debounce_ms: u64,
    pub throttle_ms: u64,
    pub max_retries: u32,
    pub enabled: bool,
}

impl Default for AutoSaveConfig {
    /// §4.6 literal defaults.
    fn default() -> Self {
        Self { debounce_ms: 2000, throttle_ms: 30_000, max_retries: 3, enabled: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapCategories {
    pub clip_boundaries: bool,
    pub keyframes: bool,
    pub playhead: bool,
    pub timeline_start: bool,
}

impl Default for SnapCategories {
    fn default() -> Self {
        Self { clip_boundaries: true, keyframes: true, playhead: true, timeline_start: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    pub enabled: bool,
    pub threshold: i64,
    pub categories: SnapCategories,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self { enabled: true, threshold: 5, categories: SnapCategories::default() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfigSnapshot {
    pub settings: ProjectSettings,
    pub autosave: AutoSaveConfig,
    pub snap: SnapSettings,
}

pub struct ConfigModule {
    settings: ProjectSettings,
    autosave: AutoSaveConfig,
    snap: SnapSettings,
    broadcaster: Broadcaster<ConfigSnapshot>,
}

impl ConfigModule {
    pub fn new() -> Self {
        Self {
            settings: ProjectSettings::default(),
            autosave: AutoSaveConfig::default(),
            snap: SnapSettings::default(),
            broadcaster: Broadcaster::new(),
        }
    }

    pub fn frame_rate(&self) -> f64 {
        self.settings.frame_rate
    }

    pub fn video_resolution(&self) -> &VideoResolution {
        &self.settings.video_resolution
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn autosave(&self) -> AutoSaveConfig {
        self.autosave
    }

    pub fn snap(&self) -> SnapSettings {
        self.snap
    }

    pub fn set_settings(&mut self, settings: ProjectSettings) {
        self.settings = settings;
        self.notify();
    }

    pub fn set_autosave(&mut self, autosave: AutoSaveConfig) {
        self.autosave = autosave;
        self.notify();
    }

    pub fn set_snap(&mut self, snap: SnapSettings) {
        self.snap = snap;
        self.notify();
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ConfigSnapshot)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }

    fn notify(&self) {
        self.broadcaster.notify(&ConfigSnapshot {
            settings: self.settings.clone(),
            autosave: self.autosave,
            snap: self.snap,
        });
    }
}

impl Default for ConfigModule {
    fn default() -> Self {
        Self::new()
    }
}
