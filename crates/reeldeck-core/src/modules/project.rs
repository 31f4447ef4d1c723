// crates/reeldeck-core/src/modules/project.rs
//
// §4.5 Project Persistence orchestration. Phase-2: depends on the
// phase-1/phase-2 siblings it assembles a save from, all passed by
// reference at the call site rather than held — consistent with §5's
// "cross-module effects flow through public operations."
//
// Grounded on `velocut-ui/src/helpers/reset.rs` for the overall
// save/restore round-trip shape and `velocut-ui/src/paths.rs` for the
// project-directory layout this depends on via [`crate::fs::ProjectFilesystem`].

use super::config::ConfigModule;
use super::media::{MediaModule, SourceStatus};
use super::timeline::TimelineModule;
use super::tracks::TracksModule;
use crate::error::{CoreError, CoreResult};
use crate::fs::ProjectFilesystem;
use crate::ids::{MediaId, TrackId};
use crate::media_item::MediaType;
use crate::project::{PersistedMediaItem, PersistedTimeline, PersistedTimelineItem, PersistedTrack, ProjectMeta, UnifiedProjectConfig};
use crate::timeline_item::{TimelineItem, TimelineStatus};
use crate::track::Track;

pub struct ProjectModule {
    meta: ProjectMeta,
    is_project_settings_ready: bool,
}

impl ProjectModule {
    pub fn new(meta: ProjectMeta) -> Self {
        Self { meta, is_project_settings_ready: false }
    }

    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    pub fn is_project_settings_ready(&self) -> bool {
        self.is_project_settings_ready
    }

    /// §4.5 `saveCurrentProject`.
    pub fn save_current_project(
        &mut self,
        now: i64,
        fs: &dyn ProjectFilesystem,
        config: &ConfigModule,
        tracks: &TracksModule,
        timeline: &TimelineModule,
        media: &MediaModule,
    ) -> CoreResult<()> {
        self.meta.updated_at = now;

        let persisted_tracks = tracks
            .all()
            .iter()
            .map(|t| PersistedTrack {
                id: t.id,
                name: t.name.clone(),
                kind: t.kind,
                is_visible: t.is_visible,
                is_muted: t.is_muted,
                row_height_px: t.row_height_px,
            })
            .collect();

        let persisted_items = timeline
            .all()
            .iter()
            .map(|item| PersistedTimelineItem {
                id: item.id,
                media_id: item.media_id,
                track_id: item.track_id,
                media_type: item.media_type,
                time_range: item.time_range,
                config: item.config.clone(),
                animation: item.animation.clone(),
            })
            .collect();

        let persisted_media = media
            .all()
            .iter()
            .map(|m| PersistedMediaItem {
                id: m.id,
                name: m.name.clone(),
                created_at: m.created_at,
                media_type: m.media_type,
                duration: m.duration,
                source: m.source.to_persisted(),
            })
            .collect();

        let mut settings = config.settings().clone();
        settings.timeline_duration_frames = settings.timeline_duration_frames.max(timeline.required_timeline_duration_frames());

        let unified = UnifiedProjectConfig {
            meta: self.meta.clone(),
            settings,
            timeline: PersistedTimeline { tracks: persisted_tracks, timeline_items: persisted_items, media_items: persisted_media },
        };

        fs.save_config(&unified)?;

        let in_use: std::collections::HashSet<String> =
            media.all().iter().filter_map(|m| m.source.media_reference_id()).map(|id| id.to_string()).collect();
        if let Err(e) = fs.cleanup_unused_media_files(&in_use) {
            tracing::warn!(message = %e, "failed to clean up unused media files after save");
        }
        Ok(())
    }

    /// §4.5 `preloadProjectSettings`: read config, fill meta/settings, and
    /// only re-push a default track set if the saved config has none
    /// (normal projects restore tracks in `load_project_content` instead).
    pub fn preload_project_settings(&mut self, fs: &dyn ProjectFilesystem, config: &mut ConfigModule, tracks: &mut TracksModule) -> CoreResult<UnifiedProjectConfig> {
        let unified = fs.load_config()?;
        self.meta = unified.meta.clone();
        config.set_settings(unified.settings.clone());
        if unified.timeline.tracks.is_empty() {
            tracks.clear_all(Track::default_set());
        }
        self.is_project_settings_ready = true;
        Ok(unified)
    }

    /// §4.5 `loadProjectContent`, reporting progress through `on_progress`
    /// (stage name, percent). Never throws on missing media (§8 S5) — the
    /// affected items become `missing`/`error` instead.
    pub fn load_project_content(
        &mut self,
        fs: &dyn ProjectFilesystem,
        config: &mut ConfigModule,
        media: &mut MediaModule,
        tracks: &mut TracksModule,
        timeline: &mut TimelineModule,
        mut on_progress: impl FnMut(&str, u8),
    ) -> CoreResult<()> {
        on_progress("reload-config", 0);
        let unified = fs.load_config()?;
        self.meta = unified.meta.clone();
        config.set_settings(unified.settings.clone());

        on_progress("rebuild-media", 25);
        let mut media_status: std::collections::HashMap<MediaId, bool> = std::collections::HashMap::new();
        for saved in &unified.timeline.media_items {
            let source = saved.source.to_runtime();
            media.add_with_id(saved.id, saved.name.clone(), saved.created_at, saved.media_type, source);
            let reference_id = saved.source.media_reference_id.clone();
            let present = reference_id.as_deref().is_some_and(|r| fs.media_exists(r));
            media_status.insert(saved.id, present);
            if present {
                // Acquisition/decode is driven by the caller (reeldeck-engine)
                // after load; mark it in-flight rather than guessing readiness.
                let _ = media.apply_source_status(saved.id, SourceStatus::Acquiring);
            } else {
                let _ = media.apply_source_status(saved.id, SourceStatus::Missing);
                tracing::warn!(media_id = %saved.id, "media file missing on reload; item marked missing");
            }
        }

        on_progress("restore-tracks", 50);
        let restored_tracks: Vec<Track> = unified
            .timeline
            .tracks
            .iter()
            .map(|t| Track { id: t.id, name: t.name.clone(), kind: t.kind, is_visible: t.is_visible, is_muted: t.is_muted, row_height_px: t.row_height_px })
            .collect();
        tracks.clear_all(restored_tracks);

        on_progress("restore-timeline", 75);
        for saved in &unified.timeline.timeline_items {
            if tracks.get(saved.track_id).is_none() {
                return Err(CoreError::Validation { message: format!("timeline item {} references missing track {}", saved.id, saved.track_id) });
            }
            let status = match saved.media_id {
                Some(media_id) => {
                    if !media.all().iter().any(|m| m.id == media_id) {
                        return Err(CoreError::Validation { message: format!("timeline item {} references missing media {}", saved.id, media_id) });
                    }
                    if media_status.get(&media_id).copied() == Some(false) {
                        TimelineStatus::Error
                    } else {
                        TimelineStatus::Loading
                    }
                }
                None => TimelineStatus::Loading,
            };
            let item = TimelineItem {
                id: saved.id,
                media_id: saved.media_id,
                track_id: saved.track_id,
                media_type: saved.media_type,
                status,
                time_range: saved.time_range,
                config: saved.config.clone(),
                animation: saved.animation.clone(),
                has_sprite: false,
            };
            timeline.add(item);
        }

        on_progress("done", 100);
        Ok(())
    }
}

/// Text items carry no `mediaItemId`; used by callers constructing a fresh
/// item before `TimelineModule::add` when no media backs it.
pub fn is_text_media_type(media_type: MediaType) -> bool {
    media_type == MediaType::Text
}

/// Reassigns a default track when an item was constructed without one
/// (§4.2 add-semantics "If the item lacks a trackId, assign the first
/// track").
pub fn resolve_track_id(requested: Option<TrackId>, tracks: &TracksModule) -> CoreResult<TrackId> {
    match requested {
        Some(id) if tracks.get(id).is_some() => Ok(id),
        Some(id) => Err(CoreError::TrackNotFound(id)),
        None => tracks.first_id().ok_or_else(|| CoreError::Validation { message: "no tracks available".into() }),
    }
}
