// crates/reeldeck-core/src/timeline_item.rs
//
// TimeRange, TimelineItem, and the per-media-type config/animation shapes
// (§3). The teacher's `TimelineClip` is flat (`start_time`, `duration`,
// `source_offset`, `playback_rate` implied 1.0) — generalized here into the
// richer variant-per-media-type TimeRange and config the spec requires.

use crate::error::{CoreError, CoreResult};
use crate::ids::{MediaId, TimelineItemId, TrackId};
use crate::media_item::MediaType;
use serde::{Deserialize, Serialize};

/// §3 TimeRange. Video/audio carry a source clip range and playback rate;
/// image/text only carry their placement on the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TimeRange {
    ClipBacked {
        timeline_start: i64,
        timeline_end: i64,
        clip_start: i64,
        clip_end: i64,
        playback_rate: f64,
    },
    Fixed {
        timeline_start: i64,
        timeline_end: i64,
    },
}

impl TimeRange {
    pub fn timeline_start(&self) -> i64 {
        match self {
            TimeRange::ClipBacked { timeline_start, .. } => *timeline_start,
            TimeRange::Fixed { timeline_start, .. } => *timeline_start,
        }
    }

    pub fn timeline_end(&self) -> i64 {
        match self {
            TimeRange::ClipBacked { timeline_end, .. } => *timeline_end,
            TimeRange::Fixed { timeline_end, .. } => *timeline_end,
        }
    }

    pub fn duration(&self) -> i64 {
        self.timeline_end() - self.timeline_start()
    }

    /// §3 invariants: `timelineStart <= timelineEnd`, `timelineStart >= 0`,
    /// and for clip-backed ranges `(clipEnd-clipStart)/playbackRate ==
    /// (timelineEnd-timelineStart)` within ±1 frame (§8 invariant 4).
    pub fn validate(&self) -> CoreResult<()> {
        if self.timeline_start() < 0 {
            return Err(CoreError::Validation { message: "timelineStart must be >= 0".into() });
        }
        if self.timeline_start() > self.timeline_end() {
            return Err(CoreError::Validation { message: "timelineStart must be <= timelineEnd".into() });
        }
        if let TimeRange::ClipBacked { clip_start, clip_end, playback_rate, .. } = self {
            if *playback_rate <= 0.0 {
                return Err(CoreError::Validation { message: "playbackRate must be > 0".into() });
            }
            let expected_duration = ((*clip_end - *clip_start) as f64 / playback_rate).round() as i64;
            if !crate::time::within_frame_tolerance(expected_duration, self.duration(), 1) {
                return Err(CoreError::Validation {
                    message: format!(
                        "clip/timeline duration mismatch: expected {expected_duration}, got {}",
                        self.duration()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Move the range so it starts at `new_start`, preserving duration
    /// (§4.2 "Position updates … Duration is preserved").
    pub fn moved_to(&self, new_start: i64) -> TimeRange {
        let new_start = new_start.max(0);
        let duration = self.duration();
        match self {
            TimeRange::ClipBacked { clip_start, clip_end, playback_rate, .. } => TimeRange::ClipBacked {
                timeline_start: new_start,
                timeline_end: new_start + duration,
                clip_start: *clip_start,
                clip_end: *clip_end,
                playback_rate: *playback_rate,
            },
            TimeRange::Fixed { .. } => TimeRange::Fixed {
                timeline_start: new_start,
                timeline_end: new_start + duration,
            },
        }
    }

    /// Rescale playback rate, recomputing the timeline duration and
    /// returning the scale factor to apply to keyframe positions (§8 S3).
    pub fn with_playback_rate(&self, new_rate: f64) -> CoreResult<(TimeRange, f64)> {
        match self {
            TimeRange::ClipBacked { timeline_start, clip_start, clip_end, playback_rate, .. } => {
                if new_rate <= 0.0 {
                    return Err(CoreError::Validation { message: "playbackRate must be > 0".into() });
                }
                let new_duration = ((*clip_end - *clip_start) as f64 / new_rate).round() as i64;
                let scale = *playback_rate / new_rate;
                Ok((
                    TimeRange::ClipBacked {
                        timeline_start: *timeline_start,
                        timeline_end: timeline_start + new_duration,
                        clip_start: *clip_start,
                        clip_end: *clip_end,
                        playback_rate: new_rate,
                    },
                    scale,
                ))
            }
            TimeRange::Fixed { .. } => Err(CoreError::Validation {
                message: "playbackRate only applies to clip-backed ranges".into(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineStatus {
    Loading,
    Ready,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualConfig {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub opacity: f64,
    pub z_index: i32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, width: 0.0, height: 0.0, rotation: 0.0, opacity: 1.0, z_index: 0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub volume: f64,
    pub is_muted: bool,
    pub gain_db: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { volume: 1.0, is_muted: false, gain_db: 0.0 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub color: String,
}

/// Type-specific config (§3 "config (type-specific)").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemConfig {
    Visual(VisualConfig),
    Audio(AudioConfig),
    VideoAndAudio { visual: VisualConfig, audio: AudioConfig },
    Text { visual: VisualConfig, style: TextStyle },
}

impl ItemConfig {
    pub fn visual(&self) -> Option<&VisualConfig> {
        match self {
            ItemConfig::Visual(v) => Some(v),
            ItemConfig::VideoAndAudio { visual, .. } => Some(visual),
            ItemConfig::Text { visual, .. } => Some(visual),
            ItemConfig::Audio(_) => None,
        }
    }

    pub fn visual_mut(&mut self) -> Option<&mut VisualConfig> {
        match self {
            ItemConfig::Visual(v) => Some(v),
            ItemConfig::VideoAndAudio { visual, .. } => Some(visual),
            ItemConfig::Text { visual, .. } => Some(visual),
            ItemConfig::Audio(_) => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioConfig> {
        match self {
            ItemConfig::Audio(a) => Some(a),
            ItemConfig::VideoAndAudio { audio, .. } => Some(audio),
            _ => None,
        }
    }

    pub fn audio_mut(&mut self) -> Option<&mut AudioConfig> {
        match self {
            ItemConfig::Audio(a) => Some(a),
            ItemConfig::VideoAndAudio { audio, .. } => Some(audio),
            _ => None,
        }
    }
}

/// A partial update to [`VisualConfig`] — used by `updateTransform` and by
/// the sprite `propsChange` listener, which only carries changed sub-fields
/// (§4.2).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisualConfigPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub opacity: Option<f64>,
    pub z_index: Option<i32>,
}

impl VisualConfigPatch {
    pub fn apply(&self, base: VisualConfig) -> VisualConfig {
        VisualConfig {
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            rotation: self.rotation.unwrap_or(base.rotation),
            opacity: self.opacity.unwrap_or(base.opacity),
            z_index: self.z_index.unwrap_or(base.z_index),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == VisualConfigPatch::default()
    }
}

/// A keyframe at a frame position relative to the clip's own start (§3, §4.3
/// "keyframe list, relative frames within the clip").
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub relative_frame: i64,
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub keyframes: Vec<Keyframe>,
}

impl Animation {
    /// Rescale every keyframe's relative position by `scale` (§8 S3:
    /// playback-rate changes rescale keyframes proportionally), rounding to
    /// the nearest frame.
    pub fn rescaled(&self, scale: f64) -> Animation {
        Animation {
            keyframes: self
                .keyframes
                .iter()
                .map(|k| Keyframe { relative_frame: (k.relative_frame as f64 * scale).round() as i64, value: k.value })
                .collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TimelineItem {
    pub id: TimelineItemId,
    pub media_id: Option<MediaId>,
    pub track_id: TrackId,
    pub media_type: MediaType,
    pub status: TimelineStatus,
    pub time_range: TimeRange,
    pub config: ItemConfig,
    pub animation: Animation,
    /// Transient — owns the sprite once `status == Ready`. Never serialized
    /// (§4.5 step 2 "clone each timeline item via a factory that strips
    /// `runtime`").
    pub has_sprite: bool,
}

impl TimelineItem {
    /// §8 invariant 2/3: a ready item has a sprite; every item's range has
    /// non-negative start and non-negative duration.
    pub fn satisfies_ready_invariant(&self) -> bool {
        if self.status != TimelineStatus::Ready {
            return true;
        }
        self.has_sprite
    }

    pub fn satisfies_range_invariant(&self) -> bool {
        self.time_range.timeline_start() >= 0 && self.time_range.duration() >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_range(start: i64, end: i64) -> TimeRange {
        TimeRange::ClipBacked {
            timeline_start: start,
            timeline_end: end,
            clip_start: 0,
            clip_end: end - start,
            playback_rate: 1.0,
        }
    }

    #[test]
    fn moved_to_preserves_duration_and_clamps_negative() {
        let range = clip_range(10, 100);
        let moved = range.moved_to(-5);
        assert_eq!(moved.timeline_start(), 0);
        assert_eq!(moved.duration(), 90);
    }

    #[test]
    fn playback_rate_change_rescales_duration_and_keyframes() {
        // §8 S3: a 90-frame clip at rate 2 becomes ~45 frames.
        let range = TimeRange::ClipBacked {
            timeline_start: 0,
            timeline_end: 90,
            clip_start: 0,
            clip_end: 90,
            playback_rate: 1.0,
        };
        let (rescaled, scale) = range.with_playback_rate(2.0).unwrap();
        assert_eq!(rescaled.duration(), 45);

        let anim = Animation {
            keyframes: vec![
                Keyframe { relative_frame: 0, value: 0.0 },
                Keyframe { relative_frame: 45, value: 0.5 },
                Keyframe { relative_frame: 89, value: 1.0 },
            ],
        };
        let rescaled_anim = anim.rescaled(scale);
        assert_eq!(rescaled_anim.keyframes[0].relative_frame, 0);
        assert!((rescaled_anim.keyframes[1].relative_frame - 22).abs() <= 1);
        assert!((rescaled_anim.keyframes[2].relative_frame - 44).abs() <= 1);

        // Setting the rate back to 1 restores duration within tolerance.
        let (restored, scale_back) = rescaled.with_playback_rate(1.0).unwrap();
        assert!(crate::time::within_frame_tolerance(restored.duration(), 90, 1));
        let restored_anim = rescaled_anim.rescaled(scale_back);
        assert!(crate::time::within_frame_tolerance(restored_anim.keyframes[2].relative_frame, 89, 1));
    }

    #[test]
    fn clip_backed_range_validates_duration_against_playback_rate() {
        let bad = TimeRange::ClipBacked {
            timeline_start: 0,
            timeline_end: 100,
            clip_start: 0,
            clip_end: 90,
            playback_rate: 1.0,
        };
        assert!(bad.validate().is_err());

        let good = TimeRange::ClipBacked {
            timeline_start: 0,
            timeline_end: 45,
            clip_start: 0,
            clip_end: 90,
            playback_rate: 2.0,
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn visual_config_patch_only_touches_present_fields() {
        let base = VisualConfig { x: 1.0, y: 2.0, width: 3.0, height: 4.0, rotation: 0.0, opacity: 1.0, z_index: 0 };
        let patch = VisualConfigPatch { x: Some(9.0), ..Default::default() };
        let applied = patch.apply(base);
        assert_eq!(applied.x, 9.0);
        assert_eq!(applied.y, 2.0);
    }
}
