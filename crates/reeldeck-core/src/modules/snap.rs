// crates/reeldeck-core/src/modules/snap.rs
//
// §4.7 "Snap". Candidates are assembled by the caller at drag start (this
// module has no dependency on TimelineModule to read clip boundaries
// itself — consistent with §5 "each module owns its slice; cross-module
// effects flow through public operations") and cached until drag end.
// `calculate_snap_position` is a pure function of `(frame, cache,
// threshold, enabled)` per §8 invariant 10.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapPriority {
    ClipBoundaryOrPlayhead = 1,
    Keyframe = 2,
    TimelineStart = 3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapCandidate {
    pub frame: i64,
    pub priority: SnapPriority,
}

impl SnapCandidate {
    pub fn clip_boundary(frame: i64) -> Self {
        Self { frame, priority: SnapPriority::ClipBoundaryOrPlayhead }
    }

    pub fn keyframe(clip_start: i64, relative_frame: i64) -> Self {
        Self { frame: clip_start + relative_frame, priority: SnapPriority::Keyframe }
    }

    /// §4.7 "playhead (priority 1, only when currentFrame>0)".
    pub fn playhead(current_frame: i64) -> Option<Self> {
        if current_frame > 0 {
            Some(Self { frame: current_frame, priority: SnapPriority::ClipBoundaryOrPlayhead })
        } else {
            None
        }
    }

    pub fn timeline_start() -> Self {
        Self { frame: 0, priority: SnapPriority::TimelineStart }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapCache {
    candidates: Vec<SnapCandidate>,
}

impl SnapCache {
    pub fn new(candidates: Vec<SnapCandidate>) -> Self {
        Self { candidates }
    }
}

#[derive(Default)]
pub struct SnapModule {
    cache: Option<SnapCache>,
}

impl SnapModule {
    pub fn new() -> Self {
        Self { cache: None }
    }

    pub fn begin_drag(&mut self, cache: SnapCache) {
        self.cache = Some(cache);
    }

    /// Cleared on drag end and on config-invalidating changes (`enabled`,
    /// `threshold`) per §4.7.
    pub fn end_drag(&mut self) {
        self.cache = None;
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Nearest candidate within `threshold`, or `None` if disabled, no
    /// active cache, or nothing within range. Ties on distance are broken
    /// by lower `SnapPriority` (numerically smaller = higher priority).
    pub fn calculate_snap_position(&self, frame: i64, threshold: i64, enabled: bool) -> Option<i64> {
        if !enabled {
            return None;
        }
        let cache = self.cache.as_ref()?;
        cache
            .candidates
            .iter()
            .map(|c| (c, (c.frame - frame).abs()))
            .filter(|(_, distance)| *distance <= threshold)
            .min_by_key(|(c, distance)| (*distance, c.priority))
            .map(|(c, _)| c.frame)
    }
}
