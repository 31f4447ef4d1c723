// crates/reeldeck-core/src/registry.rs
//
// §2 "module registry … phase 1 instantiates leaf modules, phase 2
// instantiates modules that depend on phase-1 state." `TracksModule`,
// `TimelineModule`, and `SelectionModule` are additionally wrapped in
// `Rc<RefCell<_>>` here (and only here) — `operations.rs`'s undoable
// commands close over these handles directly, since a boxed `Command`
// trait object can't borrow from the registry that constructed it. Every
// other module is held by plain ownership and reached through `&`/`&mut`
// at the call site, per §5 "cross-module effects flow through public
// operations."
//
// Cross-module cascades (§4.1/§3 "removal cascades") are wired here as
// broadcaster subscriptions rather than direct calls, keeping
// `TracksModule`/`MediaModule` ignorant of `TimelineModule`'s existence.

use crate::canvas::{CanvasEngine, CanvasEngineAdapter};
use crate::modules::autosave::AutoSaveModule;
use crate::modules::config::ConfigModule;
use crate::modules::history::HistoryModule;
use crate::modules::media::{MediaEvent, MediaModule};
use crate::modules::notifications::NotificationsModule;
use crate::modules::operations::OperationsModule;
use crate::modules::playback::PlaybackModule;
use crate::modules::project::ProjectModule;
use crate::modules::selection::SelectionModule;
use crate::modules::snap::SnapModule;
use crate::modules::thumbnail::ThumbnailModule;
use crate::modules::timeline::TimelineModule;
use crate::modules::tracks::{TrackEvent, TracksModule};
use crate::modules::viewport::ViewportModule;
use crate::project::ProjectMeta;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

pub struct Phase1Modules {
    pub config: ConfigModule,
    pub playback: PlaybackModule,
    pub canvas: Arc<CanvasEngineAdapter>,
    pub media: MediaModule,
    pub tracks: Rc<RefCell<TracksModule>>,
    pub notifications: NotificationsModule,
}

impl Phase1Modules {
    fn new(canvas_engine: Arc<dyn CanvasEngine>) -> Self {
        Self {
            config: ConfigModule::new(),
            playback: PlaybackModule::new(),
            canvas: Arc::new(CanvasEngineAdapter::new(canvas_engine)),
            media: MediaModule::new(),
            tracks: Rc::new(RefCell::new(TracksModule::new())),
            notifications: NotificationsModule::new(),
        }
    }
}

pub struct Phase2Modules {
    pub timeline: Rc<RefCell<TimelineModule>>,
    pub project: ProjectModule,
    pub viewport: ViewportModule,
    pub history: HistoryModule,
    pub selection: Rc<RefCell<SelectionModule>>,
    pub autosave: AutoSaveModule,
    pub thumbnail: ThumbnailModule,
    pub snap: SnapModule,
    pub operations: OperationsModule,
}

impl Phase2Modules {
    fn new(phase1: &Phase1Modules, project_meta: ProjectMeta) -> Self {
        Self {
            timeline: Rc::new(RefCell::new(TimelineModule::new(phase1.canvas.clone()))),
            project: ProjectModule::new(project_meta),
            viewport: ViewportModule::new(),
            history: HistoryModule::new(),
            selection: Rc::new(RefCell::new(SelectionModule::new())),
            autosave: AutoSaveModule::new(phase1.config.autosave()),
            thumbnail: ThumbnailModule::new(),
            snap: SnapModule::new(),
            operations: OperationsModule::new(),
        }
    }
}

pub struct ModuleRegistry {
    pub phase1: Phase1Modules,
    pub phase2: Phase2Modules,
}

impl ModuleRegistry {
    /// Construct both phases and wire the removal cascades (§4.1, §3, §4.7
    /// "stale selection ids never linger").
    pub fn new(canvas_engine: Arc<dyn CanvasEngine>, project_meta: ProjectMeta) -> Self {
        let mut phase1 = Phase1Modules::new(canvas_engine);
        let phase2 = Phase2Modules::new(&phase1, project_meta);

        let timeline_for_tracks = phase2.timeline.clone();
        phase1.tracks.borrow_mut().subscribe(Box::new(move |event: &TrackEvent| {
            if let TrackEvent::Removed(track_id) = event {
                timeline_for_tracks.borrow_mut().remove_all_on_track(*track_id);
            }
        }));

        let timeline_for_media = phase2.timeline.clone();
        phase1.media.subscribe(Box::new(move |event: &MediaEvent| {
            if let MediaEvent::Removed(media_id) = event {
                timeline_for_media.borrow_mut().remove_all_for_media(*media_id);
            }
        }));

        let selection_for_timeline = phase2.selection.clone();
        phase2.timeline.borrow_mut().subscribe(Box::new(move |event: &crate::modules::timeline::TimelineEvent| {
            if let crate::modules::timeline::TimelineEvent::Removed(item_id) = event {
                selection_for_timeline.borrow_mut().remove_id(*item_id);
            }
        }));

        Self { phase1, phase2 }
    }
}
