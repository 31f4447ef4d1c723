// crates/reeldeck-core/src/geometry.rs
//
// Canvas (top-left origin) <-> project (centre origin) coordinate transform,
// and the centre-preserving resize used by TimelineModule::update_transform
// (§4.2 — "applying centre-preserving resize when width/height change").

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

/// Translate a rect from WebAV canvas space (origin top-left) into project
/// space (origin at canvas centre), per §4.2's bidirectional sync contract.
///
/// ```
/// use reeldeck_core::geometry::{Rect, canvas_to_project};
/// let r = Rect { x: 960.0, y: 540.0, width: 100.0, height: 50.0, rotation: 0.0 };
/// let p = canvas_to_project(r, 1920.0, 1080.0);
/// assert_eq!((p.x, p.y), (0.0, 0.0));
/// ```
pub fn canvas_to_project(canvas_rect: Rect, canvas_width: f64, canvas_height: f64) -> Rect {
    Rect {
        x: canvas_rect.x - canvas_width / 2.0,
        y: canvas_rect.y - canvas_height / 2.0,
        ..canvas_rect
    }
}

/// Inverse of [`canvas_to_project`].
pub fn project_to_canvas(project_rect: Rect, canvas_width: f64, canvas_height: f64) -> Rect {
    Rect {
        x: project_rect.x + canvas_width / 2.0,
        y: project_rect.y + canvas_height / 2.0,
        ..project_rect
    }
}

/// Resize `rect` to `new_width`/`new_height` while holding its centre fixed —
/// the contract `updateTransform` uses when a width/height change arrives
/// programmatically rather than through a user drag on a resize handle.
pub fn resize_centered(rect: Rect, new_width: f64, new_height: f64) -> Rect {
    let cx = rect.x + rect.width / 2.0;
    let cy = rect.y + rect.height / 2.0;
    Rect {
        x: cx - new_width / 2.0,
        y: cy - new_height / 2.0,
        width: new_width,
        height: new_height,
        rotation: rect.rotation,
    }
}
