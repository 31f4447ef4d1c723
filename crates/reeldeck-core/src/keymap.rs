// crates/reeldeck-core/src/keymap.rs
//
// The pure keyboard surface (§6): a host UI (out of scope, §1) translates
// raw key events into `EditorAction`s through `resolve`, which never touches
// any windowing crate so the core stays embeddable in a browser (WASM) or
// a native shell alike.
//
// Grounded on the binding-name convention in `velocut-ui/src/app.rs`'s
// keydown handler (`"Meta+z"` / `"Control+z"` / `"Shift"` dispatch), adapted
// into a data-driven function instead of a DOM event listener.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// True on either Ctrl (Windows/Linux) or Cmd (macOS) — the spec
    /// specifies one binding that both platforms' "primary modifier" keys
    /// trigger (§6).
    fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Where focus currently sits in the host UI. Text/range-slider focus
/// suppresses undo/redo so typing "z" in a caption field or dragging a
/// slider doesn't also rewrite history (§6 "input-field suppression").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusKind {
    Normal,
    TextInput,
    RangeSlider,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorAction {
    Undo,
    Redo,
}

/// Resolve a raw key event into an [`EditorAction`], or `None` if the key
/// combination has no binding or focus suppresses it (§6).
pub fn resolve(key: &str, modifiers: Modifiers, focus: FocusKind) -> Option<EditorAction> {
    if matches!(focus, FocusKind::TextInput | FocusKind::RangeSlider) {
        return None;
    }
    if !modifiers.primary() {
        return None;
    }
    match key.to_ascii_lowercase().as_str() {
        "z" if modifiers.shift => Some(EditorAction::Redo),
        "z" => Some(EditorAction::Undo),
        "y" => Some(EditorAction::Redo),
        _ => None,
    }
}
