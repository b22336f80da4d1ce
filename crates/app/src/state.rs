use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use voromap_core::format::usd_compact;
use voromap_core::loader::{load_in_background, LoadMsg};
use voromap_core::model::Record;
use voromap_core::tessellate::PowerDiagram;
use voromap_core::{ChartLayout, NodeId};

/// Vertical gap between the pointer and the tooltip.
pub const TOOLTIP_GAP: f32 = 16.0;

/// Hover state, replaced wholesale on every pointer event so transitions
/// stay easy to reason about. At most one leaf is active at a time and the
/// tooltip is visible exactly when a leaf is active.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionState {
    pub active: Option<NodeId>,
    pub tooltip_pos: Option<(f32, f32)>,
}

impl InteractionState {
    pub fn hover(
        self,
        leaf: NodeId,
        pointer: (f32, f32),
        tooltip_size: (f32, f32),
        surface: (f32, f32),
    ) -> Self {
        InteractionState {
            active: Some(leaf),
            tooltip_pos: Some(clamp_tooltip(pointer, tooltip_size, surface)),
        }
    }

    pub fn leave(self) -> Self {
        InteractionState::default()
    }
}

/// Tooltip position for a pointer location: horizontally centered on the
/// pointer but kept inside the surface, vertically one gap above the
/// pointer. When the tooltip would poke past the top edge it flips to below
/// the pointer instead (see DESIGN.md on the upstream clamp).
pub fn clamp_tooltip(
    pointer: (f32, f32),
    tooltip_size: (f32, f32),
    surface: (f32, f32),
) -> (f32, f32) {
    let (mx, my) = pointer;
    let (tw, th) = tooltip_size;
    let (sw, _sh) = surface;
    let mut tx = mx - tw / 2.0;
    if tx < 0.0 {
        tx = 0.0;
    } else if tx + tw > sw {
        tx = sw - tw;
    }
    let mut ty = my - th - TOOLTIP_GAP;
    if ty < 0.0 {
        ty = my + TOOLTIP_GAP;
    }
    (tx, ty)
}

/// Loader URI for a leaf icon. Relative icon paths live next to the dataset,
/// so they resolve against the CSV's directory rather than the process cwd.
pub fn icon_uri(csv_path: Option<&Path>, icon: &str) -> String {
    let path = match csv_path.and_then(Path::parent) {
        Some(base) => base.join(icon),
        None => PathBuf::from(icon),
    };
    format!("file://{}", path.display())
}

pub struct AppState {
    pub csv_path: Option<PathBuf>,
    pub load_rx: Option<Receiver<LoadMsg>>,
    pub records: Option<Vec<Record>>,
    pub layout: Option<ChartLayout>,
    pub seed: u64,
    pub error: Option<String>,
    pub hover: InteractionState,
    pub value_format: fn(f64) -> String,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            csv_path: None,
            load_rx: None,
            records: None,
            layout: None,
            seed: 1,
            error: None,
            hover: InteractionState::default(),
            value_format: usd_compact,
        }
    }

    /// Kick off the one-shot background load; the pipeline continues in
    /// `poll_load` once the file has been read.
    pub fn open(&mut self, path: PathBuf) {
        self.csv_path = Some(path.clone());
        self.records = None;
        self.layout = None;
        self.error = None;
        self.hover = InteractionState::default();
        let (tx, rx) = unbounded();
        self.load_rx = Some(rx);
        load_in_background(path, tx);
    }

    /// Drain the load channel; returns true when state changed.
    pub fn poll_load(&mut self) -> bool {
        let Some(rx) = self.load_rx.take() else {
            return false;
        };
        match rx.try_recv() {
            Ok(LoadMsg::Done(records)) => {
                self.records = Some(records);
                self.relayout();
                true
            }
            Ok(LoadMsg::Error(e)) => {
                self.error = Some(e);
                true
            }
            Err(TryRecvError::Empty) => {
                self.load_rx = Some(rx);
                false
            }
            Err(TryRecvError::Disconnected) => false,
        }
    }

    /// Recompute the tessellation for the current records and seed.
    pub fn relayout(&mut self) {
        let Some(records) = &self.records else {
            return;
        };
        self.hover = InteractionState::default();
        match ChartLayout::compute(records, &PowerDiagram::default(), self.seed) {
            Ok(layout) => {
                self.layout = Some(layout);
                self.error = None;
            }
            Err(e) => {
                self.layout = None;
                self.error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: (f32, f32) = (600.0, 600.0);
    const TIP: (f32, f32) = (120.0, 60.0);

    #[test]
    fn tooltip_is_centered_on_the_pointer() {
        let (tx, ty) = clamp_tooltip((300.0, 300.0), TIP, SURFACE);
        assert_eq!(tx, 300.0 - 60.0);
        assert_eq!(ty, 300.0 - 60.0 - TOOLTIP_GAP);
    }

    #[test]
    fn tooltip_never_overflows_the_horizontal_edges() {
        for mx in [-500.0, 0.0, 10.0, 590.0, 600.0, 5000.0] {
            let (tx, _) = clamp_tooltip((mx, 300.0), TIP, SURFACE);
            assert!(tx >= 0.0);
            assert!(tx + TIP.0 <= SURFACE.0);
        }
    }

    #[test]
    fn tooltip_flips_below_the_pointer_at_the_top_edge() {
        let (_, ty) = clamp_tooltip((300.0, 10.0), TIP, SURFACE);
        assert_eq!(ty, 10.0 + TOOLTIP_GAP);
        assert!(ty >= 0.0);
    }

    #[test]
    fn icon_uris_resolve_next_to_the_dataset() {
        let csv = Path::new("/data/sets/companies.csv");
        assert_eq!(
            icon_uri(Some(csv), "company-logos/GOOG.webp"),
            "file:///data/sets/company-logos/GOOG.webp"
        );
        // no dataset path yet, fall back to the path as given
        assert_eq!(
            icon_uri(None, "company-logos/GOOG.webp"),
            "file://company-logos/GOOG.webp"
        );
    }

    #[test]
    fn hover_activates_exactly_one_leaf() {
        let s = InteractionState::default();
        let s = s.hover(NodeId(3), (300.0, 300.0), TIP, SURFACE);
        assert_eq!(s.active, Some(NodeId(3)));
        assert!(s.tooltip_pos.is_some());
    }

    #[test]
    fn moving_between_leaves_transitions_without_a_gap() {
        let s = InteractionState::default().hover(NodeId(3), (300.0, 300.0), TIP, SURFACE);
        let s = s.hover(NodeId(5), (320.0, 300.0), TIP, SURFACE);
        // one transition straight from leaf 3 to leaf 5, never through None
        assert_eq!(s.active, Some(NodeId(5)));
    }

    #[test]
    fn same_leaf_moves_only_reposition() {
        let a = InteractionState::default().hover(NodeId(3), (300.0, 300.0), TIP, SURFACE);
        let b = a.hover(NodeId(3), (310.0, 300.0), TIP, SURFACE);
        assert_eq!(a.active, b.active);
        assert_ne!(a.tooltip_pos, b.tooltip_pos);
    }

    #[test]
    fn leave_clears_active_leaf_and_tooltip_together() {
        let s = InteractionState::default().hover(NodeId(3), (300.0, 300.0), TIP, SURFACE);
        let s = s.leave();
        assert_eq!(s, InteractionState::default());
        // leaving with nothing active stays a no-op
        assert_eq!(s.leave(), InteractionState::default());
    }
}
