use egui::Vec2;

/// Options shared by the [`crate::Factory`], the [`crate::DockManager`] and the drag state
/// machine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DockOptions {
    /// Horizontal pointer travel (in points) required before a press becomes a drag.
    pub minimum_horizontal_drag_distance: f32,

    /// Vertical pointer travel (in points) required before a press becomes a drag.
    pub minimum_vertical_drag_distance: f32,

    /// Share of the parent given to the newly inserted dock on an edge split.
    pub split_proportion: f32,

    /// Smallest proportion a splitter drag may leave on either neighbour.
    pub minimum_proportion: f32,

    /// Width of each edge band, as a fraction of the drop target's width (or height).
    ///
    /// The center (`Fill`) zone is what remains.
    pub edge_fraction: f32,

    /// Thickness (in points) of the outer ring of a drop target that resolves to `Window`.
    pub window_margin: f32,

    /// Size of a floating window when the dragged element's size is unknown.
    pub default_window_size: Vec2,

    /// Floating windows are never created smaller than this.
    pub minimum_window_size: Vec2,

    /// If true, releasing a drag outside every drop area floats the dragged dockable into a new
    /// window at the release point.
    ///
    /// Off by default: a release over nothing leaves the layout untouched.
    pub float_on_release_outside: bool,

    /// If true, record drag/drop decisions in a small ring buffer (see
    /// [`crate::Factory::debug_log_text`]).
    pub debug_event_log: bool,

    /// Maximum number of debug log lines to keep (ring buffer).
    pub debug_event_log_capacity: usize,

    /// If true, run tree integrity checks after every factory mutation.
    pub debug_integrity: bool,

    /// If true, panic on integrity issues (debug-only).
    pub debug_integrity_panic: bool,
}

impl Default for DockOptions {
    fn default() -> Self {
        Self {
            minimum_horizontal_drag_distance: 4.0,
            minimum_vertical_drag_distance: 4.0,
            split_proportion: 0.5,
            minimum_proportion: 0.05,
            edge_fraction: 0.25,
            window_margin: 8.0,
            default_window_size: Vec2::new(480.0, 360.0),
            minimum_window_size: Vec2::new(200.0, 120.0),
            float_on_release_outside: false,
            debug_event_log: false,
            debug_event_log_capacity: 200,
            debug_integrity: cfg!(debug_assertions),
            debug_integrity_panic: false,
        }
    }
}

impl DockOptions {
    /// Has the pointer travelled far enough from `origin` to start a drag?
    pub(crate) fn exceeds_drag_threshold(&self, delta: Vec2) -> bool {
        delta.x.abs() > self.minimum_horizontal_drag_distance
            || delta.y.abs() > self.minimum_vertical_drag_distance
    }

    pub(crate) fn clamped_split_proportion(&self) -> f32 {
        let min = self.minimum_proportion.clamp(0.0, 0.5);
        self.split_proportion.clamp(min, 1.0 - min)
    }

    pub(crate) fn window_size_for(&self, source_size: Option<Vec2>) -> Vec2 {
        source_size
            .map(|s| s.max(self.minimum_window_size))
            .unwrap_or(self.default_window_size)
    }
}
