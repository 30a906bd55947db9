use egui::{Pos2, Rect};

use crate::model::DockOperation;
use crate::options::DockOptions;

/// Splits a drop target into a `Window` ring, four edge bands and a `Fill` center.
///
/// Edge bands are `edge_fraction` of the target's width (left/right) or height (top/bottom),
/// measured from the target's border. A point on the line between a band and the center
/// belongs to the band. Where two bands overlap (the corners) the nearer edge wins, and exact
/// ties go to `Left`, `Right`, `Top`, `Bottom` in that order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DockZones {
    pub edge_fraction: f32,
    pub window_margin: f32,
}

impl Default for DockZones {
    fn default() -> Self {
        Self::from_options(&DockOptions::default())
    }
}

const EDGES: [DockOperation; 4] = [
    DockOperation::Left,
    DockOperation::Right,
    DockOperation::Top,
    DockOperation::Bottom,
];

impl DockZones {
    pub fn from_options(options: &DockOptions) -> Self {
        Self {
            edge_fraction: options.edge_fraction,
            window_margin: options.window_margin,
        }
    }

    fn fraction(&self) -> f32 {
        self.edge_fraction.clamp(0.0, 0.5)
    }

    /// The operation for `point` over a target laid out at `bounds`, or `None` outside it.
    pub fn resolve(&self, bounds: Rect, point: Pos2) -> Option<DockOperation> {
        if !bounds.is_positive() || !bounds.contains(point) {
            return None;
        }
        let distances = [
            point.x - bounds.min.x,
            bounds.max.x - point.x,
            point.y - bounds.min.y,
            bounds.max.y - point.y,
        ];
        let nearest = distances.iter().copied().fold(f32::INFINITY, f32::min);
        if nearest < self.window_margin.max(0.0) {
            return Some(DockOperation::Window);
        }

        let band_x = bounds.width() * self.fraction();
        let band_y = bounds.height() * self.fraction();
        let bands = [band_x, band_x, band_y, band_y];
        let edge = EDGES
            .iter()
            .zip(distances.iter().zip(bands))
            .filter(|(_, (distance, band))| **distance <= *band)
            .min_by(|(_, (a, _)), (_, (b, _))| a.total_cmp(b))
            .map(|(&op, _)| op);
        Some(edge.unwrap_or(DockOperation::Fill))
    }

    /// The area of `bounds` covered by the band for `operation`, for painting previews.
    ///
    /// Bands overlap in the corners; `Window` yields the whole target.
    pub fn band_rect(&self, bounds: Rect, operation: DockOperation) -> Rect {
        let dx = bounds.width() * self.fraction();
        let dy = bounds.height() * self.fraction();
        let (min, max) = (bounds.min, bounds.max);
        match operation {
            DockOperation::Left => Rect::from_min_max(min, Pos2::new(min.x + dx, max.y)),
            DockOperation::Right => Rect::from_min_max(Pos2::new(max.x - dx, min.y), max),
            DockOperation::Top => Rect::from_min_max(min, Pos2::new(max.x, min.y + dy)),
            DockOperation::Bottom => Rect::from_min_max(Pos2::new(min.x, max.y - dy), max),
            DockOperation::Fill => bounds.shrink2(egui::vec2(dx, dy)),
            DockOperation::Window => bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use egui::pos2;

    use super::*;

    fn zones() -> DockZones {
        DockZones {
            edge_fraction: 0.25,
            window_margin: 4.0,
        }
    }

    fn bounds() -> Rect {
        Rect::from_min_max(pos2(0.0, 0.0), pos2(200.0, 100.0))
    }

    #[test]
    fn center_and_edges() {
        let z = zones();
        assert_eq!(z.resolve(bounds(), pos2(100.0, 50.0)), Some(DockOperation::Fill));
        assert_eq!(z.resolve(bounds(), pos2(20.0, 50.0)), Some(DockOperation::Left));
        assert_eq!(z.resolve(bounds(), pos2(180.0, 50.0)), Some(DockOperation::Right));
        assert_eq!(z.resolve(bounds(), pos2(100.0, 10.0)), Some(DockOperation::Top));
        assert_eq!(z.resolve(bounds(), pos2(100.0, 90.0)), Some(DockOperation::Bottom));
    }

    #[test]
    fn margin_ring_floats_and_outside_is_nothing() {
        let z = zones();
        assert_eq!(z.resolve(bounds(), pos2(1.0, 50.0)), Some(DockOperation::Window));
        assert_eq!(z.resolve(bounds(), pos2(100.0, 99.0)), Some(DockOperation::Window));
        assert_eq!(z.resolve(bounds(), pos2(-1.0, 50.0)), None);
        assert_eq!(z.resolve(bounds(), pos2(100.0, 101.0)), None);
        assert_eq!(z.resolve(Rect::NOTHING, pos2(0.0, 0.0)), None);
    }

    #[test]
    fn band_boundary_is_deterministic_and_goes_to_the_edge() {
        let z = zones();
        // 25% of 200 wide.
        let on_line = pos2(50.0, 50.0);
        for _ in 0..3 {
            assert_eq!(z.resolve(bounds(), on_line), Some(DockOperation::Left));
        }
        assert_eq!(z.resolve(bounds(), pos2(50.01, 50.0)), Some(DockOperation::Fill));
        // 25% of 100 high.
        assert_eq!(z.resolve(bounds(), pos2(100.0, 75.0)), Some(DockOperation::Bottom));
    }

    #[test]
    fn corners_prefer_the_nearest_edge_then_fixed_order() {
        let z = zones();
        assert_eq!(z.resolve(bounds(), pos2(10.0, 20.0)), Some(DockOperation::Left));
        assert_eq!(z.resolve(bounds(), pos2(30.0, 8.0)), Some(DockOperation::Top));
        assert_eq!(z.resolve(bounds(), pos2(10.0, 10.0)), Some(DockOperation::Left));
        assert_eq!(z.resolve(bounds(), pos2(190.0, 90.0)), Some(DockOperation::Right));
    }

    #[test]
    fn band_rects_cover_the_resolved_zone() {
        let z = zones();
        let left = z.band_rect(bounds(), DockOperation::Left);
        assert_eq!(left, Rect::from_min_max(pos2(0.0, 0.0), pos2(50.0, 100.0)));
        let fill = z.band_rect(bounds(), DockOperation::Fill);
        assert!(fill.contains(pos2(100.0, 50.0)));
        assert!(!fill.contains(pos2(20.0, 50.0)));
    }
}
