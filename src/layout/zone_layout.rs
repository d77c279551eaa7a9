use super::partition::{
    LayoutKind, Partition, PartitionParams, DEFAULT_MAIN_RATIO, MAIN_RATIO_STEP, MAX_MAIN_RATIO,
    MIN_MAIN_RATIO,
};
use super::LayoutDescriptor;
use crate::event::{Direction, WindowId};
use crate::geometry::{Point, Rect};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// A set of zone indices a window occupies.  Ordered so that iteration and
/// comparisons are deterministic.
pub type ZoneIndexSet = BTreeSet<usize>;

/// One region of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    /// 0-based position in the layout.
    pub id: usize,
    pub rect: Rect,
}

/// Runtime instance of a layout over one work area.
///
/// Zones are recomputed wholesale: call [`kill`](Self::kill) and then
/// [`calculate`](Self::calculate) whenever the zone count, spacing or main
/// zone width changes.  Window assignments survive a recompute and are only
/// dropped by [`clear_assignments`](Self::clear_assignments).
#[derive(Debug, Clone)]
pub struct ZoneLayout {
    id: Uuid,
    kind: LayoutKind,
    area: Rect,
    spacing: i32,
    main_ratio: u32,
    zones: Vec<Zone>,
    windows: HashMap<WindowId, ZoneIndexSet>,
}

impl ZoneLayout {
    pub fn new(id: Uuid, kind: LayoutKind) -> Self {
        Self {
            id,
            kind,
            area: Rect::default(),
            spacing: 0,
            main_ratio: DEFAULT_MAIN_RATIO,
            zones: Vec::new(),
            windows: HashMap::new(),
        }
    }

    /// Build and calculate the layout `descriptor` describes over `area`.
    ///
    /// Returns `None` for inert descriptors.
    pub fn from_descriptor(descriptor: &LayoutDescriptor, area: Rect) -> Option<Self> {
        let kind = LayoutKind::from_descriptor(descriptor)?;
        let mut layout = Self::new(descriptor.id, kind);
        layout.calculate(area, descriptor.zone_count, descriptor.effective_spacing());
        Some(layout)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &LayoutKind {
        &self.kind
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn spacing(&self) -> i32 {
        self.spacing
    }

    pub fn main_ratio(&self) -> u32 {
        self.main_ratio
    }

    /// Compute `zone_count` zones over `area`.
    ///
    /// A non-positive count yields no zones.  Returns whether any zones
    /// were produced.
    pub fn calculate(&mut self, area: Rect, zone_count: i32, spacing: i32) -> bool {
        self.area = area;
        self.spacing = spacing.max(0);
        let count = usize::try_from(zone_count).unwrap_or(0);
        let params = PartitionParams {
            spacing: self.spacing,
            main_ratio: self.main_ratio,
        };
        self.zones = self
            .kind
            .partition(&area, count, &params)
            .into_iter()
            .enumerate()
            .map(|(id, rect)| Zone { id, rect })
            .collect();
        !self.zones.is_empty()
    }

    /// Drop the computed zones, keeping the layout kind and parameters.
    pub fn kill(&mut self) {
        self.zones.clear();
    }

    /// Forget every window assignment.
    pub fn clear_assignments(&mut self) {
        self.windows.clear();
    }

    /// Indices of all zones containing `point`.
    pub fn zones_from_point(&self, point: Point) -> ZoneIndexSet {
        self.zones
            .iter()
            .filter(|z| z.rect.contains(point))
            .map(|z| z.id)
            .collect()
    }

    /// The last index set committed for `window`, empty if none.
    pub fn zone_index_set_from_window(&self, window: WindowId) -> ZoneIndexSet {
        self.windows.get(&window).cloned().unwrap_or_default()
    }

    /// Bounding rectangle of the indexed zones.  Indices outside the layout
    /// are ignored; `None` if no index is valid.
    pub fn rect_for_index_set(&self, set: &ZoneIndexSet) -> Option<Rect> {
        set.iter()
            .filter_map(|&i| self.zones.get(i))
            .map(|z| z.rect)
            .reduce(|acc, r| acc.union(&r))
    }

    /// Record `set` as the zones `window` occupies.  An empty set removes the
    /// assignment.
    pub fn assign_window(&mut self, window: WindowId, set: ZoneIndexSet) {
        if set.is_empty() {
            self.windows.remove(&window);
        } else {
            self.windows.insert(window, set);
        }
    }

    pub fn remove_window(&mut self, window: WindowId) {
        self.windows.remove(&window);
    }

    /// Windows with a recorded assignment.
    pub fn windows(&self) -> impl Iterator<Item = (WindowId, &ZoneIndexSet)> {
        self.windows.iter().map(|(w, s)| (*w, s))
    }

    /// The single-zone set adjacent to `window`'s current zones in
    /// `direction`.
    ///
    /// An unassigned window enters at the first zone when moving forward
    /// and at the last when moving backward.  At the boundary the result
    /// wraps when `cycle` is set and is `None` otherwise.
    pub fn next_index_set(
        &self,
        window: WindowId,
        direction: Direction,
        cycle: bool,
    ) -> Option<ZoneIndexSet> {
        let count = self.zones.len();
        if count == 0 {
            return None;
        }
        let current = self
            .windows
            .get(&window)
            .filter(|set| set.iter().all(|&i| i < count));
        let next = match current {
            None if direction.is_backward() => count - 1,
            None => 0,
            Some(set) if direction.is_backward() => {
                let first = *set.iter().next()?;
                if first > 0 {
                    first - 1
                } else if cycle {
                    count - 1
                } else {
                    return None;
                }
            }
            Some(set) => {
                let last = *set.iter().next_back()?;
                if last + 1 < count {
                    last + 1
                } else if cycle {
                    0
                } else {
                    return None;
                }
            }
        };
        Some(ZoneIndexSet::from([next]))
    }

    /// Grow or shrink the main zone.  Only affects kinds with a main zone,
    /// and only takes effect after the next `kill` + `calculate`.
    ///
    /// Returns whether the ratio changed.
    pub fn change_main_zone_width(&mut self, increase: bool) -> bool {
        if !self.kind.has_main_zone() {
            return false;
        }
        let ratio = if increase {
            (self.main_ratio + MAIN_RATIO_STEP).min(MAX_MAIN_RATIO)
        } else {
            self.main_ratio.saturating_sub(MAIN_RATIO_STEP).max(MIN_MAIN_RATIO)
        };
        let changed = ratio != self.main_ratio;
        self.main_ratio = ratio;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutType;
    use pretty_assertions::assert_eq;

    fn grid4() -> ZoneLayout {
        let d = LayoutDescriptor::builtin(LayoutType::Grid, 4);
        ZoneLayout::from_descriptor(&d, Rect::new(0, 0, 1000, 1000)).unwrap()
    }

    fn set(items: &[usize]) -> ZoneIndexSet {
        items.iter().copied().collect()
    }

    #[test]
    fn grid_example_quadrants() {
        let layout = grid4();
        let rects: Vec<Rect> = layout.zones().iter().map(|z| z.rect).collect();
        assert_eq!(
            rects,
            vec![
                Rect::new(0, 0, 500, 500),
                Rect::new(500, 0, 500, 500),
                Rect::new(0, 500, 500, 500),
                Rect::new(500, 500, 500, 500),
            ]
        );
        let ids: Vec<usize> = layout.zones().iter().map(|z| z.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn calculate_is_deterministic() {
        let mut layout = grid4();
        let first = layout.zones().to_vec();
        layout.kill();
        layout.calculate(Rect::new(0, 0, 1000, 1000), 4, 0);
        assert_eq!(layout.zones(), first.as_slice());
    }

    #[test]
    fn non_positive_count_is_empty() {
        let mut layout = grid4();
        layout.kill();
        assert!(!layout.calculate(Rect::new(0, 0, 1000, 1000), 0, 0));
        assert!(!layout.calculate(Rect::new(0, 0, 1000, 1000), -3, 0));
        assert_eq!(layout.zone_count(), 0);
    }

    #[test]
    fn kill_keeps_kind_and_assignments() {
        let mut layout = grid4();
        layout.assign_window(WindowId(1), set(&[2]));
        layout.kill();
        assert_eq!(layout.zone_count(), 0);
        assert_eq!(layout.kind(), &LayoutKind::Grid);
        assert_eq!(layout.zone_index_set_from_window(WindowId(1)), set(&[2]));
        layout.calculate(Rect::new(0, 0, 1000, 1000), 2, 0);
        assert_eq!(layout.zone_count(), 2);
    }

    #[test]
    fn zones_from_point_reports_overlaps() {
        let d = LayoutDescriptor::builtin(LayoutType::Focus, 2);
        let layout = ZoneLayout::from_descriptor(&d, Rect::new(0, 0, 1000, 1000)).unwrap();
        assert_eq!(layout.zones_from_point(Point::new(200, 200)), set(&[0, 1]));
        assert_eq!(layout.zones_from_point(Point::new(120, 120)), set(&[0]));
        assert_eq!(layout.zones_from_point(Point::new(5, 5)), set(&[]));
    }

    #[test]
    fn index_set_rect_is_bounding_union() {
        let layout = grid4();
        assert_eq!(
            layout.rect_for_index_set(&set(&[0, 3])),
            Some(Rect::new(0, 0, 1000, 1000))
        );
        assert_eq!(
            layout.rect_for_index_set(&set(&[1, 9])),
            Some(Rect::new(500, 0, 500, 500))
        );
        assert_eq!(layout.rect_for_index_set(&set(&[9])), None);
        assert_eq!(layout.rect_for_index_set(&set(&[])), None);
    }

    #[test]
    fn unassigned_window_has_empty_set() {
        assert!(grid4().zone_index_set_from_window(WindowId(9)).is_empty());
    }

    #[test]
    fn empty_assignment_removes_window() {
        let mut layout = grid4();
        layout.assign_window(WindowId(1), set(&[0]));
        layout.assign_window(WindowId(1), set(&[]));
        assert_eq!(layout.windows().count(), 0);
    }

    #[test]
    fn next_index_set_wraps_only_when_cycling() {
        let mut layout = grid4();
        let w = WindowId(1);
        assert_eq!(layout.next_index_set(w, Direction::Right, false), Some(set(&[0])));
        assert_eq!(layout.next_index_set(w, Direction::Left, false), Some(set(&[3])));

        layout.assign_window(w, set(&[3]));
        assert_eq!(layout.next_index_set(w, Direction::Down, false), None);
        assert_eq!(layout.next_index_set(w, Direction::Down, true), Some(set(&[0])));
        assert_eq!(layout.next_index_set(w, Direction::Up, false), Some(set(&[2])));

        layout.assign_window(w, set(&[0]));
        assert_eq!(layout.next_index_set(w, Direction::Up, false), None);
        assert_eq!(layout.next_index_set(w, Direction::Up, true), Some(set(&[3])));
    }

    #[test]
    fn next_index_set_steps_from_span_edges() {
        let mut layout = grid4();
        let w = WindowId(1);
        layout.assign_window(w, set(&[1, 2]));
        assert_eq!(layout.next_index_set(w, Direction::Right, false), Some(set(&[3])));
        assert_eq!(layout.next_index_set(w, Direction::Left, false), Some(set(&[0])));
    }

    #[test]
    fn main_zone_width_needs_recalculate() {
        let d = LayoutDescriptor::builtin(LayoutType::PriorityGrid, 2);
        let area = Rect::new(0, 0, 1000, 1000);
        let mut layout = ZoneLayout::from_descriptor(&d, area).unwrap();
        assert_eq!(layout.zones()[0].rect.width, 500);

        assert!(layout.change_main_zone_width(true));
        assert_eq!(layout.main_ratio(), 55);
        assert_eq!(layout.zones()[0].rect.width, 500);

        layout.kill();
        layout.calculate(area, 2, 0);
        assert_eq!(layout.zones()[0].rect.width, 550);
    }

    #[test]
    fn main_zone_width_is_clamped() {
        let d = LayoutDescriptor::builtin(LayoutType::PriorityGrid, 2);
        let mut layout = ZoneLayout::from_descriptor(&d, Rect::new(0, 0, 100, 100)).unwrap();
        for _ in 0..20 {
            layout.change_main_zone_width(false);
        }
        assert_eq!(layout.main_ratio(), MIN_MAIN_RATIO);
        assert!(!layout.change_main_zone_width(false));
        for _ in 0..20 {
            layout.change_main_zone_width(true);
        }
        assert_eq!(layout.main_ratio(), MAX_MAIN_RATIO);
    }

    #[test]
    fn main_zone_width_ignored_without_main_zone() {
        let mut layout = grid4();
        assert!(!layout.change_main_zone_width(true));
        assert_eq!(layout.main_ratio(), DEFAULT_MAIN_RATIO);
    }

    #[test]
    fn inert_descriptor_has_no_layout() {
        let d = LayoutDescriptor::builtin(LayoutType::Blank, 4);
        assert!(ZoneLayout::from_descriptor(&d, Rect::new(0, 0, 10, 10)).is_none());
    }
}
