//! Partitioning a work area into zone rectangles.
//!
//! Every layout kind implements [`Partition`].  All arithmetic is integer
//! and distributes rounding across slices, so the same inputs always yield
//! the same rectangles and slices tile the available span exactly.

use super::{CanvasLayout, LayoutDescriptor, LayoutType};
use crate::geometry::Rect;

/// Default width of the main zone in percent.
pub const DEFAULT_MAIN_RATIO: u32 = 50;
pub const MIN_MAIN_RATIO: u32 = 10;
pub const MAX_MAIN_RATIO: u32 = 90;
/// Step applied by one width-change hotkey press.
pub const MAIN_RATIO_STEP: u32 = 5;

/// Width/height of a focus zone relative to the work area, in percent.
const FOCUS_ZONE_PERCENT: i64 = 40;
/// Offset of the first focus zone from the work area origin, in percent.
const FOCUS_ORIGIN_PERCENT: i64 = 10;
/// Shift between consecutive focus zones, in pixels.
const FOCUS_ZONE_OFFSET: i32 = 50;

/// Tunables that feed a partition besides the area and zone count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionParams {
    /// Gap in pixels around and between zones.
    pub spacing: i32,
    /// Width of the main zone in percent, for kinds that have one.
    pub main_ratio: u32,
}

impl Default for PartitionParams {
    fn default() -> Self {
        Self {
            spacing: 0,
            main_ratio: DEFAULT_MAIN_RATIO,
        }
    }
}

/// Something that can split an area into `count` zone rectangles.
pub trait Partition {
    fn partition(&self, area: &Rect, count: usize, params: &PartitionParams) -> Vec<Rect>;

    /// Whether [`PartitionParams::main_ratio`] affects the result.
    fn has_main_zone(&self) -> bool {
        false
    }
}

/// Runtime layout kind, one variant per layout type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutKind {
    Focus,
    Columns,
    Rows,
    Grid,
    PriorityGrid,
    Custom(CanvasLayout),
    Blank,
}

impl LayoutKind {
    /// The kind described by `descriptor`, or `None` when the descriptor is
    /// inert or names a custom layout without a canvas.
    pub fn from_descriptor(descriptor: &LayoutDescriptor) -> Option<Self> {
        if descriptor.is_inert() {
            return None;
        }
        Some(match descriptor.kind {
            LayoutType::Focus => LayoutKind::Focus,
            LayoutType::Columns => LayoutKind::Columns,
            LayoutType::Rows => LayoutKind::Rows,
            LayoutType::Grid => LayoutKind::Grid,
            LayoutType::PriorityGrid => LayoutKind::PriorityGrid,
            LayoutType::Custom => LayoutKind::Custom(descriptor.canvas.clone()?),
            LayoutType::Blank => return None,
        })
    }

    pub fn layout_type(&self) -> LayoutType {
        match self {
            LayoutKind::Focus => LayoutType::Focus,
            LayoutKind::Columns => LayoutType::Columns,
            LayoutKind::Rows => LayoutType::Rows,
            LayoutKind::Grid => LayoutType::Grid,
            LayoutKind::PriorityGrid => LayoutType::PriorityGrid,
            LayoutKind::Custom(_) => LayoutType::Custom,
            LayoutKind::Blank => LayoutType::Blank,
        }
    }
}

impl Partition for LayoutKind {
    fn partition(&self, area: &Rect, count: usize, params: &PartitionParams) -> Vec<Rect> {
        if count == 0 || area.is_empty() {
            return Vec::new();
        }
        let spacing = params.spacing.max(0);
        match self {
            LayoutKind::Focus => focus(area, count),
            LayoutKind::Columns => columns(area, count, spacing),
            LayoutKind::Rows => rows(area, count, spacing),
            LayoutKind::Grid => grid(area, count, spacing),
            LayoutKind::PriorityGrid => priority_grid(area, count, spacing, params.main_ratio),
            LayoutKind::Custom(canvas) => custom(area, count, canvas),
            LayoutKind::Blank => Vec::new(),
        }
    }

    fn has_main_zone(&self) -> bool {
        matches!(self, LayoutKind::PriorityGrid)
    }
}

/// Split `length` pixels starting at `start` into `parts` slices with
/// `spacing` before, between and after them.  Returns `(offset, size)`
/// pairs.
fn split(start: i32, length: i32, parts: usize, spacing: i32) -> Vec<(i32, i32)> {
    let parts_i = parts as i64;
    let available = (length as i64 - spacing as i64 * (parts_i + 1)).max(0);
    (0..parts_i)
        .map(|i| {
            let a = available * i / parts_i;
            let b = available * (i + 1) / parts_i;
            let offset = start as i64 + spacing as i64 * (i + 1) + a;
            (offset as i32, (b - a) as i32)
        })
        .collect()
}

fn columns(area: &Rect, count: usize, spacing: i32) -> Vec<Rect> {
    let height = (area.height - 2 * spacing).max(0);
    split(area.x, area.width, count, spacing)
        .into_iter()
        .map(|(x, width)| Rect::new(x, area.y + spacing, width, height))
        .collect()
}

fn rows(area: &Rect, count: usize, spacing: i32) -> Vec<Rect> {
    let width = (area.width - 2 * spacing).max(0);
    split(area.y, area.height, count, spacing)
        .into_iter()
        .map(|(y, height)| Rect::new(area.x + spacing, y, width, height))
        .collect()
}

/// Largest `r` with `r * r <= count`.
fn grid_rows(count: usize) -> usize {
    let mut r = 1;
    while (r + 1) * (r + 1) <= count {
        r += 1;
    }
    r
}

fn grid(area: &Rect, count: usize, spacing: i32) -> Vec<Rect> {
    let row_count = grid_rows(count);
    let col_count = count.div_ceil(row_count);
    let row_spans = split(area.y, area.height, row_count, spacing);
    let col_spans = split(area.x, area.width, col_count, spacing);

    (0..count)
        .map(|i| {
            let (y, height) = row_spans[i / col_count];
            let col = i % col_count;
            let (x, width) = col_spans[col];
            if i == count - 1 && col < col_count - 1 {
                // The last zone of a short final row absorbs the empty cells.
                let (last_x, last_width) = col_spans[col_count - 1];
                Rect::new(x, y, last_x + last_width - x, height)
            } else {
                Rect::new(x, y, width, height)
            }
        })
        .collect()
}

fn priority_grid(area: &Rect, count: usize, spacing: i32, main_ratio: u32) -> Vec<Rect> {
    if count == 1 {
        return vec![area.inset(spacing)];
    }
    let ratio = main_ratio.clamp(MIN_MAIN_RATIO, MAX_MAIN_RATIO) as i64;
    let available = (area.width as i64 - 3 * spacing as i64).max(0);
    let main_width = (available * ratio / 100) as i32;
    let side_width = available as i32 - main_width;
    let height = (area.height - 2 * spacing).max(0);

    let mut zones = Vec::with_capacity(count);
    zones.push(Rect::new(area.x + spacing, area.y + spacing, main_width, height));
    let side_x = area.x + 2 * spacing + main_width;
    zones.extend(
        split(area.y, area.height, count - 1, spacing)
            .into_iter()
            .map(|(y, h)| Rect::new(side_x, y, side_width, h)),
    );
    zones
}

fn focus(area: &Rect, count: usize) -> Vec<Rect> {
    let width = (area.width as i64 * FOCUS_ZONE_PERCENT / 100) as i32;
    let height = (area.height as i64 * FOCUS_ZONE_PERCENT / 100) as i32;
    let left = area.x + (area.width as i64 * FOCUS_ORIGIN_PERCENT / 100) as i32;
    let top = area.y + (area.height as i64 * FOCUS_ORIGIN_PERCENT / 100) as i32;
    (0..count as i32)
        .map(|i| {
            Rect::new(
                left + i * FOCUS_ZONE_OFFSET,
                top + i * FOCUS_ZONE_OFFSET,
                width,
                height,
            )
        })
        .collect()
}

fn custom(area: &Rect, count: usize, canvas: &CanvasLayout) -> Vec<Rect> {
    if canvas.ref_width <= 0 || canvas.ref_height <= 0 {
        return Vec::new();
    }
    let scale_x = |v: i32| (v as i64 * area.width as i64 / canvas.ref_width as i64) as i32;
    let scale_y = |v: i32| (v as i64 * area.height as i64 / canvas.ref_height as i64) as i32;
    canvas
        .zones
        .iter()
        .take(count)
        .map(|z| {
            Rect::from_edges(
                area.x + scale_x(z.left()),
                area.y + scale_y(z.top()),
                area.x + scale_x(z.right()),
                area.y + scale_y(z.bottom()),
            )
        })
        .collect()
}
