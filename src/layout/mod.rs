//! Zone layouts.
//!
//! A [`LayoutDescriptor`] is the persisted description of a layout (its
//! type, zone count and spacing).  [`Partition`] turns a layout kind into
//! zone rectangles, and [`ZoneLayout`] is the runtime instance owned by a
//! work area: the computed zones plus which windows sit in which zones.

pub mod partition;
pub mod zone_layout;

pub use partition::{LayoutKind, Partition, PartitionParams};
pub use zone_layout::{Zone, ZoneIndexSet, ZoneLayout};

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Layout types a descriptor can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutType {
    Focus,
    Columns,
    Rows,
    Grid,
    PriorityGrid,
    Custom,
    Blank,
}

impl LayoutType {
    /// Fixed id of the built-in layout of this type.
    ///
    /// Descriptors loaded without an id get this one, so that the built-in
    /// templates are usable straight from a config file.
    pub fn builtin_id(self) -> Uuid {
        let tag: u128 = match self {
            LayoutType::Focus => 1,
            LayoutType::Columns => 2,
            LayoutType::Rows => 3,
            LayoutType::Grid => 4,
            LayoutType::PriorityGrid => 5,
            LayoutType::Custom => 6,
            LayoutType::Blank => return Uuid::nil(),
        };
        Uuid::from_u128(0x6879_7072_7a6f_6e65_0000_0000_0000_0000 | tag)
    }
}

/// Zones of a custom canvas layout, in the coordinates of a reference
/// work area of `ref_width × ref_height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasLayout {
    pub ref_width: i32,
    pub ref_height: i32,
    pub zones: Vec<Rect>,
}

/// Persisted description of a work area's active layout.
///
/// A descriptor with a nil id or of type [`LayoutType::Blank`] describes an
/// inert work area: no zones, and placement and cycling do nothing there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    #[serde(default)]
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: LayoutType,
    #[serde(default)]
    pub zone_count: i32,
    #[serde(default)]
    pub spacing: i32,
    #[serde(default)]
    pub show_spacing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasLayout>,
}

impl LayoutDescriptor {
    /// A built-in layout of `kind` with the given zone count.
    pub fn builtin(kind: LayoutType, zone_count: i32) -> Self {
        Self {
            id: kind.builtin_id(),
            kind,
            zone_count,
            spacing: 0,
            show_spacing: false,
            canvas: None,
        }
    }

    pub fn is_inert(&self) -> bool {
        self.id.is_nil() || self.kind == LayoutType::Blank
    }

    /// Spacing actually applied between zones.
    pub fn effective_spacing(&self) -> i32 {
        if self.show_spacing {
            self.spacing.max(0)
        } else {
            0
        }
    }

    /// Fill in the built-in id when none was given.
    pub fn with_default_id(mut self) -> Self {
        if self.id.is_nil() {
            self.id = self.kind.builtin_id();
        }
        self
    }
}

impl Default for LayoutDescriptor {
    fn default() -> Self {
        Self {
            spacing: 16,
            show_spacing: true,
            ..Self::builtin(LayoutType::PriorityGrid, 3)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_nil_descriptors_are_inert() {
        assert!(LayoutDescriptor::builtin(LayoutType::Blank, 3).is_inert());
        let mut d = LayoutDescriptor::builtin(LayoutType::Grid, 4);
        assert!(!d.is_inert());
        d.id = Uuid::nil();
        assert!(d.is_inert());
    }

    #[test]
    fn spacing_only_applies_when_shown() {
        let mut d = LayoutDescriptor::builtin(LayoutType::Columns, 2);
        d.spacing = 10;
        assert_eq!(d.effective_spacing(), 0);
        d.show_spacing = true;
        assert_eq!(d.effective_spacing(), 10);
    }

    #[test]
    fn deserialize_without_id_then_fill_in() {
        let d: LayoutDescriptor =
            serde_json::from_str(r#"{ "type": "Grid", "zone_count": 4 }"#).unwrap();
        assert!(d.is_inert());
        let d = d.with_default_id();
        assert_eq!(d.id, LayoutType::Grid.builtin_id());
        assert!(!d.is_inert());
    }

    #[test]
    fn builtin_ids_are_distinct() {
        let kinds = [
            LayoutType::Focus,
            LayoutType::Columns,
            LayoutType::Rows,
            LayoutType::Grid,
            LayoutType::PriorityGrid,
            LayoutType::Custom,
        ];
        let ids: std::collections::HashSet<Uuid> = kinds.iter().map(|k| k.builtin_id()).collect();
        assert_eq!(ids.len(), kinds.len());
        assert!(LayoutType::Blank.builtin_id().is_nil());
    }
}
