//! Work-area identity.
//!
//! A work area is one monitor on one virtual desktop.  Its identity is a
//! string key built from the monitor's parsed device id, its resolution and
//! the virtual desktop id:
//!
//! ```text
//! DELA026#5&10a58962&0&UID16777488_2560_1440_{8A0B1D6E-4C2F-4E2A-9C1D-2B5E7F9A3C4D}
//! ```
//!
//! The monitor's position or enumeration ordinal is deliberately **not**
//! part of the key: two identical monitors running the same resolution on
//! the same desktop share one identity, and therefore one layout.

use crate::event::MonitorInfo;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Device id used when the window manager reports none, or one that does
/// not follow the `…#<unique part>#{interface}` shape and is empty.
pub const FALLBACK_DEVICE_ID: &str = "FallbackDevice";

/// A virtual desktop id.
///
/// Formatted the way desktop ids are persisted: upper-case, hyphenated,
/// wrapped in braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DesktopId(pub Uuid);

impl DesktopId {
    /// The sentinel used in identities whose desktop is unknown.
    pub const EMPTY: DesktopId = DesktopId(Uuid::nil());

    pub fn is_empty(&self) -> bool {
        self.0.is_nil()
    }

    /// Deterministic desktop id for a numeric workspace id.
    pub fn from_workspace(workspace: i64) -> Self {
        DesktopId(Uuid::from_u64_pair(0x6879_7072_7a6f_6e65, workspace as u64))
    }
}

impl fmt::Display for DesktopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hyphenated = self.0.hyphenated().to_string().to_uppercase();
        write!(f, "{{{}}}", hyphenated)
    }
}

impl FromStr for DesktopId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(DesktopId)
    }
}

impl Serialize for DesktopId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DesktopId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

/// Extract the unique part of a display device path.
///
/// `\\?\DISPLAY#DELA026#5&10a58962&0&UID16777488#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}`
/// becomes `DELA026#5&10a58962&0&UID16777488`.  Ids without that shape are
/// used as-is (trimmed), and an empty id falls back to
/// [`FALLBACK_DEVICE_ID`].
pub fn parse_device_id(device_id: &str) -> String {
    let trimmed = device_id.trim();
    if let Some((_, rest)) = trimmed.split_once('#') {
        if let Some(end) = rest.rfind("#{") {
            let unique = &rest[..end];
            if !unique.is_empty() {
                return unique.to_string();
            }
        }
    }
    if trimmed.is_empty() {
        FALLBACK_DEVICE_ID.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Stable key of one monitor on one virtual desktop.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkAreaIdentity {
    device_id: String,
    width: i32,
    height: i32,
    desktop: DesktopId,
}

/// Error returned when an identity key cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("malformed work area identity: {0:?}")]
pub struct IdentityParseError(String);

impl WorkAreaIdentity {
    /// Derive the identity of `monitor` on `desktop`.
    ///
    /// `device_id` is the raw physical device id; it is parsed with
    /// [`parse_device_id`].  A missing desktop id degrades to
    /// [`DesktopId::EMPTY`] instead of failing.
    pub fn derive(monitor: &MonitorInfo, device_id: &str, desktop: Option<DesktopId>) -> Self {
        Self {
            device_id: parse_device_id(device_id),
            width: monitor.rect.width,
            height: monitor.rect.height,
            desktop: desktop.unwrap_or(DesktopId::EMPTY),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Monitor resolution as `(width, height)`.
    pub fn resolution(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// The virtual desktop component, or `None` for the empty sentinel.
    pub fn desktop(&self) -> Option<DesktopId> {
        if self.desktop.is_empty() {
            None
        } else {
            Some(self.desktop)
        }
    }

    /// The same monitor and resolution on another desktop.
    pub fn with_desktop(&self, desktop: DesktopId) -> Self {
        Self {
            desktop,
            ..self.clone()
        }
    }
}

impl fmt::Display for WorkAreaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.device_id, self.width, self.height, self.desktop
        )
    }
}

impl FromStr for WorkAreaIdentity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IdentityParseError(s.to_string());
        // The device id may itself contain underscores, so split from the right.
        let mut parts = s.rsplitn(4, '_');
        let desktop = parts.next().ok_or_else(err)?;
        let height = parts.next().ok_or_else(err)?;
        let width = parts.next().ok_or_else(err)?;
        let device_id = parts.next().ok_or_else(err)?;
        if device_id.is_empty() {
            return Err(err());
        }
        Ok(Self {
            device_id: device_id.to_string(),
            width: width.parse().map_err(|_| err())?,
            height: height.parse().map_err(|_| err())?,
            desktop: desktop.parse().map_err(|_| err())?,
        })
    }
}

impl Serialize for WorkAreaIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkAreaIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MonitorId;
    use crate::geometry::Rect;

    const DEVICE: &str =
        r"\\?\DISPLAY#DELA026#5&10a58962&0&UID16777488#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}";

    fn monitor(id: u64, x: i32, width: i32, height: i32) -> MonitorInfo {
        MonitorInfo {
            id: MonitorId(id),
            rect: Rect::new(x, 0, width, height),
            work_area: Rect::new(x, 0, width, height - 40),
            device_id: Some(DEVICE.into()),
            desktop: None,
            mirroring: false,
        }
    }

    fn desktop() -> DesktopId {
        "{8A0B1D6E-4C2F-4E2A-9C1D-2B5E7F9A3C4D}".parse().unwrap()
    }

    #[test]
    fn parses_windows_device_path() {
        assert_eq!(parse_device_id(DEVICE), "DELA026#5&10a58962&0&UID16777488");
    }

    #[test]
    fn plain_device_ids_are_kept() {
        assert_eq!(parse_device_id(" Dell Inc. U2720Q ABC123 "), "Dell Inc. U2720Q ABC123");
        assert_eq!(parse_device_id(""), FALLBACK_DEVICE_ID);
    }

    #[test]
    fn identity_key_format() {
        let id = WorkAreaIdentity::derive(&monitor(1, 0, 2560, 1440), DEVICE, Some(desktop()));
        assert_eq!(
            id.to_string(),
            "DELA026#5&10a58962&0&UID16777488_2560_1440_{8A0B1D6E-4C2F-4E2A-9C1D-2B5E7F9A3C4D}"
        );
    }

    #[test]
    fn identical_inputs_give_identical_identity() {
        let a = WorkAreaIdentity::derive(&monitor(1, 0, 1920, 1080), DEVICE, Some(desktop()));
        let b = WorkAreaIdentity::derive(&monitor(1, 0, 1920, 1080), DEVICE, Some(desktop()));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn monitor_handle_and_position_do_not_affect_identity() {
        let a = WorkAreaIdentity::derive(&monitor(1, 0, 1920, 1080), DEVICE, Some(desktop()));
        let b = WorkAreaIdentity::derive(&monitor(7, 1920, 1920, 1080), DEVICE, Some(desktop()));
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn resolution_and_desktop_affect_identity() {
        let a = WorkAreaIdentity::derive(&monitor(1, 0, 1920, 1080), DEVICE, Some(desktop()));
        let b = WorkAreaIdentity::derive(&monitor(1, 0, 2560, 1440), DEVICE, Some(desktop()));
        let c = WorkAreaIdentity::derive(
            &monitor(1, 0, 1920, 1080),
            DEVICE,
            Some(DesktopId::from_workspace(2)),
        );
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn missing_desktop_uses_empty_sentinel() {
        let id = WorkAreaIdentity::derive(&monitor(1, 0, 1920, 1080), DEVICE, None);
        assert!(id.to_string().ends_with("_{00000000-0000-0000-0000-000000000000}"));
        assert_eq!(id.desktop(), None);
    }

    #[test]
    fn key_parses_back() {
        let id = WorkAreaIdentity::derive(&monitor(1, 0, 1920, 1080), "eDP_1 panel", Some(desktop()));
        let parsed: WorkAreaIdentity = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.device_id(), "eDP_1 panel");
        assert_eq!(parsed.resolution(), (1920, 1080));
    }

    #[test]
    fn garbage_key_is_rejected() {
        assert!("nonsense".parse::<WorkAreaIdentity>().is_err());
        assert!("dev_x_1080_{8A0B1D6E-4C2F-4E2A-9C1D-2B5E7F9A3C4D}"
            .parse::<WorkAreaIdentity>()
            .is_err());
    }

    #[test]
    fn workspace_desktops_are_distinct_and_stable() {
        assert_eq!(DesktopId::from_workspace(3), DesktopId::from_workspace(3));
        assert_ne!(DesktopId::from_workspace(3), DesktopId::from_workspace(4));
        assert!(!DesktopId::from_workspace(0).is_empty());
    }
}
