//! In-memory [`LayoutStore`] with an optional JSON snapshot on disk.
//!
//! The snapshot is the file the layout editor reads and writes: a map from
//! work-area identity keys to layout descriptors plus the per-application
//! zone history.
//!
//! ```json
//! {
//!   "devices": {
//!     "DP-1_2560_1440_{…}": { "id": "…", "type": "Grid", "zone_count": 4 }
//!   },
//!   "app_zones": {
//!     "KITTY": { "identity": "DP-1_2560_1440_{…}", "layout_id": "…", "zones": [0] }
//!   }
//! }
//! ```

use crate::identity::{DesktopId, WorkAreaIdentity};
use crate::layout::LayoutDescriptor;
use crate::traits::{LayoutStore, ZoneAssignment};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors from reading or writing the snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    devices: BTreeMap<WorkAreaIdentity, LayoutDescriptor>,
    #[serde(default)]
    app_zones: BTreeMap<String, ZoneAssignment>,
}

/// Layout store kept in memory and optionally snapshotted to a JSON file.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: StoreData,
    active: Option<WorkAreaIdentity>,
    default_layout: LayoutDescriptor,
    path: Option<PathBuf>,
}

impl MemoryStore {
    /// A store that never touches disk.
    pub fn new(default_layout: LayoutDescriptor) -> Self {
        Self {
            data: StoreData::default(),
            active: None,
            default_layout,
            path: None,
        }
    }

    /// A store backed by the snapshot at `path`, loaded if it exists.
    pub fn open(path: impl Into<PathBuf>, default_layout: LayoutDescriptor) -> Result<Self, StoreError> {
        let mut store = Self {
            path: Some(path.into()),
            ..Self::new(default_layout)
        };
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replace the layout of `identity`.
    pub fn set_descriptor(&mut self, identity: WorkAreaIdentity, descriptor: LayoutDescriptor) {
        self.data.devices.insert(identity, descriptor);
    }

    /// Identities with a recorded layout.
    pub fn identities(&self) -> impl Iterator<Item = &WorkAreaIdentity> {
        self.data.devices.keys()
    }
}

fn read_snapshot(path: &Path) -> Result<Option<StoreData>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(serde_json::from_str(&contents)?))
}

impl LayoutStore for MemoryStore {
    type Error = StoreError;

    fn find_descriptor(&self, identity: &WorkAreaIdentity) -> Option<LayoutDescriptor> {
        self.data.devices.get(identity).cloned()
    }

    fn add_device(&mut self, identity: &WorkAreaIdentity) {
        if !self.data.devices.contains_key(identity) {
            debug!("new device {}, seeding default layout", identity);
            self.data
                .devices
                .insert(identity.clone(), self.default_layout.clone());
        }
    }

    fn set_active_identity(&mut self, identity: WorkAreaIdentity) {
        self.active = Some(identity);
    }

    fn active_identity(&self) -> Option<WorkAreaIdentity> {
        self.active.clone()
    }

    fn clone_descriptor(&mut self, from: &WorkAreaIdentity, to: &WorkAreaIdentity) -> bool {
        match self.data.devices.get(from).cloned() {
            Some(descriptor) => {
                if from != to {
                    debug!("cloning layout of {} to {}", from, to);
                    self.data.devices.insert(to.clone(), descriptor);
                }
                true
            }
            None => false,
        }
    }

    fn remove_desktop(&mut self, desktop: DesktopId) -> bool {
        let before = self.data.devices.len() + self.data.app_zones.len();
        self.data
            .devices
            .retain(|identity, _| identity.desktop() != Some(desktop));
        self.data
            .app_zones
            .retain(|_, a| a.identity.desktop() != Some(desktop));
        let removed = before != self.data.devices.len() + self.data.app_zones.len();
        if removed {
            info!("removed stored layouts of desktop {}", desktop);
        }
        removed
    }

    fn update_primary_desktop(&mut self, primary: DesktopId) {
        let orphaned: Vec<WorkAreaIdentity> = self
            .data
            .devices
            .keys()
            .filter(|identity| identity.desktop().is_none())
            .cloned()
            .collect();
        for identity in orphaned {
            if let Some(descriptor) = self.data.devices.remove(&identity) {
                let migrated = identity.with_desktop(primary);
                debug!("migrating {} to {}", identity, migrated);
                self.data.devices.entry(migrated).or_insert(descriptor);
            }
        }
        for assignment in self.data.app_zones.values_mut() {
            if assignment.identity.desktop().is_none() {
                assignment.identity = assignment.identity.with_desktop(primary);
            }
        }
    }

    fn remove_deleted_desktops(&mut self, live: &[DesktopId]) {
        let is_dead = |identity: &WorkAreaIdentity| {
            identity.desktop().is_some_and(|d| !live.contains(&d))
        };
        self.data.devices.retain(|identity, _| !is_dead(identity));
        self.data.app_zones.retain(|_, a| !is_dead(&a.identity));
    }

    fn set_app_last_zones(&mut self, app: &str, assignment: ZoneAssignment) {
        self.data.app_zones.insert(app.to_string(), assignment);
    }

    fn app_last_zones(&self, app: &str) -> Option<ZoneAssignment> {
        self.data.app_zones.get(app).cloned()
    }

    fn save_all(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(path, json).map_err(io_err)?;
        debug!("saved layout store to {}", path.display());
        Ok(())
    }

    fn reload(&mut self) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            if let Some(data) = read_snapshot(path)? {
                info!("loaded layout store from {}", path.display());
                self.data = data;
            }
        }
        Ok(())
    }
}
