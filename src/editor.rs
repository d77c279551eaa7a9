//! Messages to the external layout editor.
//!
//! The engine never launches the editor itself.  It sends an
//! [`EditorCommand`] over the channel attached with
//! [`ZoneEngine::set_editor`](crate::engine::ZoneEngine::set_editor); whoever
//! owns the receiving end runs the editor and reports back with
//! [`Event::EditorExit`](crate::event::Event::EditorExit).

use crate::event::MonitorId;
use crate::identity::WorkAreaIdentity;
use crate::layout::LayoutDescriptor;
use crate::work_area::WorkArea;
use serde::Serialize;

/// What the editor needs to edit one work area's layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorRequest {
    pub monitor: MonitorId,
    /// `x_y_width_height` of the usable area.
    pub location: String,
    /// `width_height` of the monitor.
    pub work_area_key: String,
    pub identity: WorkAreaIdentity,
    /// The layout currently active there, if any.
    pub descriptor: Option<LayoutDescriptor>,
}

impl EditorRequest {
    pub fn for_work_area(work_area: &WorkArea, descriptor: Option<LayoutDescriptor>) -> Self {
        Self {
            monitor: work_area.monitor(),
            location: work_area.location(),
            work_area_key: work_area.work_area_key().to_string(),
            identity: work_area.identity().clone(),
            descriptor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EditorCommand {
    /// Open the editor for a work area.
    Launch(EditorRequest),
    /// Close the running editor without applying anything.
    Terminate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutType;
    use crate::store::MemoryStore;
    use crate::testing::{desktop, monitor};

    #[test]
    fn request_serializes_location_and_identity() {
        let mut m = monitor(3, 1920, 2560, 1440);
        m.work_area = crate::geometry::Rect::new(1920, 30, 2560, 1410);
        let id = WorkAreaIdentity::derive(&m, "MON-3", Some(desktop(1)));
        let mut store = MemoryStore::new(LayoutDescriptor::builtin(LayoutType::Grid, 4));
        let wa = WorkArea::new(&m, id.clone(), &mut store, None, true).unwrap();

        let request = EditorRequest::for_work_area(&wa, None);
        assert_eq!(request.location, "1920_30_2560_1410");
        // The key names the monitor size, the location its usable part.
        assert_eq!(request.work_area_key, "2560_1440");

        let json = serde_json::to_value(EditorCommand::Launch(request)).unwrap();
        assert_eq!(json["Launch"]["identity"], id.to_string());
        assert_eq!(json["Launch"]["monitor"], 3);
    }
}
