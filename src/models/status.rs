//! Entity views over a home-status snapshot (`homestatus` response).

use crate::models::error::ModelError;
use crate::models::ids::{HomeId, ModuleId, RoomId};
use crate::models::netatmo::{decode_id, find_by_id, unwrap_body};
use crate::models::node::{ListView, MapView, Node};

#[derive(Debug, Clone, Copy)]
pub struct HomeStatus<'a> {
    view: MapView<'a>,
}

impl<'a> HomeStatus<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(HomeStatus {
            view: MapView::new("HomeStatus", node)?,
        })
    }

    /// Accepts either the bare home map or the full API response.
    pub fn from_response(node: &'a Node) -> Result<Self, ModelError> {
        HomeStatus::new(unwrap_body(node, "home"))
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn id(&self) -> Result<HomeId, ModelError> {
        decode_id(&self.view, HomeId::from_hex)
    }

    pub fn rooms(&self) -> Result<RoomsStatus<'a>, ModelError> {
        Ok(RoomsStatus {
            list: ListView::from_slice("RoomsStatus", self.view.list("rooms")?),
        })
    }

    pub fn modules(&self) -> Result<ModulesStatus<'a>, ModelError> {
        Ok(ModulesStatus {
            list: ListView::from_slice("ModulesStatus", self.view.list("modules")?),
        })
    }

    pub fn to_node(&self) -> Node {
        self.view.to_node()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoomsStatus<'a> {
    list: ListView<'a>,
}

impl<'a> RoomsStatus<'a> {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<RoomStatus<'a>, ModelError>> + 'a {
        self.list.iter().map(RoomStatus::new)
    }

    pub fn get_by_id(&self, id: &RoomId) -> Result<Option<RoomStatus<'a>>, ModelError> {
        find_by_id(self.list, RoomStatus::new, RoomStatus::id, id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoomStatus<'a> {
    view: MapView<'a>,
}

impl<'a> RoomStatus<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(RoomStatus {
            view: MapView::new("RoomStatus", node)?,
        })
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn id(&self) -> Result<RoomId, ModelError> {
        self.view.get("id").map(RoomId)
    }

    pub fn reachable(&self) -> Result<Option<bool>, ModelError> {
        self.view.optional("reachable")
    }

    pub fn measured_temperature(&self) -> Result<Option<f64>, ModelError> {
        self.view.optional("therm_measured_temperature")
    }

    pub fn setpoint_temperature(&self) -> Result<Option<f64>, ModelError> {
        self.view.optional("therm_setpoint_temperature")
    }

    /// `schedule`, `manual`, `away`, `hg`, ...
    pub fn setpoint_mode(&self) -> Result<Option<&'a str>, ModelError> {
        self.view.optional("therm_setpoint_mode")
    }

    pub fn open_window(&self) -> Result<Option<bool>, ModelError> {
        self.view.optional("open_window")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModulesStatus<'a> {
    list: ListView<'a>,
}

impl<'a> ModulesStatus<'a> {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<ModuleStatus<'a>, ModelError>> + 'a {
        self.list.iter().map(ModuleStatus::new)
    }

    pub fn get_by_id(&self, id: &ModuleId) -> Result<Option<ModuleStatus<'a>>, ModelError> {
        find_by_id(self.list, ModuleStatus::new, ModuleStatus::id, id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModuleStatus<'a> {
    view: MapView<'a>,
}

impl<'a> ModuleStatus<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(ModuleStatus {
            view: MapView::new("ModuleStatus", node)?,
        })
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn id(&self) -> Result<ModuleId, ModelError> {
        decode_id(&self.view, ModuleId::from_hex)
    }

    pub fn module_type(&self) -> Result<Option<&'a str>, ModelError> {
        self.view.optional("type")
    }

    pub fn reachable(&self) -> Result<Option<bool>, ModelError> {
        self.view.optional("reachable")
    }

    pub fn battery_state(&self) -> Result<Option<&'a str>, ModelError> {
        self.view.optional("battery_state")
    }

    pub fn rf_strength(&self) -> Result<Option<i64>, ModelError> {
        self.view.optional("rf_strength")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::NodeKind;

    fn load_status_fixture() -> Node {
        let json = std::fs::read_to_string("tests/data/home_status.json").expect("fixture present");
        serde_json::from_str(&json).expect("parse home status")
    }

    #[test]
    fn home_status_rooms() {
        let node = load_status_fixture();
        let status = HomeStatus::from_response(&node).unwrap();
        assert_eq!(status.id().unwrap().to_string(), "60478d1baf36ee032f3e0070");

        let rooms = status.rooms().unwrap();
        assert_eq!(rooms.len(), 2);
        let living = rooms.get_by_id(&RoomId(2389428768)).unwrap().unwrap();
        assert_eq!(living.measured_temperature().unwrap(), Some(21.5));
        // integral setpoints still read as floats
        assert_eq!(living.setpoint_temperature().unwrap(), Some(21.0));
        assert_eq!(living.setpoint_mode().unwrap(), Some("schedule"));
        assert_eq!(living.open_window().unwrap(), Some(false));

        let cabinet = rooms.get_by_id(&RoomId(1914591590)).unwrap().unwrap();
        assert_eq!(cabinet.reachable().unwrap(), Some(false));
        assert_eq!(cabinet.measured_temperature().unwrap(), None);
        assert!(rooms.get_by_id(&RoomId(1)).unwrap().is_none());
    }

    #[test]
    fn home_status_modules() {
        let node = load_status_fixture();
        let modules = HomeStatus::from_response(&node).unwrap().modules().unwrap();
        let plug = modules.get_by_id(&"70:ee:50:00:00:01".parse().unwrap()).unwrap().unwrap();
        assert_eq!(plug.module_type().unwrap(), Some("NAPlug"));
        assert_eq!(plug.rf_strength().unwrap(), Some(72));
        assert_eq!(plug.battery_state().unwrap(), Some("full"));

        let thermostat = modules.iter().next().unwrap().unwrap();
        assert_eq!(thermostat.reachable().unwrap(), Some(true));
        assert_eq!(thermostat.rf_strength().unwrap(), None);
    }

    #[test]
    fn wrong_kinds_surface_as_type_errors() {
        let node = Node::from_value(&serde_json::json!({"id": 3, "reachable": "yes"})).unwrap();
        let room = RoomStatus::new(&node).unwrap();
        assert!(matches!(
            room.reachable(),
            Err(ModelError::Type { found: NodeKind::String, .. })
        ));

        let module = ModuleStatus::new(&node).unwrap();
        assert!(matches!(module.id(), Err(ModelError::Type { .. })));
    }
}
