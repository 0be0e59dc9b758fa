//! Entity views over a home-data snapshot (`homesdata` response).
//!
//! Each view is a thin projection over a borrowed [`Node`]; nothing is
//! copied until a caller asks for an owned value. Collections find their
//! members by a linear scan, which is fine at home scale.

use crate::models::error::ModelError;
use crate::models::ids::{HomeId, ModuleId, RoomId, ScheduleId, ZoneId};
use crate::models::node::{ListView, MapView, Node};
use crate::services::timetable::{ScheduleType, Timetable};
use chrono_tz::Tz;

/// Read the `"id"` string of a view and decode it with `decode`.
pub(crate) fn decode_id<T>(
    view: &MapView<'_>,
    decode: impl Fn(&str) -> Result<T, hex::FromHexError>,
) -> Result<T, ModelError> {
    let raw: &str = view.get("id")?;
    decode(raw).map_err(|e| ModelError::Id {
        entity: view.entity(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// First member of `list` whose identity equals `id`.
pub(crate) fn find_by_id<'a, V, I: PartialEq>(
    list: ListView<'a>,
    make: impl Fn(&'a Node) -> Result<V, ModelError>,
    id_of: impl Fn(&V) -> Result<I, ModelError>,
    id: &I,
) -> Result<Option<V>, ModelError> {
    for node in list.iter() {
        let item = make(node)?;
        if id_of(&item)? == *id {
            return Ok(Some(item));
        }
    }
    Ok(None)
}

/// Unwrap the vendor envelope `{"body": {<key>: ...}}` when present.
pub(crate) fn unwrap_body<'a>(node: &'a Node, key: &str) -> &'a Node {
    node.get("body").and_then(|body| body.get(key)).unwrap_or(node)
}

#[derive(Debug, Clone, Copy)]
pub struct HomesData<'a> {
    list: ListView<'a>,
}

impl<'a> HomesData<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(HomesData {
            list: ListView::new("HomesData", node)?,
        })
    }

    /// Accepts either the bare list of homes or the full API response.
    pub fn from_response(node: &'a Node) -> Result<Self, ModelError> {
        HomesData::new(unwrap_body(node, "homes"))
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<HomeData<'a>, ModelError>> + 'a {
        self.list.iter().map(HomeData::new)
    }

    pub fn get_by_id(&self, id: &HomeId) -> Result<Option<HomeData<'a>>, ModelError> {
        find_by_id(self.list, HomeData::new, HomeData::id, id)
    }

    pub fn to_node(&self) -> Node {
        self.list.to_node()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HomeData<'a> {
    view: MapView<'a>,
}

impl<'a> HomeData<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(HomeData {
            view: MapView::new("HomeData", node)?,
        })
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn id(&self) -> Result<HomeId, ModelError> {
        decode_id(&self.view, HomeId::from_hex)
    }

    pub fn name(&self) -> Result<&'a str, ModelError> {
        self.view.get("name")
    }

    /// The IANA zone every schedule of this home is interpreted in.
    pub fn timezone(&self) -> Result<Tz, ModelError> {
        let name: &str = self.view.get("timezone")?;
        name.parse::<Tz>()
            .map_err(|_| ModelError::UnknownTimezone(name.to_string()))
    }

    pub fn rooms(&self) -> Result<RoomsData<'a>, ModelError> {
        Ok(RoomsData {
            list: ListView::from_slice("RoomsData", self.view.list("rooms")?),
        })
    }

    pub fn modules(&self) -> Result<ModulesData<'a>, ModelError> {
        Ok(ModulesData {
            list: ListView::from_slice("ModulesData", self.view.list("modules")?),
        })
    }

    pub fn schedules(&self) -> Result<Schedules<'a>, ModelError> {
        Ok(Schedules {
            list: ListView::from_slice("Schedules", self.view.list("schedules")?),
            tz: self.timezone()?,
            default_type: None,
        })
    }

    /// Legacy heating schedules; entries without a `type` are heating ones.
    pub fn therm_schedules(&self) -> Result<Schedules<'a>, ModelError> {
        Ok(Schedules {
            list: ListView::from_slice("Schedules", self.view.list("therm_schedules")?),
            tz: self.timezone()?,
            default_type: Some(ScheduleType::Therm),
        })
    }

    /// The schedule flagged `selected`, if any.
    pub fn selected_schedule(&self) -> Result<Option<Schedule<'a>>, ModelError> {
        for schedule in self.schedules()?.iter() {
            let schedule = schedule?;
            if schedule.selected()? {
                return Ok(Some(schedule));
            }
        }
        Ok(None)
    }

    pub fn to_node(&self) -> Node {
        self.view.to_node()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoomsData<'a> {
    list: ListView<'a>,
}

impl<'a> RoomsData<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(RoomsData {
            list: ListView::new("RoomsData", node)?,
        })
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<RoomData<'a>, ModelError>> + 'a {
        self.list.iter().map(RoomData::new)
    }

    pub fn get_by_id(&self, id: &RoomId) -> Result<Option<RoomData<'a>>, ModelError> {
        find_by_id(self.list, RoomData::new, RoomData::id, id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoomData<'a> {
    view: MapView<'a>,
}

impl<'a> RoomData<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(RoomData {
            view: MapView::new("RoomData", node)?,
        })
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn id(&self) -> Result<RoomId, ModelError> {
        self.view.get("id").map(RoomId)
    }

    pub fn name(&self) -> Result<&'a str, ModelError> {
        self.view.get("name")
    }

    pub fn room_type(&self) -> Result<Option<&'a str>, ModelError> {
        self.view.optional("type")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModulesData<'a> {
    list: ListView<'a>,
}

impl<'a> ModulesData<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(ModulesData {
            list: ListView::new("ModulesData", node)?,
        })
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<ModuleData<'a>, ModelError>> + 'a {
        self.list.iter().map(ModuleData::new)
    }

    pub fn get_by_id(&self, id: &ModuleId) -> Result<Option<ModuleData<'a>>, ModelError> {
        find_by_id(self.list, ModuleData::new, ModuleData::id, id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModuleData<'a> {
    view: MapView<'a>,
}

impl<'a> ModuleData<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(ModuleData {
            view: MapView::new("ModuleData", node)?,
        })
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn id(&self) -> Result<ModuleId, ModelError> {
        decode_id(&self.view, ModuleId::from_hex)
    }

    pub fn name(&self) -> Result<&'a str, ModelError> {
        self.view.get("name")
    }

    /// Hardware model code, e.g. `NAPlug` or `BNTH`.
    pub fn module_type(&self) -> Result<&'a str, ModelError> {
        self.view.get("type")
    }

    pub fn room_id(&self) -> Result<Option<RoomId>, ModelError> {
        Ok(self.view.optional::<i64>("room_id")?.map(RoomId))
    }

    /// The module relaying this one to the cloud.
    pub fn bridge(&self) -> Result<Option<ModuleId>, ModelError> {
        match self.view.optional::<&str>("bridge")? {
            None => Ok(None),
            Some(raw) => ModuleId::from_hex(raw).map(Some).map_err(|e| ModelError::Id {
                entity: self.view.entity(),
                value: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schedules<'a> {
    list: ListView<'a>,
    tz: Tz,
    default_type: Option<ScheduleType>,
}

impl<'a> Schedules<'a> {
    /// Schedules of a home whose time zone is `tz`.
    pub fn new(node: &'a Node, tz: Tz) -> Result<Self, ModelError> {
        Ok(Schedules {
            list: ListView::new("Schedules", node)?,
            tz,
            default_type: None,
        })
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Schedule<'a>, ModelError>> + '_ {
        self.list.iter().map(|node| self.schedule(node))
    }

    pub fn get_by_id(&self, id: &ScheduleId) -> Result<Option<Schedule<'a>>, ModelError> {
        find_by_id(self.list, |node| self.schedule(node), Schedule::id, id)
    }

    fn schedule(&self, node: &'a Node) -> Result<Schedule<'a>, ModelError> {
        Ok(Schedule {
            view: MapView::new("Schedule", node)?,
            tz: self.tz,
            default_type: self.default_type.clone(),
        })
    }
}

/// A weekly schedule bound to its home's time zone.
#[derive(Debug, Clone)]
pub struct Schedule<'a> {
    view: MapView<'a>,
    tz: Tz,
    default_type: Option<ScheduleType>,
}

impl<'a> Schedule<'a> {
    pub fn new(node: &'a Node, tz: Tz) -> Result<Self, ModelError> {
        Ok(Schedule {
            view: MapView::new("Schedule", node)?,
            tz,
            default_type: None,
        })
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn id(&self) -> Result<ScheduleId, ModelError> {
        decode_id(&self.view, ScheduleId::from_hex)
    }

    pub fn name(&self) -> Result<&'a str, ModelError> {
        self.view.get("name")
    }

    pub fn selected(&self) -> Result<bool, ModelError> {
        self.view.get("selected")
    }

    pub fn schedule_type(&self) -> Result<ScheduleType, ModelError> {
        match (self.view.find::<&str>("type")?, &self.default_type) {
            (Some(tag), _) => Ok(ScheduleType::from_tag(tag)),
            (None, Some(default)) => Ok(default.clone()),
            (None, None) => Err(ModelError::Attribute {
                entity: self.view.entity(),
                key: "type".to_string(),
            }),
        }
    }

    pub fn timetable(&self) -> Result<Timetable<'a>, ModelError> {
        Ok(Timetable::new(
            ListView::from_slice("Timetable", self.view.list("timetable")?),
            self.tz,
            self.schedule_type()?,
        ))
    }

    pub fn zones(&self) -> Result<Zones<'a>, ModelError> {
        Ok(Zones {
            list: ListView::from_slice("Zones", self.view.list("zones")?),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Zones<'a> {
    list: ListView<'a>,
}

impl<'a> Zones<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(Zones {
            list: ListView::new("Zones", node)?,
        })
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Zone<'a>, ModelError>> + 'a {
        self.list.iter().map(Zone::new)
    }

    pub fn get_by_id(&self, id: &ZoneId) -> Result<Option<Zone<'a>>, ModelError> {
        find_by_id(self.list, Zone::new, Zone::id, id)
    }
}

/// A named temperature or mode preset referenced by timepoints.
#[derive(Debug, Clone, Copy)]
pub struct Zone<'a> {
    view: MapView<'a>,
}

impl<'a> Zone<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(Zone {
            view: MapView::new("Zone", node)?,
        })
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn id(&self) -> Result<ZoneId, ModelError> {
        self.view.get("id").map(ZoneId)
    }

    pub fn name(&self) -> Result<&'a str, ModelError> {
        self.view.get("name")
    }

    pub fn zone_type(&self) -> Result<Option<i64>, ModelError> {
        self.view.optional("type")
    }
}
