pub mod models {
    pub mod error;
    pub mod ids;
    pub mod netatmo;
    pub mod node;
    pub mod status;
}

pub mod config;
pub mod source;
pub mod utils;
pub mod services {
    pub mod timetable;
    pub mod zone_index;
}

pub use models::error::ModelError;
pub use models::ids::{HomeId, ModuleId, RoomId, ScheduleId, ZoneId};
pub use models::netatmo::{HomeData, HomesData, Schedule, Zone};
pub use models::node::{FromNode, ListView, MapView, Node, NodeKind};
pub use models::status::HomeStatus;
pub use services::timetable::{Period, ScheduleType, Timepoint, Timetable};
pub use services::zone_index::{ZoneIndex, ZonePeriod};
pub use source::{FileSource, SnapshotSource, SourceError};
