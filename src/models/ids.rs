//! Identity newtypes for homes, schedules, modules, rooms and zones.
//!
//! Home and schedule ids travel as 24 lowercase hex characters (12 bytes).
//! Module ids are 6-byte MAC-style values, optionally `:`-separated.

use core::fmt;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HomeId(pub [u8; 12]);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleId(pub [u8; 12]);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub [u8; 6]);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub i64);

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], hex::FromHexError> {
    let mut buf = [0u8; N];
    hex::decode_to_slice(s, &mut buf)?;
    Ok(buf)
}

impl HomeId {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_fixed(s).map(HomeId)
    }
}

impl ScheduleId {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_fixed(s).map(ScheduleId)
    }
}

impl ModuleId {
    /// Accepts `70:ee:50:00:00:01` as well as `70ee50000001`.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let stripped: String = s.chars().filter(|c| *c != ':').collect();
        decode_fixed(&stripped).map(ModuleId)
    }
}

impl Display for HomeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Display for ScheduleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.0.iter().map(|b| format!("{:02x}", b)).collect();
        f.write_str(&pairs.join(":"))
    }
}

impl Display for RoomId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HomeId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HomeId::from_hex(s)
    }
}

impl FromStr for ScheduleId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScheduleId::from_hex(s)
    }
}

impl FromStr for ModuleId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleId::from_hex(s)
    }
}

// Byte ids serialize as their canonical text form.

impl Serialize for HomeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for ScheduleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for ModuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn home_id_round_trips_through_hex() {
        let id = HomeId::from_hex("60478d1baf36ee032f3e0070").unwrap();
        assert_eq!(id.0, [0x60, 0x47, 0x8d, 0x1b, 0xaf, 0x36, 0xee, 0x03, 0x2f, 0x3e, 0x00, 0x70]);
        assert_eq!(id.to_string(), "60478d1baf36ee032f3e0070");

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let bytes: [u8; 12] = rng.random();
            let text = hex::encode_upper(bytes);
            let decoded = HomeId::from_hex(&text).unwrap();
            assert_eq!(decoded.to_string(), text.to_lowercase());
        }
    }

    #[test]
    fn home_id_rejects_bad_encoding() {
        assert!(HomeId::from_hex("60478d1baf36ee032f3e00").is_err());
        assert!(HomeId::from_hex("60478d1baf36ee032f3e007z").is_err());
        assert!(HomeId::from_hex("").is_err());
    }

    #[test]
    fn byte_ids_parse_from_text() {
        let schedule: ScheduleId = "604790030B9B6457A95AC54B".parse().unwrap();
        assert_eq!(schedule, ScheduleId::from_hex("604790030b9b6457a95ac54b").unwrap());
        assert_eq!(schedule.to_string(), "604790030b9b6457a95ac54b");
        assert!("604790030b9b6457a95ac5".parse::<ScheduleId>().is_err());

        let home: HomeId = "60478d1baf36ee032f3e0070".parse().unwrap();
        assert_eq!(home.to_string(), "60478d1baf36ee032f3e0070");
    }

    #[test]
    fn module_id_strips_separators() {
        let id: ModuleId = "00:03:50:b7:71:be".parse().unwrap();
        assert_eq!(id.0, [0x00, 0x03, 0x50, 0xb7, 0x71, 0xbe]);
        assert_eq!(ModuleId::from_hex("000350b771be").unwrap(), id);
        assert_eq!(id.to_string(), "00:03:50:b7:71:be");
        assert!(ModuleId::from_hex("00:03:50:b7:71").is_err());
    }

    #[test]
    fn ids_serialize_as_text() {
        let id = ModuleId([0x70, 0xee, 0x50, 0, 0, 1]);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"70:ee:50:00:00:01\"");
        assert_eq!(serde_json::to_string(&ZoneId(4)).unwrap(), "4");
    }
}
