//! Projection of weekly timetables onto absolute instants.
//!
//! A timepoint's `m_offset` counts minutes since Monday 00:00 in the
//! home's own wall-clock time. Weeks are therefore always delimited in the
//! home time zone, whatever zone the caller's reference instant carries,
//! and offsets are applied to the calendar (not added as durations) so a
//! DST change inside the week does not shift later timepoints.

use crate::models::error::ModelError;
use crate::models::ids::ZoneId;
use crate::models::node::{ListView, MapView, Node};
use chrono::{
    DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use log::{debug, warn};
use std::collections::VecDeque;
use std::iter::FusedIterator;

pub const MINUTES_PER_DAY: i64 = 24 * 60;
pub const MINUTES_PER_WEEK: i64 = 7 * MINUTES_PER_DAY;

/// Schedule type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScheduleType {
    Therm,
    Cooling,
    Other(String),
}

impl ScheduleType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "therm" => ScheduleType::Therm,
            "cooling" => ScheduleType::Cooling,
            other => ScheduleType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ScheduleType::Therm => "therm",
            ScheduleType::Cooling => "cooling",
            ScheduleType::Other(tag) => tag,
        }
    }

    /// Timepoints of slotted schedules open a slot lasting until the next
    /// timepoint, so the last slot of a week runs on into the next Monday.
    pub fn is_slotted(&self) -> bool {
        matches!(self, ScheduleType::Therm | ScheduleType::Cooling)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Timepoint<'a> {
    view: MapView<'a>,
}

impl<'a> Timepoint<'a> {
    pub fn new(node: &'a Node) -> Result<Self, ModelError> {
        Ok(Timepoint {
            view: MapView::new("Timepoint", node)?,
        })
    }

    pub fn view(&self) -> MapView<'a> {
        self.view
    }

    pub fn zone_id(&self) -> Result<ZoneId, ModelError> {
        self.view.get("zone_id").map(ZoneId)
    }

    /// Minutes since Monday 00:00 home-local time, normally in `[0, 10080)`.
    pub fn m_offset(&self) -> Result<i64, ModelError> {
        self.view.get("m_offset")
    }

    /// Offset as a duration since the start of the week.
    pub fn offset(&self) -> Result<TimeDelta, ModelError> {
        let minutes = self.m_offset()?;
        TimeDelta::try_minutes(minutes).ok_or_else(|| ModelError::OutOfRange(format!("m_offset {}", minutes)))
    }
}

/// A resolved occurrence of a timepoint.
pub type Resolved<'a, Z> = (DateTime<Z>, Timepoint<'a>);

/// Ordered timepoints of a schedule, bound to the home time zone.
#[derive(Debug, Clone)]
pub struct Timetable<'a> {
    list: ListView<'a>,
    tz: Tz,
    kind: ScheduleType,
}

impl<'a> Timetable<'a> {
    pub fn new(list: ListView<'a>, tz: Tz, kind: ScheduleType) -> Self {
        Timetable { list, tz, kind }
    }

    pub fn from_node(node: &'a Node, tz: Tz, kind: ScheduleType) -> Result<Self, ModelError> {
        Ok(Timetable::new(ListView::new("Timetable", node)?, tz, kind))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn schedule_type(&self) -> &ScheduleType {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get_index(&self, index: usize) -> Result<Option<Timepoint<'a>>, ModelError> {
        self.list.get(index).map(Timepoint::new).transpose()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Timepoint<'a>, ModelError>> + 'a {
        self.list.iter().map(Timepoint::new)
    }

    /// Instant of `timepoint` in the home week containing `week`, expressed
    /// in `week`'s time zone.
    pub fn resolve_instant<Z: TimeZone>(
        &self,
        timepoint: &Timepoint<'_>,
        week: &DateTime<Z>,
    ) -> Result<DateTime<Z>, ModelError> {
        Ok(self.resolve_instant_home(timepoint, week)?.with_timezone(&week.timezone()))
    }

    /// Same as [`Timetable::resolve_instant`], expressed in the home time zone.
    pub fn resolve_instant_home<Z: TimeZone>(
        &self,
        timepoint: &Timepoint<'_>,
        week: &DateTime<Z>,
    ) -> Result<DateTime<Tz>, ModelError> {
        let monday = self.week_monday(week)?;
        self.project(timepoint.m_offset()?, monday)
    }

    /// All transitions of the home week containing `week`, ascending.
    ///
    /// For slotted schedules the Monday 00:00 timepoint is dropped when it
    /// selects the same zone as the last timepoint of the week: it merely
    /// continues the previous week's last slot.
    pub fn resolve_week<Z: TimeZone>(&self, week: &DateTime<Z>) -> Result<Vec<Resolved<'a, Z>>, ModelError> {
        let out = week.timezone();
        let entries = self.week_entries(self.week_monday(week)?)?;
        Ok(entries
            .into_iter()
            .map(|(at, timepoint)| (at.with_timezone(&out), timepoint))
            .collect())
    }

    pub fn resolve_week_home<Z: TimeZone>(&self, week: &DateTime<Z>) -> Result<Vec<Resolved<'a, Tz>>, ModelError> {
        self.week_entries(self.week_monday(week)?)
    }

    /// Transitions within `[from, to]`, at most `max_count` of them,
    /// expressed in `from`'s time zone. The returned iterator owns its
    /// cursor; calling again (or cloning) restarts the walk.
    pub fn resolve_period<Z: TimeZone, Z2: TimeZone>(
        &self,
        from: &DateTime<Z>,
        to: &DateTime<Z2>,
        max_count: Option<usize>,
    ) -> Period<'a, Z> {
        Period::new(self.clone(), from, to, max_count, from.timezone())
    }

    pub fn resolve_period_home<Z: TimeZone, Z2: TimeZone>(
        &self,
        from: &DateTime<Z>,
        to: &DateTime<Z2>,
        max_count: Option<usize>,
    ) -> Period<'a, Tz> {
        Period::new(self.clone(), from, to, max_count, self.tz)
    }

    /// Home-local date of the Monday starting the week that contains `at`.
    pub(crate) fn week_monday<Z: TimeZone>(&self, at: &DateTime<Z>) -> Result<NaiveDate, ModelError> {
        let utc = at.naive_utc();
        let offset = self.tz.offset_from_utc_datetime(&utc).fix();
        let date = utc
            .checked_add_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
            .ok_or_else(|| ModelError::OutOfRange(format!("home-local time of {}", utc)))?
            .date();
        let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
        date.checked_sub_days(back)
            .ok_or_else(|| ModelError::OutOfRange(format!("week of {}", date)))
    }

    /// Wall-clock time `m_offset` minutes into the week starting `monday`,
    /// localized in the home time zone.
    pub(crate) fn project(&self, m_offset: i64, monday: NaiveDate) -> Result<DateTime<Tz>, ModelError> {
        let out_of_range = || ModelError::OutOfRange(format!("m_offset {} from {}", m_offset, monday));
        let days = m_offset.div_euclid(MINUTES_PER_DAY);
        let minutes = m_offset.rem_euclid(MINUTES_PER_DAY);
        let date = TimeDelta::try_days(days)
            .and_then(|d| monday.checked_add_signed(d))
            .ok_or_else(out_of_range)?;
        let time = NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0).ok_or_else(out_of_range)?;
        localize(&self.tz, date.and_time(time)).ok_or_else(out_of_range)
    }

    /// Every timepoint resolved in the week starting `monday`, ascending.
    pub(crate) fn occurrences(&self, monday: NaiveDate) -> Result<Vec<Resolved<'a, Tz>>, ModelError> {
        if self.list.is_empty() {
            return Err(ModelError::EmptyTimetable);
        }
        let mut resolved = self
            .iter()
            .map(|timepoint| {
                let timepoint = timepoint?;
                let m_offset = timepoint.m_offset()?;
                if !(0..MINUTES_PER_WEEK).contains(&m_offset) {
                    warn!("Timetable: m_offset {} lies outside the week; resolving anyway", m_offset);
                }
                Ok((self.project(m_offset, monday)?, timepoint))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        resolved.sort_by_key(|(at, _)| at.naive_utc());
        Ok(resolved)
    }

    /// Occurrences of the week with the continuation rule applied.
    pub(crate) fn week_entries(&self, monday: NaiveDate) -> Result<Vec<Resolved<'a, Tz>>, ModelError> {
        let mut resolved = self.occurrences(monday)?;
        if self.kind.is_slotted() {
            let continues = match (resolved.first(), resolved.last()) {
                (Some((_, first)), Some((_, last))) => first.zone_id()? == last.zone_id()?,
                _ => false,
            };
            if continues {
                let (at, _) = resolved.remove(0);
                debug!("Timetable: week of {} continues last slot at {}", monday, at);
            }
        }
        Ok(resolved)
    }
}

/// Localize a naive home wall-clock value.
///
/// A folded time resolves to its earlier instant. A time inside a gap is
/// read with the offset in force before the transition, landing just after
/// it (02:30 on a spring-forward night reads as 03:30).
fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) => Some(at),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let probe = naive.checked_sub_signed(TimeDelta::days(1)).unwrap_or(naive);
            let before = tz.offset_from_utc_datetime(&probe).fix();
            let utc = naive.checked_sub_signed(TimeDelta::seconds(i64::from(before.local_minus_utc())))?;
            Some(tz.from_utc_datetime(&utc))
        }
    }
}

/// Lazy walk over the transitions of consecutive home weeks.
#[derive(Debug, Clone)]
pub struct Period<'a, Z: TimeZone> {
    timetable: Timetable<'a>,
    out: Z,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    max_count: Option<usize>,
    next_monday: Option<NaiveDate>,
    pending: VecDeque<Resolved<'a, Tz>>,
    emitted: usize,
    failed: Option<ModelError>,
}

impl<'a, Z: TimeZone> Period<'a, Z> {
    fn new<F: TimeZone, T: TimeZone>(
        timetable: Timetable<'a>,
        from: &DateTime<F>,
        to: &DateTime<T>,
        max_count: Option<usize>,
        out: Z,
    ) -> Self {
        let (next_monday, failed) = match timetable.week_monday(from) {
            Ok(monday) => (Some(monday), None),
            Err(e) => (None, Some(e)),
        };
        Period {
            timetable,
            out,
            from: from.with_timezone(&Utc),
            to: to.with_timezone(&Utc),
            max_count,
            next_monday,
            pending: VecDeque::new(),
            emitted: 0,
            failed,
        }
    }

    fn finish(&mut self) {
        self.next_monday = None;
        self.pending.clear();
    }
}

impl<'a, Z: TimeZone> Iterator for Period<'a, Z> {
    type Item = Result<Resolved<'a, Z>, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.failed.take() {
            self.finish();
            return Some(Err(err));
        }
        loop {
            if self.max_count.is_some_and(|max| self.emitted >= max) {
                self.finish();
                return None;
            }
            if let Some((at, timepoint)) = self.pending.pop_front() {
                let utc = at.with_timezone(&Utc);
                if utc > self.to {
                    self.finish();
                    return None;
                }
                if utc < self.from {
                    continue;
                }
                self.emitted += 1;
                return Some(Ok((at.with_timezone(&self.out), timepoint)));
            }
            let monday = self.next_monday?;
            match self.timetable.week_entries(monday) {
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
                Ok(entries) if entries.is_empty() => {
                    debug!("Timetable: week of {} has no transitions; period exhausted", monday);
                    self.finish();
                    return None;
                }
                Ok(entries) => {
                    self.pending = entries.into();
                    self.next_monday = monday.checked_add_days(Days::new(7));
                }
            }
        }
    }
}

impl<'a, Z: TimeZone> FusedIterator for Period<'a, Z> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use chrono_tz::Europe::Vienna;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    fn single_timepoint() -> Node {
        Node::from_value(&json!([{"zone_id": 1, "m_offset": 0}])).unwrap()
    }

    fn load_heating_timetable() -> Node {
        let json = std::fs::read_to_string("tests/data/homes_data.json").expect("fixture present");
        let node: Node = serde_json::from_str(&json).expect("parse homes data");
        node.get("body")
            .and_then(|b| b.get("homes"))
            .and_then(|h| h.at(0))
            .and_then(|h| h.get("schedules"))
            .and_then(|s| s.at(0))
            .and_then(|s| s.get("timetable"))
            .cloned()
            .expect("fixture has a heating timetable")
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn vienna(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        Vienna.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn resolves_instant_in_reference_zone() {
        let node = single_timepoint();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let tp = timetable.get_index(0).unwrap().unwrap();

        let plus_two = FixedOffset::east_opt(7200).unwrap();
        let reference = plus_two.with_ymd_and_hms(2022, 4, 4, 0, 0, 0).unwrap();
        let at = timetable.resolve_instant(&tp, &reference).unwrap();
        assert_eq!(at, reference);
        assert_eq!(at.offset(), &plus_two);

        let reference = vienna(2022, 4, 4, 0, 0);
        assert_eq!(timetable.resolve_instant(&tp, &reference).unwrap(), reference);
    }

    #[test]
    fn week_is_delimited_in_home_zone() {
        let node = single_timepoint();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let tp = timetable.get_index(0).unwrap().unwrap();

        // Monday midnight in Vienna, seen from UTC.
        let at = timetable.resolve_instant_home(&tp, &utc(2022, 4, 3, 22, 0)).unwrap();
        assert_eq!(at, vienna(2022, 4, 4, 0, 0));
        assert_eq!(at.timezone(), Vienna);

        // UTC Monday midnight is already 02:00 in Vienna: same home week.
        let at = timetable.resolve_instant(&tp, &utc(2022, 4, 4, 0, 0)).unwrap();
        assert_eq!(at, utc(2022, 4, 3, 22, 0));

        // One minute before the Vienna week starts belongs to the previous week.
        let at = timetable.resolve_instant(&tp, &utc(2022, 4, 3, 21, 59)).unwrap();
        assert_eq!(at, utc(2022, 3, 27, 22, 0));
    }

    #[test]
    fn week_of_extreme_instants_is_out_of_range() {
        let node = single_timepoint();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let tp = timetable.get_index(0).unwrap().unwrap();

        // Vienna wall-clock time of the last UTC instant lies past the calendar.
        let max = DateTime::<Utc>::MAX_UTC;
        assert!(matches!(timetable.resolve_instant(&tp, &max), Err(ModelError::OutOfRange(_))));
        assert!(matches!(timetable.resolve_week_home(&max), Err(ModelError::OutOfRange(_))));
        assert!(matches!(timetable.timepoint_at(&max), Err(ModelError::OutOfRange(_))));
        let mut period = timetable.resolve_period(&max, &max, None);
        assert!(matches!(period.next(), Some(Err(ModelError::OutOfRange(_)))));
        assert!(period.next().is_none());

        let min = DateTime::<Utc>::MIN_UTC;
        assert!(matches!(timetable.resolve_instant(&tp, &min), Err(ModelError::OutOfRange(_))));
    }

    #[test]
    fn offsets_follow_the_wall_clock_across_dst() {
        let node = Node::from_value(&json!([
            {"zone_id": 1, "m_offset": 0},
            {"zone_id": 2, "m_offset": 6 * MINUTES_PER_DAY + 12 * 60},
            {"zone_id": 3, "m_offset": 6 * MINUTES_PER_DAY + 150},
        ]))
        .unwrap();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Other("event".into())).unwrap();
        let reference = vienna(2022, 3, 23, 12, 0);

        let monday = timetable.get_index(0).unwrap().unwrap();
        assert_eq!(timetable.resolve_instant(&monday, &reference).unwrap(), utc(2022, 3, 20, 23, 0));

        // Sunday noon after the switch to CEST is 10:00 UTC, not 11:00.
        let noon = timetable.get_index(1).unwrap().unwrap();
        assert_eq!(
            timetable.resolve_instant(&noon, &reference.with_timezone(&Utc)).unwrap(),
            utc(2022, 3, 27, 10, 0)
        );

        // 02:30 does not exist that night; it reads as 03:30 CEST.
        let gap = timetable.get_index(2).unwrap().unwrap();
        let at = timetable.resolve_instant_home(&gap, &reference).unwrap();
        assert_eq!(at, utc(2022, 3, 27, 1, 30));
        assert_eq!(at.naive_local().to_string(), "2022-03-27 03:30:00");
    }

    #[test]
    fn folded_time_takes_earliest_instant() {
        let node = Node::from_value(&json!([{"zone_id": 1, "m_offset": 6 * MINUTES_PER_DAY + 150}])).unwrap();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let tp = timetable.get_index(0).unwrap().unwrap();
        let at = timetable.resolve_instant(&tp, &utc(2022, 10, 26, 12, 0)).unwrap();
        assert_eq!(at, utc(2022, 10, 30, 0, 30));
    }

    #[test]
    fn week_drops_continuation_for_slotted_types() {
        let node = load_heating_timetable();
        let heating = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let week = heating.resolve_week_home(&vienna(2022, 4, 6, 12, 0)).unwrap();
        assert_eq!(week.len(), heating.len() - 1);
        assert_eq!(week[0].0, vienna(2022, 4, 4, 7, 0));
        assert_eq!(week[13].0, vienna(2022, 4, 10, 22, 0));
        assert!(week.windows(2).all(|w| w[0].0 < w[1].0));

        let other = Timetable::from_node(&node, Vienna, ScheduleType::Other("event".into())).unwrap();
        let week = other.resolve_week(&utc(2022, 4, 6, 12, 0)).unwrap();
        assert_eq!(week.len(), other.len());
        assert_eq!(week[0].0, utc(2022, 4, 3, 22, 0));

        let cooling = Node::from_value(&json!([
            {"zone_id": 3, "m_offset": 0},
            {"zone_id": 2, "m_offset": 600},
            {"zone_id": 4, "m_offset": 1200},
        ]))
        .unwrap();
        let cooling = Timetable::from_node(&cooling, Vienna, ScheduleType::Cooling).unwrap();
        assert_eq!(cooling.resolve_week(&utc(2022, 4, 6, 12, 0)).unwrap().len(), 3);
    }

    #[test]
    fn empty_timetable_is_an_error_everywhere() {
        let node = Node::List(vec![]);
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let now = utc(2022, 4, 6, 12, 0);
        assert_eq!(timetable.resolve_week(&now).unwrap_err(), ModelError::EmptyTimetable);

        let mut period = timetable.resolve_period(&now, &utc(2023, 1, 1, 0, 0), None);
        assert_eq!(period.next().unwrap().unwrap_err(), ModelError::EmptyTimetable);
        assert!(period.next().is_none());
    }

    #[test]
    fn week_without_transitions_ends_period() {
        let node = single_timepoint();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let now = utc(2022, 4, 6, 12, 0);
        assert!(timetable.resolve_week(&now).unwrap().is_empty());
        assert_eq!(timetable.resolve_period(&now, &utc(2030, 1, 1, 0, 0), None).count(), 0);
    }

    #[test]
    fn period_walks_weeks_within_bounds() {
        let node = load_heating_timetable();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let from = vienna(2022, 4, 6, 12, 0);
        let to = vienna(2022, 4, 12, 12, 0);

        let all: Vec<_> = timetable
            .resolve_period(&from, &to, None)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0].0, vienna(2022, 4, 6, 22, 0));
        assert_eq!(all[11].0, vienna(2022, 4, 12, 7, 0));

        let limited: Vec<_> = timetable
            .resolve_period(&from.with_timezone(&Utc), &to, Some(5))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(limited.len(), 5);
        assert_eq!(limited[0].0, utc(2022, 4, 6, 20, 0));
        assert_eq!(limited[0].1.zone_id().unwrap(), ZoneId(1));
    }

    #[test]
    fn period_continues_past_a_week_fully_before_from() {
        let node = load_heating_timetable();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let from = vienna(2022, 4, 10, 23, 0);
        let first = timetable
            .resolve_period_home(&from, &vienna(2022, 4, 20, 0, 0), Some(1))
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(first.0, vienna(2022, 4, 11, 7, 0));
    }

    #[test]
    fn period_is_restartable() {
        let node = load_heating_timetable();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let from = utc(2022, 3, 20, 0, 0);
        let to = utc(2022, 5, 1, 0, 0);

        fn collect(period: Period<'_, Utc>) -> Vec<DateTime<Utc>> {
            period.map(|r| r.unwrap().0).collect()
        }
        let first = collect(timetable.resolve_period(&from, &to, Some(40)));
        let second = collect(timetable.resolve_period(&from, &to, Some(40)));
        assert_eq!(first.len(), 40);
        assert_eq!(first, second);

        let mut period = timetable.resolve_period(&from, &to, Some(40));
        period.next();
        let rest = collect(period.clone());
        assert_eq!(rest, first[1..].to_vec());
        assert_eq!(collect(period), rest);
    }

    #[test]
    fn randomized_properties() {
        let node = load_heating_timetable();
        let timetable = Timetable::from_node(&node, Vienna, ScheduleType::Therm).unwrap();
        let timepoints: Vec<_> = timetable.iter().collect::<Result<_, _>>().unwrap();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let start = utc(2020, 1, 1, 0, 0).timestamp();
        let end = utc(2026, 1, 1, 0, 0).timestamp();

        for _ in 0..300 {
            let offset = FixedOffset::east_opt(rng.random_range(-12..=14) * 3600).unwrap();
            let reference = offset.timestamp_opt(rng.random_range(start..end), 0).unwrap();

            for tp in &timepoints {
                let at = timetable.resolve_instant(tp, &reference).unwrap();
                let home = timetable.resolve_instant_home(tp, &reference).unwrap();
                assert_eq!(at.offset(), reference.offset());
                assert_eq!(home.with_timezone(&offset), at);
                assert_eq!(at.with_timezone(&Vienna).with_timezone(&offset), at);
                assert_eq!(timetable.week_monday(&at).unwrap(), timetable.week_monday(&reference).unwrap());
            }

            let week = timetable.resolve_week(&reference).unwrap();
            assert_eq!(week.len(), timepoints.len() - 1);
            assert!(week.windows(2).all(|w| w[0].0 < w[1].0));

            let to = reference.clone() + TimeDelta::hours(rng.random_range(0..400));
            let max = rng.random_range(0..20usize);
            let period: Vec<_> = timetable
                .resolve_period(&reference, &to, Some(max))
                .collect::<Result<_, _>>()
                .unwrap();
            assert!(period.len() <= max);
            assert!(period.iter().all(|(at, _)| *at >= reference && *at <= to));
        }
    }

    #[test]
    fn schedule_type_tags() {
        assert!(ScheduleType::from_tag("therm").is_slotted());
        assert!(ScheduleType::from_tag("cooling").is_slotted());
        let event = ScheduleType::from_tag("event");
        assert!(!event.is_slotted());
        assert_eq!(event.as_str(), "event");
    }

    #[test]
    fn timepoint_fields() {
        let node = Node::from_value(&json!({"zone_id": 4, "m_offset": 1500})).unwrap();
        let tp = Timepoint::new(&node).unwrap();
        assert_eq!(tp.zone_id().unwrap(), ZoneId(4));
        assert_eq!(tp.offset().unwrap(), TimeDelta::minutes(1500));

        let missing = Node::from_value(&json!({"zone_id": 4})).unwrap();
        assert!(matches!(
            Timepoint::new(&missing).unwrap().m_offset(),
            Err(ModelError::Attribute { .. })
        ));
    }
}
