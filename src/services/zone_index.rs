//! Zone lookups over a schedule: which preset is active at an instant and
//! which presets the transitions of a week or period switch to.

use crate::models::error::ModelError;
use crate::models::netatmo::{Schedule, Zone, Zones};
use crate::services::timetable::{Period, Timepoint, Timetable};
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use std::iter::FusedIterator;

impl<'a> Timetable<'a> {
    /// Timepoint in force at `at`: the latest one starting at or before it
    /// in its home week, else the last timepoint of the previous week.
    pub fn timepoint_at<Z: TimeZone>(&self, at: &DateTime<Z>) -> Result<Timepoint<'a>, ModelError> {
        let occurrences = self.occurrences(self.week_monday(at)?)?;
        let at = at.naive_utc();
        let current = occurrences
            .iter()
            .rev()
            .find(|(start, _)| start.naive_utc() <= at)
            .or(occurrences.last())
            .map(|(_, timepoint)| *timepoint);
        current.ok_or(ModelError::EmptyTimetable)
    }
}

/// A schedule's timetable joined with its zones.
#[derive(Debug, Clone)]
pub struct ZoneIndex<'a> {
    timetable: Timetable<'a>,
    zones: Zones<'a>,
}

impl<'a> ZoneIndex<'a> {
    pub fn new(timetable: Timetable<'a>, zones: Zones<'a>) -> Self {
        ZoneIndex { timetable, zones }
    }

    pub fn timetable(&self) -> &Timetable<'a> {
        &self.timetable
    }

    pub fn zones(&self) -> Zones<'a> {
        self.zones
    }

    /// Zone a timepoint points at; `None` when the schedule lacks it.
    pub fn zone_of(&self, timepoint: &Timepoint<'_>) -> Result<Option<Zone<'a>>, ModelError> {
        self.zones.get_by_id(&timepoint.zone_id()?)
    }

    pub fn zone_at<Z: TimeZone>(&self, at: &DateTime<Z>) -> Result<Option<Zone<'a>>, ModelError> {
        self.zone_of(&self.timetable.timepoint_at(at)?)
    }

    pub fn week<Z: TimeZone>(
        &self,
        week: &DateTime<Z>,
    ) -> Result<Vec<(DateTime<Z>, Option<Zone<'a>>)>, ModelError> {
        self.timetable
            .resolve_week(week)?
            .into_iter()
            .map(|(at, timepoint)| Ok((at, self.zone_of(&timepoint)?)))
            .collect()
    }

    pub fn week_home<Z: TimeZone>(
        &self,
        week: &DateTime<Z>,
    ) -> Result<Vec<(DateTime<Tz>, Option<Zone<'a>>)>, ModelError> {
        self.timetable
            .resolve_week_home(week)?
            .into_iter()
            .map(|(at, timepoint)| Ok((at, self.zone_of(&timepoint)?)))
            .collect()
    }

    pub fn period<Z: TimeZone, Z2: TimeZone>(
        &self,
        from: &DateTime<Z>,
        to: &DateTime<Z2>,
        max_count: Option<usize>,
    ) -> ZonePeriod<'a, Z> {
        ZonePeriod {
            period: self.timetable.resolve_period(from, to, max_count),
            zones: self.zones,
        }
    }

    pub fn period_home<Z: TimeZone, Z2: TimeZone>(
        &self,
        from: &DateTime<Z>,
        to: &DateTime<Z2>,
        max_count: Option<usize>,
    ) -> ZonePeriod<'a, Tz> {
        ZonePeriod {
            period: self.timetable.resolve_period_home(from, to, max_count),
            zones: self.zones,
        }
    }
}

/// [`Period`] with each transition's zone looked up.
#[derive(Debug, Clone)]
pub struct ZonePeriod<'a, Z: TimeZone> {
    period: Period<'a, Z>,
    zones: Zones<'a>,
}

impl<'a, Z: TimeZone> Iterator for ZonePeriod<'a, Z> {
    type Item = Result<(DateTime<Z>, Option<Zone<'a>>), ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (at, timepoint) = match self.period.next()? {
            Ok(resolved) => resolved,
            Err(e) => return Some(Err(e)),
        };
        let zone = timepoint.zone_id().and_then(|id| self.zones.get_by_id(&id));
        Some(zone.map(|zone| (at, zone)))
    }
}

impl<'a, Z: TimeZone> FusedIterator for ZonePeriod<'a, Z> {}

impl<'a> Schedule<'a> {
    pub fn index(&self) -> Result<ZoneIndex<'a>, ModelError> {
        Ok(ZoneIndex::new(self.timetable()?, self.zones()?))
    }

    /// Zone active at `at`, `None` if the timetable points at an unknown zone.
    pub fn zone_at<Z: TimeZone>(&self, at: &DateTime<Z>) -> Result<Option<Zone<'a>>, ModelError> {
        self.index()?.zone_at(at)
    }

    pub fn week_zones<Z: TimeZone>(
        &self,
        week: &DateTime<Z>,
    ) -> Result<Vec<(DateTime<Z>, Option<Zone<'a>>)>, ModelError> {
        self.index()?.week(week)
    }

    pub fn period_zones<Z: TimeZone, Z2: TimeZone>(
        &self,
        from: &DateTime<Z>,
        to: &DateTime<Z2>,
        max_count: Option<usize>,
    ) -> Result<ZonePeriod<'a, Z>, ModelError> {
        Ok(self.index()?.period(from, to, max_count))
    }
}
