//! GTFS snapshot reading.
//!
//! Loads the handful of files canonicalization needs from a zip archive or
//! an unpacked directory, and joins stop times onto their trips.

mod calendar;
mod source;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::{RawRoute, RawStop, RawTrip};

pub use calendar::{parse_date, useful_service_ids, ServiceException, ServicePeriod};

use calendar::{CalendarDateRecord, CalendarRecord};
use source::Source;

/// One feed snapshot, as read from disk.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub routes: Vec<RawRoute>,
    pub stops: Vec<RawStop>,
    pub trips: Vec<RawTrip>,
    /// `None` when the feed has no `calendar.txt`.
    pub calendar: Option<Vec<ServicePeriod>>,
    /// `None` when the feed has no `calendar_dates.txt`.
    pub calendar_dates: Option<Vec<ServiceException>>,
}

impl Feed {
    /// A feed without calendar files.
    pub fn new(routes: Vec<RawRoute>, stops: Vec<RawStop>, trips: Vec<RawTrip>) -> Self {
        Self {
            routes,
            stops,
            trips,
            calendar: None,
            calendar_dates: None,
        }
    }

    /// Read a feed from a `.zip` archive or a directory of `.txt` files.
    pub fn open(path: &Path) -> Result<Self, FeedError> {
        let mut source = Source::open(path)?;

        let routes: Vec<RouteRecord> = source.read("routes.txt")?;
        let stops: Vec<StopRecord> = source.read("stops.txt")?;
        let trips: Vec<TripRecord> = source.read("trips.txt")?;
        let stop_times: Vec<StopTimeRecord> = source.read("stop_times.txt")?;

        let calendar = source
            .read_optional::<CalendarRecord>("calendar.txt")?
            .map(|rows| {
                rows.into_iter()
                    .map(CalendarRecord::resolve)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        let calendar_dates = source
            .read_optional::<CalendarDateRecord>("calendar_dates.txt")?
            .map(|rows| {
                rows.into_iter()
                    .map(CalendarDateRecord::resolve)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let feed = Self {
            routes: routes.into_iter().map(RouteRecord::into_raw).collect(),
            stops: stops.into_iter().map(StopRecord::into_raw).collect(),
            trips: join_stop_times(trips, stop_times)?,
            calendar,
            calendar_dates,
        };
        info!(
            "[FEED] Loaded {} routes, {} stops, {} trips from {}",
            feed.routes.len(),
            feed.stops.len(),
            feed.trips.len(),
            path.display()
        );
        Ok(feed)
    }

    pub fn has_calendar(&self) -> bool {
        self.calendar.is_some() || self.calendar_dates.is_some()
    }

    /// Services still running on or after `today`, or `None` when the feed
    /// carries no calendar at all.
    pub fn useful_services(&self, today: NaiveDate) -> Option<HashSet<String>> {
        if !self.has_calendar() {
            return None;
        }
        Some(useful_service_ids(
            self.calendar.as_deref().unwrap_or_default(),
            self.calendar_dates.as_deref().unwrap_or_default(),
            today,
        ))
    }

    /// Drop trips whose service isn't in `services`.
    ///
    /// An empty set means nothing runs any more, so the whole feed is
    /// excluded: routes and stops go along with the trips.
    pub fn retain_services(&mut self, services: &HashSet<String>) {
        if services.is_empty() {
            warn!("[FEED] No service in effect, excluding the whole feed");
            self.routes.clear();
            self.stops.clear();
            self.trips.clear();
            return;
        }
        let before = self.trips.len();
        self.trips.retain(|trip| services.contains(&trip.service_id));
        info!(
            "[FEED] Kept {} of {} trips in current service",
            self.trips.len(),
            before
        );
    }
}

fn join_stop_times(
    trips: Vec<TripRecord>,
    stop_times: Vec<StopTimeRecord>,
) -> Result<Vec<RawTrip>, FeedError> {
    let mut by_trip: HashMap<String, Vec<(u32, String)>> = HashMap::new();
    for st in stop_times {
        by_trip
            .entry(st.trip_id)
            .or_default()
            .push((st.stop_sequence, st.stop_id));
    }

    let mut out = Vec::with_capacity(trips.len());
    for rec in trips {
        let direction_flag = match rec.direction_id {
            None | Some(0) => 0,
            Some(1) => 1,
            Some(value) => {
                return Err(FeedError::InvalidDirection {
                    trip_id: rec.trip_id,
                    value,
                })
            }
        };
        let mut times = by_trip.remove(&rec.trip_id).unwrap_or_default();
        times.sort_by_key(|(sequence, _)| *sequence);
        out.push(RawTrip {
            id: rec.trip_id,
            route_id: rec.route_id,
            service_id: rec.service_id,
            headsign: rec.trip_headsign,
            direction_flag,
            ordered_stop_sequence: times.into_iter().map(|(_, stop_id)| stop_id).collect(),
        });
    }

    if !by_trip.is_empty() {
        let mut unknown: Vec<&String> = by_trip.keys().collect();
        unknown.sort();
        warn!("[FEED] Stop times defined for unknown trips: {:?}", unknown);
    }
    Ok(out)
}

#[derive(Deserialize)]
struct RouteRecord {
    route_id: String,
    #[serde(default)]
    route_short_name: String,
    #[serde(default)]
    route_long_name: String,
    #[serde(default)]
    route_color: String,
}

impl RouteRecord {
    fn into_raw(self) -> RawRoute {
        RawRoute {
            id: self.route_id,
            short_name: self.route_short_name,
            long_name: self.route_long_name,
            color: self.route_color,
        }
    }
}

#[derive(Deserialize)]
struct StopRecord {
    stop_id: String,
    #[serde(default)]
    stop_code: Option<String>,
    #[serde(default)]
    stop_name: String,
}

impl StopRecord {
    fn into_raw(self) -> RawStop {
        RawStop {
            id: self.stop_id,
            code: self.stop_code.filter(|code| !code.is_empty()),
            name: self.stop_name,
        }
    }
}

#[derive(Deserialize)]
struct TripRecord {
    route_id: String,
    service_id: String,
    trip_id: String,
    #[serde(default)]
    trip_headsign: String,
    #[serde(default)]
    direction_id: Option<u8>,
}

#[derive(Deserialize)]
struct StopTimeRecord {
    trip_id: String,
    stop_id: String,
    stop_sequence: u32,
}

/// Errors reading a feed snapshot.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("could not read GTFS: {0} is neither a file nor a directory")]
    NotFound(String),

    #[error("could not find file {0}")]
    MissingFile(String),

    #[error("impossible to read '{file_name}'")]
    Io {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error("impossible to read csv file '{file_name}'")]
    Csv {
        file_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("trip {trip_id} has direction_id {value}, expected 0 or 1")]
    InvalidDirection { trip_id: String, value: u8 },

    #[error("service {service_id} has exception_type {value}, expected 1 or 2")]
    InvalidException { service_id: String, value: u8 },

    #[error("'{value}' in {file_name} is not a YYYYMMDD date")]
    BadDate {
        file_name: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
