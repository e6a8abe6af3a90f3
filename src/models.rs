use serde::Serialize;

/// Numeric route identifier, unique per run.
pub type RouteId = u64;

/// Numeric stop identifier, unique per run.
pub type StopId = u32;

/// A route as it appears in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRoute {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    /// Explicit color from the feed, empty when absent.
    pub color: String,
}

/// A stop as it appears in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStop {
    pub id: String,
    /// Short rider-facing code. Some feeds use `"0"` to mean "no code".
    pub code: Option<String>,
    pub name: String,
}

/// A trip as it appears in the feed, with its stops in travel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: String,
    pub direction_flag: u8,
    pub ordered_stop_sequence: Vec<String>,
}

/// Agency-level metadata copied from the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalAgency {
    pub name: String,
    pub color: String,
    pub route_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRoute {
    pub numeric_id: RouteId,
    pub short_name: String,
    pub display_name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalStop {
    pub numeric_id: StopId,
    pub display_name: String,
}

/// One canonical direction of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripVariant {
    pub route_numeric_id: RouteId,
    pub direction_index: u8,
    pub canonical_headsign: String,
}

/// Which direction bucket a feed trip landed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripAssignment {
    pub trip_id: String,
    pub route_numeric_id: RouteId,
    pub direction_index: u8,
    pub stop_ids: Vec<StopId>,
}

/// Complete output of one run, handed to the serializer.
///
/// Built in one pass from a frozen feed snapshot; never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalFeed {
    pub agency: CanonicalAgency,
    pub routes: Vec<CanonicalRoute>,
    pub stops: Vec<CanonicalStop>,
    pub trip_variants: Vec<TripVariant>,
    pub assignments: Vec<TripAssignment>,
}

impl CanonicalFeed {
    /// Look up the variant for a route direction.
    pub fn variant(&self, route: RouteId, direction_index: u8) -> Option<&TripVariant> {
        self.trip_variants
            .iter()
            .find(|v| v.route_numeric_id == route && v.direction_index == direction_index)
    }

    /// Look up where a feed trip was assigned.
    pub fn assignment(&self, trip_id: &str) -> Option<&TripAssignment> {
        self.assignments.iter().find(|a| a.trip_id == trip_id)
    }
}
