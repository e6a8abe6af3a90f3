use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::config::AgencyProfile;
use crate::feed::Feed;
use crate::models::{
    CanonicalAgency, CanonicalFeed, CanonicalRoute, CanonicalStop, RawRoute, RawStop, RouteId,
    StopId, TripAssignment, TripVariant,
};

use super::error::{CanonicalizeError, IdentifierError};

/// Turns one feed snapshot into canonical records.
///
/// Stateless between runs: everything it knows comes from the profile.
pub struct Canonicalizer {
    profile: AgencyProfile,
}

impl Canonicalizer {
    pub fn new(profile: AgencyProfile) -> Self {
        Self { profile }
    }

    pub fn canonical_route(&self, raw: &RawRoute) -> Result<CanonicalRoute, CanonicalizeError> {
        Ok(CanonicalRoute {
            numeric_id: self.profile.route_ids.resolve_route_id(raw)?,
            short_name: raw.short_name.trim().to_string(),
            display_name: self.profile.normalizer.route_long_name(&raw.long_name),
            color: self.profile.colors.resolve_color(raw)?,
        })
    }

    pub fn canonical_stop(&self, raw: &RawStop) -> Result<CanonicalStop, CanonicalizeError> {
        Ok(CanonicalStop {
            numeric_id: self.profile.stop_ids.resolve_stop_id(raw)?,
            display_name: self.profile.normalizer.stop_name(&raw.name),
        })
    }

    /// Canonicalize a whole feed. The first fatal error aborts the run.
    pub fn canonicalize(&self, feed: &Feed) -> Result<CanonicalFeed, CanonicalizeError> {
        let mut route_ids: HashMap<&str, RouteId> = HashMap::new();
        let mut routes: BTreeMap<RouteId, (CanonicalRoute, &str)> = BTreeMap::new();
        for raw in &feed.routes {
            let route = self.canonical_route(raw)?;
            if let Some((_, first)) = routes.get(&route.numeric_id) {
                return Err(IdentifierError::DuplicateRoute {
                    id: route.numeric_id,
                    first: first.to_string(),
                    second: raw.id.clone(),
                }
                .into());
            }
            route_ids.insert(raw.id.as_str(), route.numeric_id);
            routes.insert(route.numeric_id, (route, raw.id.as_str()));
        }
        info!("[ROUTES] {} routes canonicalized", routes.len());

        let mut stop_ids: HashMap<&str, StopId> = HashMap::new();
        let mut stops: BTreeMap<StopId, (CanonicalStop, &str)> = BTreeMap::new();
        for raw in &feed.stops {
            let stop = self.canonical_stop(raw)?;
            if let Some((_, first)) = stops.get(&stop.numeric_id) {
                return Err(IdentifierError::DuplicateStop {
                    id: stop.numeric_id,
                    first: first.to_string(),
                    second: raw.id.clone(),
                }
                .into());
            }
            stop_ids.insert(raw.id.as_str(), stop.numeric_id);
            stops.insert(stop.numeric_id, (stop, raw.id.as_str()));
        }
        info!("[STOPS] {} stops canonicalized", stops.len());

        // Distinct headsigns per (route, direction), in first-seen order
        let mut headsigns: BTreeMap<(RouteId, u8), Vec<String>> = BTreeMap::new();
        let mut assignments = Vec::with_capacity(feed.trips.len());
        for trip in &feed.trips {
            let route_id = route_ids.get(trip.route_id.as_str()).copied().ok_or_else(|| {
                IdentifierError::UnknownRoute {
                    trip_id: trip.id.clone(),
                    route_id: trip.route_id.clone(),
                }
            })?;

            let trip_stops = trip
                .ordered_stop_sequence
                .iter()
                .map(|stop_id| {
                    stop_ids.get(stop_id.as_str()).copied().ok_or_else(|| {
                        IdentifierError::UnknownStop {
                            trip_id: trip.id.clone(),
                            stop_id: stop_id.clone(),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let classified = self.profile.directions.classify(route_id, trip);
            let (direction_index, headsign) = match classified {
                Some(assigned) => {
                    let assigned = assigned?;
                    debug!(
                        "[TRIPS] trip {} on route {} classified into direction {}",
                        trip.id, route_id, assigned.direction_index
                    );
                    (assigned.direction_index, assigned.headsign.to_string())
                }
                None => (
                    trip.direction_flag,
                    self.profile.normalizer.trip_headsign(&trip.headsign),
                ),
            };

            let labels = headsigns.entry((route_id, direction_index)).or_default();
            if !labels.contains(&headsign) {
                labels.push(headsign);
            }

            assignments.push(TripAssignment {
                trip_id: trip.id.clone(),
                route_numeric_id: route_id,
                direction_index,
                stop_ids: trip_stops,
            });
        }

        let mut trip_variants = Vec::with_capacity(headsigns.len());
        for ((route, direction_index), labels) in headsigns {
            let mut labels = labels.into_iter();
            let Some(mut canonical) = labels.next() else {
                continue;
            };
            for label in labels {
                if label == canonical {
                    continue;
                }
                let merged = self.profile.merges.merge(route, &canonical, &label)?;
                debug!(
                    "[TRIPS] route {} direction {}: merged {:?} and {:?} into {:?}",
                    route, direction_index, canonical, label, merged
                );
                canonical = merged;
            }
            trip_variants.push(TripVariant {
                route_numeric_id: route,
                direction_index,
                canonical_headsign: canonical,
            });
        }
        info!(
            "[TRIPS] {} trips assigned to {} variants",
            assignments.len(),
            trip_variants.len()
        );

        Ok(CanonicalFeed {
            agency: CanonicalAgency {
                name: self.profile.agency.name.clone(),
                color: self.profile.agency.color.clone(),
                route_type: self.profile.agency.route_type.clone(),
            },
            routes: routes.into_values().map(|(route, _)| route).collect(),
            stops: stops.into_values().map(|(stop, _)| stop).collect(),
            trip_variants,
            assignments,
        })
    }
}
