//! Direction classification for routes whose feed directions can't be trusted.
//!
//! Loop and branching routes get a hand-written spec: two slots, each with
//! a canonical headsign and an ordered list of anchor stops. A trip belongs
//! to a slot when it visits all of the slot's anchors in order. A slot with
//! no anchors catches every trip the other slot doesn't claim.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Deserialize;

use crate::models::{RawTrip, RouteId};

use super::error::DirectionAssignmentError;

/// One direction bucket of a route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectionSlot {
    pub headsign: String,
    #[serde(default)]
    pub anchors: Vec<String>,
}

impl DirectionSlot {
    pub fn is_default(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Whether the trip visits every anchor, in anchor order.
    pub fn matches(&self, stops: &[String]) -> bool {
        !self.is_default() && is_ordered_subsequence(&self.anchors, stops)
    }

    /// Earliest index of `stop_id` in the anchor list.
    pub fn anchor_index(&self, stop_id: &str) -> Option<usize> {
        self.anchors.iter().position(|a| a == stop_id)
    }
}

/// Direction slots of one allow-listed route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectionSpec {
    pub route_id: RouteId,
    pub slots: [DirectionSlot; 2],
}

/// A stop occurrence within a classified trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripStop<'a> {
    pub stop_id: &'a str,
    /// Position in the feed's stop sequence.
    pub position: usize,
}

/// Outcome of classifying one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionAssignment<'a> {
    pub direction_index: u8,
    pub headsign: &'a str,
}

impl DirectionSpec {
    /// Pick the single slot this trip belongs to.
    pub fn classify(&self, trip: &RawTrip) -> Result<DirectionAssignment<'_>, DirectionAssignmentError> {
        let matched: Vec<u8> = (0u8..)
            .zip(&self.slots)
            .filter(|(_, slot)| slot.matches(&trip.ordered_stop_sequence))
            .map(|(i, _)| i)
            .collect();

        let index = match matched.as_slice() {
            [index] => *index,
            [] => match (0u8..).zip(&self.slots).find(|(_, slot)| slot.is_default()) {
                Some((index, _)) => index,
                None => {
                    return Err(DirectionAssignmentError::NoMatch(
                        trip.clone(),
                        self.route_id,
                    ))
                }
            },
            _ => {
                return Err(DirectionAssignmentError::Ambiguous {
                    trip: trip.clone(),
                    route: self.route_id,
                    slots: matched,
                })
            }
        };

        Ok(DirectionAssignment {
            direction_index: index,
            headsign: &self.slots[usize::from(index)].headsign,
        })
    }

    /// Order two stops of a trip classified into `direction_index`.
    ///
    /// Stops that are both anchors of the slot compare by anchor index, so a
    /// stop visited twice on a loop sorts where the slot's anchors put it. Any other
    /// pair keeps feed order.
    pub fn compare_stops(&self, direction_index: u8, a: TripStop<'_>, b: TripStop<'_>) -> Ordering {
        let anchored = self
            .slots
            .get(usize::from(direction_index))
            .map(|slot| (slot.anchor_index(a.stop_id), slot.anchor_index(b.stop_id)));

        match anchored {
            Some((Some(ia), Some(ib))) => ia.cmp(&ib).then(a.position.cmp(&b.position)),
            _ => a.position.cmp(&b.position),
        }
    }
}

/// Allow-listed direction specs keyed by route.
#[derive(Debug, Clone, Default)]
pub struct DirectionResolver {
    specs: HashMap<RouteId, DirectionSpec>,
}

impl DirectionResolver {
    pub fn new(specs: impl IntoIterator<Item = DirectionSpec>) -> Self {
        Self {
            specs: specs.into_iter().map(|s| (s.route_id, s)).collect(),
        }
    }

    pub fn spec(&self, route_id: RouteId) -> Option<&DirectionSpec> {
        self.specs.get(&route_id)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Classify a trip, or `None` when its route isn't allow-listed.
    pub fn classify(
        &self,
        route_id: RouteId,
        trip: &RawTrip,
    ) -> Option<Result<DirectionAssignment<'_>, DirectionAssignmentError>> {
        self.spec(route_id).map(|spec| spec.classify(trip))
    }
}

/// Whether `needles` appear in `haystack` in the same relative order.
fn is_ordered_subsequence(needles: &[String], haystack: &[String]) -> bool {
    let mut remaining = haystack.iter();
    needles
        .iter()
        .all(|needle| remaining.any(|stop| stop == needle))
}
