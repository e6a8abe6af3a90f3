//! Canonicalization error types.
//!
//! Every error here aborts the run. Canonical ids and labels are joined
//! against hand-authored overlays elsewhere, so nothing is ever guessed.

use crate::models::{RawRoute, RawStop, RawTrip, RouteId, StopId};

/// A route or stop could not be given a numeric id.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentifierError {
    /// No numeric id and no marker-prefixed digit run in the short name
    #[error("unexpected route id for {0:?}")]
    Route(RawRoute),

    /// Neither a usable stop code nor digits in the stop id
    #[error("unexpected stop id for {0:?}")]
    Stop(RawStop),

    /// Two feed routes resolved to the same numeric id
    #[error("route id {id} assigned to both {first:?} and {second:?}")]
    DuplicateRoute {
        id: RouteId,
        first: String,
        second: String,
    },

    /// Two feed stops resolved to the same numeric id
    #[error("stop id {id} assigned to both {first:?} and {second:?}")]
    DuplicateStop {
        id: StopId,
        first: String,
        second: String,
    },

    /// A trip runs on a route missing from the feed's route list
    #[error("trip {trip_id:?} runs on unknown route {route_id:?}")]
    UnknownRoute { trip_id: String, route_id: String },

    /// A trip visits a stop missing from the feed's stop list
    #[error("trip {trip_id:?} visits unknown stop {stop_id:?}")]
    UnknownStop { trip_id: String, stop_id: String },
}

/// No color could be resolved for a route.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unexpected route color for {route:?}")]
pub struct ColorLookupError {
    pub route: RawRoute,
}

/// A trip on an allow-listed route did not land in exactly one slot.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectionAssignmentError {
    #[error("trip {0:?} on route {1} matches no direction")]
    NoMatch(RawTrip, RouteId),

    #[error("trip {trip:?} on route {route} matches directions {slots:?}")]
    Ambiguous {
        trip: RawTrip,
        route: RouteId,
        slots: Vec<u8>,
    },
}

/// Two headsigns of one direction have no merge rule.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unexpected trips to merge on route {route}: {first:?} & {second:?}")]
pub struct HeadsignMergeError {
    pub route: RouteId,
    pub first: String,
    pub second: String,
}

/// Any failure of a canonicalization run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CanonicalizeError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Color(#[from] ColorLookupError),

    #[error(transparent)]
    Direction(#[from] DirectionAssignmentError),

    #[error(transparent)]
    Merge(#[from] HeadsignMergeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = HeadsignMergeError {
            route: 400,
            first: "Montréal".into(),
            second: "Assomption".into(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected trips to merge on route 400: \"Montréal\" & \"Assomption\""
        );

        let err = IdentifierError::DuplicateStop {
            id: 87761,
            first: "A87761".into(),
            second: "B87761".into(),
        };
        assert_eq!(
            err.to_string(),
            "stop id 87761 assigned to both \"A87761\" and \"B87761\""
        );
    }

    #[test]
    fn error_names_offending_record() {
        let stop = RawStop {
            id: "ABC".into(),
            code: Some("0".into()),
            name: "Gare".into(),
        };
        let err: CanonicalizeError = IdentifierError::Stop(stop).into();
        assert!(err.to_string().contains("\"ABC\""));
        assert!(matches!(err, CanonicalizeError::Identifier(_)));
    }
}
