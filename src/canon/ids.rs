//! Numeric id derivation for routes and stops.

use crate::models::{RawRoute, RawStop, RouteId, StopId};

use super::error::IdentifierError;

/// A short-name prefix that moves a route into its own id namespace.
///
/// `T1` with offset 20000 becomes route 20001, clear of ordinary route 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMarker {
    pub prefix: String,
    pub offset: RouteId,
}

/// Route id rules for one agency.
#[derive(Debug, Clone, Default)]
pub struct RouteIdRules {
    markers: Vec<RouteMarker>,
}

impl RouteIdRules {
    pub fn new(markers: Vec<RouteMarker>) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &[RouteMarker] {
        &self.markers
    }

    /// Derive the numeric id of a route.
    ///
    /// A purely numeric feed id is used as is. Otherwise the first digit run
    /// of the short name is offset by the marker its short name starts with.
    pub fn resolve_route_id(&self, route: &RawRoute) -> Result<RouteId, IdentifierError> {
        if is_digits_only(&route.id) {
            return route
                .id
                .parse()
                .map_err(|_| IdentifierError::Route(route.clone()));
        }

        let marker = self
            .markers
            .iter()
            .find(|m| route.short_name.starts_with(m.prefix.as_str()));
        let digits = first_digit_run(&route.short_name).and_then(|d| d.parse::<RouteId>().ok());

        match (marker, digits) {
            (Some(marker), Some(digits)) => marker
                .offset
                .checked_add(digits)
                .ok_or_else(|| IdentifierError::Route(route.clone())),
            _ => Err(IdentifierError::Route(route.clone())),
        }
    }
}

/// Stop id rules for one agency.
#[derive(Debug, Clone)]
pub struct StopIdRules {
    absent_code: String,
}

impl Default for StopIdRules {
    fn default() -> Self {
        Self {
            absent_code: "0".to_string(),
        }
    }
}

impl StopIdRules {
    pub fn new(absent_code: impl Into<String>) -> Self {
        Self {
            absent_code: absent_code.into(),
        }
    }

    /// The stop code, unless it is empty or the "no code" sentinel.
    pub fn stop_code<'a>(&self, stop: &'a RawStop) -> Option<&'a str> {
        stop.code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != self.absent_code)
    }

    /// Derive the numeric id of a stop.
    ///
    /// The stop code wins when present; otherwise the first digit run of the
    /// feed stop id is used.
    pub fn resolve_stop_id(&self, stop: &RawStop) -> Result<StopId, IdentifierError> {
        if let Some(code) = self.stop_code(stop) {
            return code
                .parse()
                .map_err(|_| IdentifierError::Stop(stop.clone()));
        }

        first_digit_run(&stop.id)
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| IdentifierError::Stop(stop.clone()))
    }
}

pub(crate) fn is_digits_only(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// The first run of ASCII digits in `s`.
fn first_digit_run(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Same stop in, same id out
        #[test]
        fn stop_id_deterministic(id in "[A-Z]{0,3}[0-9]{1,6}", code in proptest::option::of("[1-9][0-9]{0,6}")) {
            let rules = StopIdRules::default();
            let stop = RawStop { id, code, name: String::new() };
            prop_assert_eq!(rules.resolve_stop_id(&stop).unwrap(), rules.resolve_stop_id(&stop).unwrap());
        }

        /// Distinct codes never collide
        #[test]
        fn stop_id_injective_over_codes(
            codes in proptest::collection::hash_set("[1-9][0-9]{0,6}", 1..30)
        ) {
            let rules = StopIdRules::default();
            let ids: std::collections::HashSet<StopId> = codes
                .iter()
                .map(|c| {
                    let stop = RawStop { id: "X".into(), code: Some(c.clone()), name: String::new() };
                    rules.resolve_stop_id(&stop).unwrap()
                })
                .collect();
            prop_assert_eq!(ids.len(), codes.len());
        }

        /// Marker routes never land in the ordinary id range
        #[test]
        fn marker_routes_disjoint(n in 0u64..10_000) {
            let rules = RouteIdRules::new(vec![RouteMarker { prefix: "T".into(), offset: 20_000 }]);
            let raw = RawRoute {
                id: format!("MRC_T{}", n),
                short_name: format!("T{}", n),
                long_name: String::new(),
                color: String::new(),
            };
            prop_assert!(rules.resolve_route_id(&raw).unwrap() >= 20_000);
        }
    }
}
