use std::collections::HashMap;

use serde::Deserialize;

use crate::models::RouteId;

use super::error::HeadsignMergeError;

/// Two headsigns of one route direction that collapse into one label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeRule {
    pub route_id: RouteId,
    pub pair: [String; 2],
    pub canonical: String,
}

impl MergeRule {
    /// Set equality with the registered pair; order is irrelevant.
    pub fn covers(&self, a: &str, b: &str) -> bool {
        let [x, y] = &self.pair;
        (a == x.as_str() && b == y.as_str()) || (a == y.as_str() && b == x.as_str())
    }
}

/// Per-route merge table.
#[derive(Debug, Clone, Default)]
pub struct HeadsignMerger {
    rules: HashMap<RouteId, Vec<MergeRule>>,
}

impl HeadsignMerger {
    pub fn new(rules: impl IntoIterator<Item = MergeRule>) -> Self {
        let mut by_route: HashMap<RouteId, Vec<MergeRule>> = HashMap::new();
        for rule in rules {
            by_route.entry(rule.route_id).or_default().push(rule);
        }
        Self { rules: by_route }
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Reconcile two headsigns of the same route direction.
    pub fn merge(&self, route: RouteId, a: &str, b: &str) -> Result<String, HeadsignMergeError> {
        self.rules
            .get(&route)
            .and_then(|rules| rules.iter().find(|r| r.covers(a, b)))
            .map(|r| r.canonical.clone())
            .ok_or_else(|| HeadsignMergeError {
                route,
                first: a.to_string(),
                second: b.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(route_id: RouteId, a: &str, b: &str, canonical: &str) -> MergeRule {
        MergeRule {
            route_id,
            pair: [a.into(), b.into()],
            canonical: canonical.into(),
        }
    }

    fn merger() -> HeadsignMerger {
        HeadsignMerger::new([
            rule(2, "St-Sulpice", "Lavaltrie", "Lavaltrie"),
            rule(400, "Repentigny", "Montréal", "Montréal"),
            rule(400, "Repentigny", "Assomption", "Assomption"),
        ])
    }

    #[test]
    fn test_merge_either_order() {
        let m = merger();
        assert_eq!(m.merge(2, "St-Sulpice", "Lavaltrie").unwrap(), "Lavaltrie");
        assert_eq!(m.merge(2, "Lavaltrie", "St-Sulpice").unwrap(), "Lavaltrie");
    }

    #[test]
    fn test_several_rules_per_route() {
        let m = merger();
        assert_eq!(m.merge(400, "Repentigny", "Montréal").unwrap(), "Montréal");
        assert_eq!(m.merge(400, "Repentigny", "Assomption").unwrap(), "Assomption");
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn test_unknown_pair_fails() {
        let m = merger();
        let err = m.merge(400, "Montréal", "Assomption").unwrap_err();
        assert_eq!(err.route, 400);
        assert_eq!(err.first, "Montréal");
        assert!(m.merge(6, "St-Sulpice", "Lavaltrie").is_err());
    }

    #[test]
    fn test_no_partial_match() {
        let m = merger();
        assert!(m.merge(2, "Lavaltrie", "Lavaltrie").is_err());
        assert!(m.merge(2, "St-Sulpice", "Lavaltrie Est").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Lookup never depends on argument order
        #[test]
        fn merge_symmetry(a in "[A-Za-z -]{1,12}", b in "[A-Za-z -]{1,12}", pick in 0usize..3) {
            let canonical = [a.clone(), b.clone(), "Autre".to_string()][pick].clone();
            let m = HeadsignMerger::new([MergeRule {
                route_id: 1,
                pair: [a.clone(), b.clone()],
                canonical,
            }]);
            prop_assert_eq!(m.merge(1, &a, &b).ok(), m.merge(1, &b, &a).ok());
            prop_assert_eq!(m.merge(1, &a, "zz").is_ok(), m.merge(1, "zz", &a).is_ok());
        }
    }
}
