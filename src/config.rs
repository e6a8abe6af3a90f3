use rust_embed::Embed;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::canon::colors::{is_hex_color, ColorTable};
use crate::canon::directions::{DirectionResolver, DirectionSpec};
use crate::canon::ids::{is_digits_only, RouteIdRules, RouteMarker, StopIdRules};
use crate::canon::merge::{HeadsignMerger, MergeRule};
use crate::canon::normalize::{InvalidPattern, Normalizer, NormalizerRules};

/// Agency profiles compiled into the binary.
#[derive(Embed)]
#[folder = "assets/agencies/"]
struct BundledProfiles;

/// Profile used when none is named.
pub const DEFAULT_PROFILE: &str = "mrclasso";

/// Top-level profile file structure.
#[derive(Debug, Deserialize)]
struct RawProfile {
    agency: AgencyConfig,
    #[serde(default)]
    route_ids: RawRouteIds,
    #[serde(default)]
    stop_ids: RawStopIds,
    #[serde(default)]
    colors: BTreeMap<String, String>,
    #[serde(default)]
    directions: Vec<DirectionSpec>,
    #[serde(default)]
    merges: Vec<MergeRule>,
    #[serde(default)]
    normalizer: NormalizerRules,
}

#[derive(Debug, Default, Deserialize)]
struct RawRouteIds {
    #[serde(default)]
    markers: Vec<RawMarker>,
}

#[derive(Debug, Deserialize)]
struct RawMarker {
    prefix: String,
    offset: u64,
}

#[derive(Debug, Deserialize)]
struct RawStopIds {
    #[serde(default = "default_absent_code")]
    absent_code: String,
}

impl Default for RawStopIds {
    fn default() -> Self {
        RawStopIds {
            absent_code: default_absent_code(),
        }
    }
}

fn default_absent_code() -> String {
    "0".to_string()
}

fn default_route_type() -> String {
    "bus".to_string()
}

/// Agency metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct AgencyConfig {
    pub name: String,
    pub color: String,
    #[serde(default = "default_route_type")]
    pub route_type: String,
}

/// Resolved, validated agency profile.
///
/// Every table the engine reads lives here. Built once at startup and
/// never mutated, so a different feed only needs a different profile.
#[derive(Debug, Clone)]
pub struct AgencyProfile {
    pub agency: AgencyConfig,
    pub route_ids: RouteIdRules,
    pub stop_ids: StopIdRules,
    pub colors: ColorTable,
    pub directions: DirectionResolver,
    pub merges: HeadsignMerger,
    pub normalizer: Normalizer,
}

impl AgencyProfile {
    /// Load a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Load a profile shipped with the crate, e.g. `"mrclasso"`.
    pub fn bundled(name: &str) -> Result<Self, ConfigError> {
        let file = BundledProfiles::get(&format!("{}.json", name))
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
        let json =
            std::str::from_utf8(&file.data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_json(json)
    }

    /// Names of the profiles shipped with the crate.
    pub fn bundled_names() -> Vec<String> {
        let mut names: Vec<String> = BundledProfiles::iter()
            .filter_map(|path| path.strip_suffix(".json").map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Load from a file path if one exists there, otherwise by bundled name.
    pub fn resolve(path_or_name: &str) -> Result<Self, ConfigError> {
        let path = Path::new(path_or_name);
        if path.is_file() {
            Self::load(path)
        } else {
            Self::bundled(path_or_name)
        }
    }

    /// Parse a profile from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawProfile =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::validate(&raw)?;

        let mut colors = BTreeMap::new();
        for (short_name, color) in raw.colors {
            if !is_digits_only(&short_name) {
                return Err(ConfigError::Validation(format!(
                    "color table key must be a numeric short name, got {:?}",
                    short_name
                )));
            }
            colors.insert(short_name, color);
        }

        let markers = raw
            .route_ids
            .markers
            .into_iter()
            .map(|m| RouteMarker {
                prefix: m.prefix,
                offset: m.offset,
            })
            .collect();

        Ok(AgencyProfile {
            agency: raw.agency,
            route_ids: RouteIdRules::new(markers),
            stop_ids: StopIdRules::new(raw.stop_ids.absent_code),
            colors: ColorTable::new(colors),
            directions: DirectionResolver::new(raw.directions),
            merges: HeadsignMerger::new(raw.merges),
            normalizer: Normalizer::new(&raw.normalizer)?,
        })
    }

    /// Validate table contents before building the engine's view of them.
    fn validate(raw: &RawProfile) -> Result<(), ConfigError> {
        if !is_hex_color(&raw.agency.color) {
            return Err(ConfigError::Validation(format!(
                "agency color must be 6 hex digits, got {:?}",
                raw.agency.color
            )));
        }
        for (short_name, color) in &raw.colors {
            if !is_hex_color(color) {
                return Err(ConfigError::Validation(format!(
                    "color for route {} must be 6 hex digits, got {:?}",
                    short_name, color
                )));
            }
        }
        for marker in &raw.route_ids.markers {
            if marker.prefix.is_empty() {
                return Err(ConfigError::Validation(
                    "route id marker prefix cannot be empty".to_string(),
                ));
            }
        }

        let mut seen = HashSet::new();
        for spec in &raw.directions {
            if !seen.insert(spec.route_id) {
                return Err(ConfigError::Validation(format!(
                    "route {} has more than one direction spec",
                    spec.route_id
                )));
            }
            if spec.slots.iter().all(|s| s.is_default()) {
                return Err(ConfigError::Validation(format!(
                    "route {} direction spec needs anchors in at least one slot",
                    spec.route_id
                )));
            }
        }

        for rule in &raw.merges {
            if rule.pair[0] == rule.pair[1] {
                return Err(ConfigError::Validation(format!(
                    "route {} merge pair repeats {:?}",
                    rule.route_id, rule.pair[0]
                )));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("profile I/O error: {0}")]
    Io(String),

    #[error("profile parse error: {0}")]
    Parse(String),

    #[error("profile validation error: {0}")]
    Validation(String),

    #[error("profile pattern error: {0}")]
    Pattern(#[from] InvalidPattern),

    #[error("no bundled profile named '{0}'")]
    UnknownProfile(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRoute;

    fn minimal(extra: &str) -> String {
        format!(
            r#"{{
                "agency": {{ "name": "Test", "color": "00718F" }}
                {}
            }}"#,
            extra
        )
    }

    #[test]
    fn test_bundled_mrclasso() {
        let profile = AgencyProfile::bundled(DEFAULT_PROFILE).expect("bundled profile loads");
        assert_eq!(profile.agency.name, "MRCLASSO");
        assert_eq!(profile.agency.color, "1F1F1F");
        assert_eq!(profile.colors.len(), 14);
        assert_eq!(profile.colors.get("9"), Some("E8B909"));
        assert_eq!(profile.colors.get("09"), None);
        assert_eq!(profile.directions.len(), 1);
        assert!(profile.directions.spec(20_001).is_some());
        assert_eq!(profile.merges.len(), 5);
        assert_eq!(profile.route_ids.markers()[0].offset, 20_000);
    }

    #[test]
    fn test_bundled_names() {
        assert!(AgencyProfile::bundled_names().contains(&"mrclasso".to_string()));
    }

    #[test]
    fn test_unknown_bundled_profile() {
        let err = AgencyProfile::bundled("nowhere").unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_minimal_profile_defaults() {
        let profile = AgencyProfile::from_json(&minimal("")).unwrap();
        assert_eq!(profile.agency.route_type, "bus");
        assert!(profile.colors.is_empty());
        assert!(profile.directions.is_empty());
        assert!(profile.merges.is_empty());

        let route = RawRoute {
            id: "T1".into(),
            short_name: "T1".into(),
            long_name: String::new(),
            color: String::new(),
        };
        assert!(profile.route_ids.resolve_route_id(&route).is_err());
    }

    #[test]
    fn test_validation_bad_color() {
        let err = AgencyProfile::from_json(&minimal(r##", "colors": { "9": "#E8B909" }"##))
            .unwrap_err();
        assert!(err.to_string().contains("6 hex digits"));
    }

    #[test]
    fn test_validation_non_numeric_color_key() {
        let err =
            AgencyProfile::from_json(&minimal(r#", "colors": { "T1": "E8B909" }"#)).unwrap_err();
        assert!(err.to_string().contains("numeric short name"));
    }

    #[test]
    fn test_validation_bad_agency_color() {
        let err = AgencyProfile::from_json(r#"{ "agency": { "name": "X", "color": "gray" } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("agency color"));
    }

    #[test]
    fn test_validation_duplicate_direction_spec() {
        let spec = r#"{ "route_id": 7, "slots": [
            { "headsign": "A", "anchors": ["1"] },
            { "headsign": "B" } ] }"#;
        let err = AgencyProfile::from_json(&minimal(&format!(
            r#", "directions": [{}, {}]"#,
            spec, spec
        )))
        .unwrap_err();
        assert!(err.to_string().contains("more than one direction spec"));
    }

    #[test]
    fn test_validation_two_default_slots() {
        let err = AgencyProfile::from_json(&minimal(
            r#", "directions": [{ "route_id": 7, "slots": [
                { "headsign": "A" }, { "headsign": "B" } ] }]"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("anchors"));
    }

    #[test]
    fn test_feed_stop_ids_as_anchors() {
        let profile = AgencyProfile::from_json(&minimal(
            r#", "directions": [{ "route_id": 7, "slots": [
                { "headsign": "A", "anchors": ["MRC87761", "MRC87555"] }, { "headsign": "B" } ] }]"#,
        ))
        .unwrap();
        let spec = profile.directions.spec(7).unwrap();
        assert_eq!(spec.slots[0].anchors, vec!["MRC87761", "MRC87555"]);
    }

    #[test]
    fn test_three_slots_rejected() {
        let err = AgencyProfile::from_json(&minimal(
            r#", "directions": [{ "route_id": 7, "slots": [
                { "headsign": "A", "anchors": ["1"] },
                { "headsign": "B" },
                { "headsign": "C" } ] }]"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_merge_pair_repeats() {
        let err = AgencyProfile::from_json(&minimal(
            r#", "merges": [{ "route_id": 2, "pair": ["A", "A"], "canonical": "A" }]"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("repeats"));
    }

    #[test]
    fn test_validation_empty_marker() {
        let err = AgencyProfile::from_json(&minimal(
            r#", "route_ids": { "markers": [{ "prefix": "", "offset": 100 }] }"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_bad_pattern() {
        let err = AgencyProfile::from_json(&minimal(
            r#", "normalizer": { "stop_name": [{ "pattern": "[oops" }] }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Pattern(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agency.json");
        std::fs::write(&path, minimal(r#", "stop_ids": { "absent_code": "-1" }"#)).unwrap();
        let profile = AgencyProfile::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(profile.agency.name, "Test");
    }

    #[test]
    fn test_load_missing_file() {
        let err = AgencyProfile::load(Path::new("/nonexistent/agency.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
