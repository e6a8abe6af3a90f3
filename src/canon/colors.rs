use std::collections::BTreeMap;

use crate::models::RawRoute;

use super::error::ColorLookupError;
use super::ids::is_digits_only;

/// Fallback colors keyed by numeric route short name, digit for digit.
///
/// Feeds that leave `route_color` blank rely on this table; a numeric route
/// missing from it means the table needs updating.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    by_short_name: BTreeMap<String, String>,
}

impl ColorTable {
    pub fn new(by_short_name: BTreeMap<String, String>) -> Self {
        Self { by_short_name }
    }

    pub fn len(&self) -> usize {
        self.by_short_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_short_name.is_empty()
    }

    pub fn get(&self, short_name: &str) -> Option<&str> {
        self.by_short_name.get(short_name).map(String::as_str)
    }

    /// Resolve the display color of a route.
    pub fn resolve_color(&self, route: &RawRoute) -> Result<String, ColorLookupError> {
        let explicit = route.color.trim();
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }

        let short_name = route.short_name.trim();
        is_digits_only(short_name)
            .then(|| self.get(short_name))
            .flatten()
            .map(str::to_string)
            .ok_or_else(|| ColorLookupError {
                route: route.clone(),
            })
    }
}

/// Whether `s` is a six-digit hex color code such as `E8B909`.
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 6 && s.bytes().all(|b| b.is_ascii_hexdigit())
}
