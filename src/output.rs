use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::models::CanonicalFeed;

/// Errors writing canonical output.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Path of the canonical document for `prefix` inside `dir`.
pub fn output_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{}canonical.json", prefix))
}

/// Write `feed` as pretty JSON to `<dir>/<prefix>canonical.json`.
///
/// The document lands in a sibling temp file first and is renamed into
/// place, so readers never see a half-written file.
pub fn write_output(dir: &Path, prefix: &str, feed: &CanonicalFeed) -> Result<PathBuf, OutputError> {
    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |source| OutputError::Io { path, source }
    };

    fs::create_dir_all(dir).map_err(io_err(dir))?;
    let json = serde_json::to_string_pretty(feed)?;

    let path = output_path(dir, prefix);
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err(&tmp))?;
    fs::rename(&tmp, &path).map_err(io_err(&path))?;

    info!(
        "[OUTPUT] Wrote {} routes, {} stops, {} variants to {}",
        feed.routes.len(),
        feed.stops.len(),
        feed.trip_variants.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalAgency, CanonicalRoute};

    fn feed() -> CanonicalFeed {
        CanonicalFeed {
            agency: CanonicalAgency {
                name: "MRCLASSO".into(),
                color: "1F1F1F".into(),
                route_type: "bus".into(),
            },
            routes: vec![CanonicalRoute {
                numeric_id: 9,
                short_name: "9".into(),
                display_name: "Repentigny".into(),
                color: "E8B909".into(),
            }],
            stops: Vec::new(),
            trip_variants: Vec::new(),
            assignments: Vec::new(),
        }
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("out"), "mrclasso_"),
            PathBuf::from("out/mrclasso_canonical.json")
        );
        assert_eq!(output_path(Path::new("out"), ""), PathBuf::from("out/canonical.json"));
    }

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let path = write_output(&target, "mrc_", &feed()).unwrap();

        assert_eq!(path, target.join("mrc_canonical.json"));
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["routes"][0]["color"], "E8B909");
        assert_eq!(written["agency"]["name"], "MRCLASSO");

        // Only the final document remains
        let entries: Vec<_> = fs::read_dir(&target).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        write_output(dir.path(), "", &feed()).unwrap();
        let mut second = feed();
        second.routes.clear();
        let path = write_output(dir.path(), "", &second).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["routes"].as_array().unwrap().len(), 0);
    }
}
