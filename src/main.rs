use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info};

use transit_canon::config::DEFAULT_PROFILE;
use transit_canon::{
    write_output, AgencyProfile, CanonicalizeError, Canonicalizer, ConfigError, Feed, FeedError,
    OutputError,
};

const DEFAULT_INPUT: &str = "input/gtfs.zip";
const DEFAULT_OUTPUT_DIR: &str = "out";
const PROFILE_ENV: &str = "TRANSIT_CANON_PROFILE";

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Canonicalize(#[from] CanonicalizeError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("transit_canon=info")),
        )
        .init();

    // Positional: [input] [output_dir] [prefix]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = PathBuf::from(args.first().map(String::as_str).unwrap_or(DEFAULT_INPUT));
    let output_dir = PathBuf::from(args.get(1).map(String::as_str).unwrap_or(DEFAULT_OUTPUT_DIR));
    let prefix = args.get(2).map(String::as_str).unwrap_or("");
    let profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| DEFAULT_PROFILE.to_string());

    info!(
        "transit-canon starting: {} -> {} (profile {})",
        input.display(),
        output_dir.display(),
        profile
    );

    let start = Instant::now();
    match run(&input, &output_dir, prefix, &profile) {
        Ok(path) => info!("Done in {:.2?}: {}", start.elapsed(), path.display()),
        Err(e) => {
            error!("Canonicalization failed after {:.2?}: {}", start.elapsed(), e);
            std::process::exit(1);
        }
    }
}

fn run(input: &Path, output_dir: &Path, prefix: &str, profile: &str) -> Result<PathBuf, RunError> {
    let profile = match AgencyProfile::resolve(profile) {
        Ok(profile) => profile,
        Err(e @ ConfigError::UnknownProfile(_)) => {
            error!(
                "Bundled profiles: {}",
                AgencyProfile::bundled_names().join(", ")
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    info!(
        "Profile loaded: {}, {} route id markers, {} colors, {} direction specs, {} merge rules",
        profile.agency.name,
        profile.route_ids.markers().len(),
        profile.colors.len(),
        profile.directions.len(),
        profile.merges.len()
    );
    for pipeline in profile.normalizer.pipelines() {
        debug!("[NORMALIZE] {} pipeline: {} rules", pipeline.name(), pipeline.len());
    }

    let mut feed = Feed::open(input)?;
    let today = chrono::Local::now().date_naive();
    match feed.useful_services(today) {
        Some(services) => feed.retain_services(&services),
        None => info!("[FEED] No calendar files, keeping every trip"),
    }

    let canonical = Canonicalizer::new(profile).canonicalize(&feed)?;
    Ok(write_output(output_dir, prefix, &canonical)?)
}
