use crate::dedup::merge;
use crate::error::ConvertError;
use crate::io::{to_gpx_string, write_atomically};
use crate::parsers::{Parser, street_art::StreetArtParser};
use crate::source::{self, is_url};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_CREATOR: &str = "streetart2gpx";
const FALLBACK_STEM: &str = "markers";

#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub waypoints: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

/// Load, parse and merge every reference in order, then write one GPX file.
///
/// The first failing source aborts the run before anything is written, so a
/// file at `output_path` is either the complete merge or untouched.
pub fn run(
    references: &[String],
    output_path: &Path,
    creator: Option<&str>,
) -> Result<RunSummary, ConvertError> {
    let parser = StreetArtParser;
    info!("--- Running {} on {} sources ---", parser.name(), references.len());

    let mut streams = Vec::with_capacity(references.len());
    let mut generator = None;
    let mut skipped = 0;

    for reference in references {
        let text = source::load(reference)?;
        let dataset = parser.parse(reference, &text)?;

        generator = generator.or(dataset.generator);
        skipped += dataset.skipped;
        streams.push(dataset.markers);
    }

    let (collection, stats) = merge(streams);
    stats.log();
    if collection.is_empty() {
        warn!("No markers to write, the output will contain no waypoints");
    }

    let creator = creator
        .map(str::to_owned)
        .or(generator)
        .unwrap_or_else(|| DEFAULT_CREATOR.to_string());

    let document =
        to_gpx_string(&collection, &creator).map_err(|source| ConvertError::OutputWriteFailure {
            path: output_path.to_path_buf(),
            source,
        })?;

    info!("Writing {} waypoints to {}...", collection.len(), output_path.display());
    write_atomically(output_path, &document)?;

    Ok(RunSummary {
        output: output_path.to_path_buf(),
        waypoints: collection.len(),
        skipped,
        duplicates: stats.removed_count,
    })
}

/// Output path used when none is given: named after the first reference,
/// with a `_merged` suffix when several sources are combined. Local inputs
/// keep their directory; URL inputs land in the working directory.
pub fn default_output_path(references: &[String]) -> PathBuf {
    let merged = references.len() > 1;
    let Some(first) = references.first() else {
        return PathBuf::from(format!("{FALLBACK_STEM}.gpx"));
    };

    if is_url(first) {
        let stem = Url::parse(first)
            .ok()
            .and_then(|url| {
                Path::new(url.path())
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_STEM.to_string());

        return if merged {
            PathBuf::from(format!("{stem}_merged.gpx"))
        } else {
            PathBuf::from(format!("{stem}.gpx"))
        };
    }

    let path = Path::new(first);
    if merged {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or(FALLBACK_STEM.into());
        path.with_file_name(format!("{stem}_merged.gpx"))
    } else {
        path.with_extension("gpx")
    }
}
