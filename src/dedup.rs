use crate::marker::{Marker, MarkerId};
use std::collections::HashSet;
use tracing::{debug, info};

/// Insertion-ordered set of markers keyed by [`MarkerId`]. The first marker
/// seen for an id is kept; later ones are dropped.
#[derive(Debug, Default)]
pub struct Collection {
    markers: Vec<Marker>,
    seen: HashSet<MarkerId>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a marker with the same id was already present.
    pub fn insert(&mut self, marker: Marker) -> bool {
        if !self.seen.insert(marker.id.clone()) {
            return false;
        }
        self.markers.push(marker);
        true
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }
}

/// Merge per-source marker sequences, sources in the given order and markers
/// in parse order.
pub fn merge<I>(streams: I) -> (Collection, MergeStats)
where
    I: IntoIterator<Item = Vec<Marker>>,
{
    let mut collection = Collection::new();
    let mut original_count = 0;

    for stream in streams {
        original_count += stream.len();
        for marker in stream {
            let id = marker.id.clone();
            if !collection.insert(marker) {
                debug!(%id, "dropping duplicate marker");
            }
        }
    }

    let stats = MergeStats::new(original_count, collection.len());
    (collection, stats)
}

#[derive(Debug, PartialEq)]
pub struct MergeStats {
    pub final_count: usize,
    pub removed_count: usize,
    pub removal_percentage: f64,
}

impl MergeStats {
    fn new(original_count: usize, final_count: usize) -> Self {
        let removed_count = original_count - final_count;
        let removal_percentage = if original_count == 0 {
            0.0
        } else {
            (removed_count as f64 / original_count as f64) * 100.0
        };

        MergeStats {
            final_count,
            removed_count,
            removal_percentage,
        }
    }

    pub fn log(&self) {
        info!(
            "Removed {} duplicate markers ({:.2}% reduction)",
            self.removed_count, self.removal_percentage
        );
        info!("Final marker count: {}", self.final_count);
    }
}
