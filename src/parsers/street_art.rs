use super::{Dataset, Parser};
use crate::error::ConvertError;
use crate::marker::{Marker, MarkerId, is_valid_coordinate};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

/**
 * Parse the `items[]` marker datasets served by streetartcities.com and
 * compatible exports.
 */
pub struct StreetArtParser;

impl Parser for StreetArtParser {
    fn parse(&self, reference: &str, text: &str) -> Result<Dataset, ConvertError> {
        let raw: RawDataset =
            serde_json::from_str(text).map_err(|source| ConvertError::MalformedInput {
                reference: reference.to_string(),
                source,
            })?;

        let mut dataset = Dataset {
            markers: Vec::with_capacity(raw.items.len()),
            generator: raw.generator(),
            skipped: 0,
        };

        for (index, item) in raw.items.into_iter().enumerate() {
            match refine(item) {
                Ok(marker) => dataset.markers.push(marker),
                Err(reason) => {
                    warn!(reference, index, %reason, "skipping marker");
                    dataset.skipped += 1;
                }
            }
        }

        info!(
            "✓ Extracted {} markers from {} ({} skipped)",
            dataset.markers.len(),
            reference,
            dataset.skipped
        );
        Ok(dataset)
    }

    fn name(&self) -> &'static str {
        "Street Art JSON Parser"
    }
}

#[derive(Deserialize)]
struct RawDataset {
    items: Vec<Value>,
    #[serde(rename = "@meta", default)]
    meta: Option<Value>,
}

impl RawDataset {
    fn generator(&self) -> Option<String> {
        self.meta
            .as_ref()?
            .get("generator")?
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }
}

#[derive(Deserialize)]
struct RawMarker {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    location: Option<RawLocation>,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    href: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    marker: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
struct RawLocation {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    address: Option<String>,
}

/// Optional text fields never reject a record: strings and numbers become
/// text, any other JSON type counts as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, PartialEq)]
pub enum SkipReason {
    Shape(String),
    MissingId,
    MissingCoordinates,
    InvalidCoordinates { lat: f64, lng: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Shape(e) => write!(f, "unexpected record shape: {e}"),
            SkipReason::MissingId => f.write_str("missing id"),
            SkipReason::MissingCoordinates => f.write_str("missing location.lat/location.lng"),
            SkipReason::InvalidCoordinates { lat, lng } => {
                write!(f, "coordinates out of range: {lat}, {lng}")
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn refine(item: Value) -> Result<Marker, SkipReason> {
    let raw: RawMarker =
        serde_json::from_value(item).map_err(|e| SkipReason::Shape(e.to_string()))?;

    let id: MarkerId = match raw.id {
        Some(RawId::Int(id)) => id.into(),
        Some(RawId::Text(id)) if !id.is_empty() => id.into(),
        _ => return Err(SkipReason::MissingId),
    };

    let location = raw.location.ok_or(SkipReason::MissingCoordinates)?;
    let (lat, lng) = match (location.lat, location.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(SkipReason::MissingCoordinates),
    };
    if !is_valid_coordinate(lat, lng) {
        return Err(SkipReason::InvalidCoordinates { lat, lng });
    }

    let mut marker = Marker::new(id, lat, lng);
    marker.title = non_empty(raw.title);
    marker.href = non_empty(raw.href);
    marker.marker_image = non_empty(raw.marker);
    marker.address = non_empty(location.address);
    Ok(marker)
}
