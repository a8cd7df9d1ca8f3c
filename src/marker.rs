use geo::Point;
use std::fmt;

/// Identity of a marker across datasets. Integer and string ids from the JSON
/// collapse onto the same key, so `2754` and `"2754"` name one marker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        MarkerId(id.to_owned())
    }
}

impl From<String> for MarkerId {
    fn from(id: String) -> Self {
        MarkerId(id)
    }
}

impl From<i64> for MarkerId {
    fn from(id: i64) -> Self {
        MarkerId(id.to_string())
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One street-art point. Only ever constructed from a record with an id and
/// valid coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    /// x = longitude, y = latitude
    pub point: Point,
    pub title: Option<String>,
    pub href: Option<String>,
    pub marker_image: Option<String>,
    pub address: Option<String>,
}

impl Marker {
    pub fn new(id: impl Into<MarkerId>, lat: f64, lon: f64) -> Self {
        Marker {
            id: id.into(),
            point: Point::new(lon, lat),
            title: None,
            href: None,
            marker_image: None,
            address: None,
        }
    }

    #[cfg(test)]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[cfg(test)]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    pub fn lon(&self) -> f64 {
        self.point.x()
    }
}

pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}
