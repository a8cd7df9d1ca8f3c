pub mod street_art;

use crate::error::ConvertError;
use crate::marker::Marker;

/// Markers decoded from one source, in source order.
#[derive(Debug, Default)]
pub struct Dataset {
    pub markers: Vec<Marker>,
    /// `@meta.generator` of the dataset, if it names one
    pub generator: Option<String>,
    pub skipped: usize,
}

// extract markers from the text of one source
pub trait Parser {
    fn parse(&self, reference: &str, text: &str) -> Result<Dataset, ConvertError>;

    fn name(&self) -> &'static str;
}
