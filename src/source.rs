use crate::error::ConvertError;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Where a dataset comes from. Anything with an http(s) scheme is fetched,
/// everything else is a local path.
#[derive(Debug, PartialEq)]
pub enum Source<'a> {
    Url(&'a str),
    File(&'a Path),
}

impl<'a> Source<'a> {
    pub fn from_reference(reference: &'a str) -> Self {
        if is_url(reference) {
            Source::Url(reference)
        } else {
            Source::File(Path::new(reference))
        }
    }
}

pub fn is_url(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Retrieve the full text behind `reference`.
pub fn load(reference: &str) -> Result<String, ConvertError> {
    let text = match Source::from_reference(reference) {
        Source::Url(url) => fetch(url)?,
        Source::File(path) => {
            fs::read_to_string(path).map_err(|e| ConvertError::unavailable(reference, e))?
        }
    };

    debug!(reference, bytes = text.len(), "read source");
    Ok(text)
}

fn fetch(url: &str) -> Result<String, ConvertError> {
    info!("Fetching {url}...");

    let response = ureq::get(url).call().map_err(|e| match e {
        ureq::Error::Status(code, response) => ConvertError::unavailable(
            url,
            format!("HTTP {code} {}", response.status_text()),
        ),
        ureq::Error::Transport(transport) => ConvertError::unavailable(url, transport),
    })?;

    // into_string caps bodies at 10 MB; datasets can be larger
    let mut body = String::new();
    response
        .into_reader()
        .read_to_string(&mut body)
        .map_err(|e| ConvertError::unavailable(url, e))?;
    Ok(body)
}
