use crate::dedup::Collection;
use crate::error::ConvertError;
use crate::marker::Marker;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::debug;

pub const FALLBACK_NAME: &str = "Untitled";

const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";

/// Render the collection as a GPX 1.1 document with one `<wpt>` per marker.
/// Identical input always yields byte-identical output.
pub fn to_gpx_string(collection: &Collection, creator: &str) -> io::Result<String> {
    let mut buf = Vec::new();
    write_gpx(&mut buf, collection, creator)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn write_gpx<W: Write>(sink: W, collection: &Collection, creator: &str) -> io::Result<()> {
    let mut writer = Writer::new_with_indent(sink, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let root = BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("creator", creator),
        ("xmlns", GPX_NS),
        ("xmlns:xsi", XSI_NS),
        ("xsi:schemaLocation", SCHEMA_LOCATION),
    ]);
    writer.write_event(Event::Start(root))?;

    for marker in collection.iter() {
        write_waypoint(&mut writer, marker)?;
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_waypoint<W: Write>(writer: &mut Writer<W>, marker: &Marker) -> io::Result<()> {
    let lat = format!("{:.6}", marker.lat());
    let lon = format!("{:.6}", marker.lon());

    writer
        .create_element("wpt")
        .with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())])
        .write_inner_content(|w| {
            let name = marker.title.as_deref().unwrap_or(FALLBACK_NAME);
            w.create_element("name")
                .write_text_content(BytesText::new(name))?;

            let desc = description(marker);
            if !desc.is_empty() {
                w.create_element("desc")
                    .write_text_content(BytesText::new(&desc))?;
            }

            if let Some(href) = &marker.href {
                w.create_element("link")
                    .with_attribute(("href", href.as_str()))
                    .write_empty()?;
            }
            Ok(())
        })?;

    Ok(())
}

fn description(marker: &Marker) -> String {
    let mut parts = Vec::new();
    if let Some(address) = &marker.address {
        parts.push(address.clone());
    }
    if let Some(image) = &marker.marker_image {
        parts.push(format!("marker: {image}"));
    }
    parts.join("\n")
}

/// Write the document to `path` in one step: the text goes to a temporary
/// file next to the target which is then renamed over it. On failure the
/// target is left as it was.
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), ConvertError> {
    let failure = |source: io::Error| ConvertError::OutputWriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    // tempfile defaults to 0600; output should get the usual umask mode
    let mut builder = Builder::new();
    #[cfg(unix)]
    builder.permissions(fs::Permissions::from_mode(0o666));

    let mut file = builder.tempfile_in(&dir).map_err(failure)?;
    if let Ok(existing) = fs::metadata(path) {
        file.as_file()
            .set_permissions(existing.permissions())
            .map_err(failure)?;
    }
    file.write_all(contents.as_bytes()).map_err(failure)?;
    file.as_file().sync_all().map_err(failure)?;
    file.persist(path).map_err(|e| failure(e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::merge;

    fn collection(markers: Vec<Marker>) -> Collection {
        merge([markers]).0
    }

    #[test]
    fn renders_single_waypoint() {
        let doc = to_gpx_string(
            &collection(vec![Marker::new("1", 48.1, 11.5).with_title("A")]),
            "streetart2gpx",
        )
        .unwrap();

        assert!(doc.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(doc.contains(r#"<gpx version="1.1" creator="streetart2gpx""#));
        assert_eq!(doc.matches("<wpt ").count(), 1);
        assert!(doc.contains(r#"<wpt lat="48.100000" lon="11.500000">"#));
        assert!(doc.contains("<name>A</name>"));
        assert!(!doc.contains("<link"));
        assert!(!doc.contains("<desc>"));
        assert!(doc.ends_with("</gpx>\n"));
    }

    #[test]
    fn renders_link_and_fallback_name() {
        let marker = Marker::new("2754", 48.142671, 11.536196)
            .with_href("https://streetartcities.com/cities/munich/markers/2754");
        let doc = to_gpx_string(&collection(vec![marker]), "streetart2gpx").unwrap();

        let expected = r#"  <wpt lat="48.142671" lon="11.536196">
    <name>Untitled</name>
    <link href="https://streetartcities.com/cities/munich/markers/2754"/>
  </wpt>"#;
        assert!(doc.contains(expected), "{doc}");
    }

    #[test]
    fn renders_description_from_address_and_marker_image() {
        let mut marker = Marker::new("5", 1.0, 2.0);
        marker.address = Some("Main St 1".to_string());
        marker.marker_image = Some("https://example.com/m.png".to_string());

        let doc = to_gpx_string(&collection(vec![marker]), "streetart2gpx").unwrap();
        assert!(doc.contains("<desc>Main St 1\nmarker: https://example.com/m.png</desc>"));
    }

    #[test]
    fn escapes_user_text() {
        let marker = Marker::new("1", 48.1, 11.5)
            .with_title(r#"Tom & Jerry <"best"> 'mural'"#)
            .with_href("https://example.com/?a=1&b=\"2\"");
        let doc = to_gpx_string(&collection(vec![marker]), "me & <you>").unwrap();

        assert!(!doc.contains("Tom & Jerry"));
        assert!(doc.contains("Tom &amp; Jerry &lt;&quot;best&quot;&gt;"));
        assert!(doc.contains("creator=\"me &amp; &lt;you&gt;\""));

        let parsed = gpx::read(doc.as_bytes()).expect("escaped output should be valid GPX");
        assert_eq!(parsed.waypoints.len(), 1);
        assert_eq!(
            parsed.waypoints[0].name.as_deref(),
            Some(r#"Tom & Jerry <"best"> 'mural'"#)
        );
        assert_eq!(
            parsed.waypoints[0].links[0].href,
            "https://example.com/?a=1&b=\"2\""
        );
    }

    #[test]
    fn coordinates_round_trip_to_six_decimals() {
        let points = [
            (48.142671, 11.536196),
            (-33.8567844, 151.213108),
            (0.0000004, -179.9999996),
            (89.999999, -0.5),
        ];
        let markers = points
            .iter()
            .enumerate()
            .map(|(i, (lat, lon))| Marker::new(i.to_string(), *lat, *lon))
            .collect();

        let doc = to_gpx_string(&collection(markers), "streetart2gpx").unwrap();
        let parsed = gpx::read(doc.as_bytes()).unwrap();

        assert_eq!(parsed.waypoints.len(), points.len());
        for (waypoint, (lat, lon)) in parsed.waypoints.iter().zip(points) {
            let point = waypoint.point();
            assert!((point.y() - lat).abs() < 1e-6, "{} vs {lat}", point.y());
            assert!((point.x() - lon).abs() < 1e-6, "{} vs {lon}", point.x());
        }
    }

    #[test]
    fn output_is_deterministic() {
        let build = || {
            collection(vec![
                Marker::new("b", 2.0, 2.0).with_title("B"),
                Marker::new("a", 1.0, 1.0).with_href("https://example.com/a"),
            ])
        };

        assert_eq!(
            to_gpx_string(&build(), "streetart2gpx").unwrap(),
            to_gpx_string(&build(), "streetart2gpx").unwrap()
        );
    }

    #[test]
    fn empty_collection_is_valid_gpx() {
        let doc = to_gpx_string(&Collection::new(), "streetart2gpx").unwrap();
        let parsed = gpx::read(doc.as_bytes()).unwrap();
        assert!(parsed.waypoints.is_empty());
    }

    #[test]
    fn atomic_write_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gpx");
        fs::write(&path, "old").unwrap();

        write_atomically(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn new_output_gets_umask_mode() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("plain.txt");
        fs::write(&reference, "x").unwrap();
        let path = dir.path().join("out.gpx");

        write_atomically(&path, "data").unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&reference));
    }

    #[cfg(unix)]
    #[test]
    fn replaced_output_keeps_its_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gpx");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_atomically(&path, "new").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn unwritable_destination_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.gpx");

        let err = write_atomically(&path, "data").unwrap_err();
        assert!(matches!(err, ConvertError::OutputWriteFailure { .. }));
        assert!(!path.exists());
    }
}
