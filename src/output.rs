use crate::error::Result;
use crate::poi::NamedPoint;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub const DEFAULT_GPX_PATH: &str = "result.gpx";

const GPX_HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "\n",
    r#"<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="transect_poi" "#,
    r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
    r#"xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">"#,
);

/// Renders a float with its shortest round-trip digits, keeping a fractional
/// part on whole numbers so `-93` reads as `-93.0`.
fn fmt_degrees(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains('.') {
        s + ".0"
    } else {
        s
    }
}

pub fn format_text(results: &[NamedPoint]) -> String {
    results
        .iter()
        .map(|p| format!("{}, {}, {}", p.name, fmt_degrees(p.y()), fmt_degrees(p.x())))
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn write_gpx<W: Write>(writer: &mut W, results: &[NamedPoint]) -> std::io::Result<()> {
    writeln!(writer, "{GPX_HEADER}")?;
    for point in results {
        writeln!(
            writer,
            "\t<wpt lat=\"{}\" lon=\"{}\">",
            fmt_degrees(point.y()),
            fmt_degrees(point.x())
        )?;
        writeln!(writer, "\t\t<name>{}</name>", point.name)?;
        writeln!(writer, "\t</wpt>")?;
    }
    writeln!(writer, "</gpx>")?;
    Ok(())
}

pub fn write_gpx_file(path: &Path, results: &[NamedPoint]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_gpx(&mut writer, results)?;
    writer.flush()?;

    info!("wrote {} waypoints to '{}'", results.len(), path.display());
    Ok(())
}
