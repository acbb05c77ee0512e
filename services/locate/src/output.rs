//! Result rendering.

use georef_common::{GeorefResult, Point2D};
use pixel_resolver::Resolution;
use serde::Serialize;

use crate::config::OutputFormat;

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Report<'a> {
    Resolved(&'a Resolution),
    Failed {
        query: &'a Point2D,
        error: &'static str,
        message: String,
    },
}

/// Render one line (JSON) or block (text) per query.
pub fn render(
    format: OutputFormat,
    queries: &[Point2D],
    results: &[GeorefResult<Resolution>],
) -> serde_json::Result<String> {
    let mut out = String::new();

    for (query, result) in queries.iter().zip(results) {
        match format {
            OutputFormat::Json => {
                let report = match result {
                    Ok(resolution) => Report::Resolved(resolution),
                    Err(e) => Report::Failed {
                        query,
                        error: e.error_code(),
                        message: e.to_string(),
                    },
                };
                out.push_str(&serde_json::to_string(&report)?);
                out.push('\n');
            }
            OutputFormat::Text => match result {
                Ok(r) => out.push_str(&render_text(r)),
                Err(e) => out.push_str(&format!(
                    "query:  ({}, {}) [{}]\nerror:  {}\n",
                    query.x, query.y, query.crs, e
                )),
            },
        }
    }

    Ok(out)
}

fn render_text(r: &Resolution) -> String {
    let bounds = match r.inside {
        Some(true) => " (inside raster)",
        Some(false) => " (outside raster)",
        None => "",
    };
    format!(
        "query:  ({:.8}, {:.8}) [{}]\nnative: ({:.3}, {:.3}) [{}]\npixel:  col {} row {}{}\n",
        r.query.x,
        r.query.y,
        r.query.crs,
        r.native_point.x,
        r.native_point.y,
        r.native_point.crs,
        r.index.col(),
        r.index.row(),
        bounds
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use georef_common::{CrsCode, GeorefError, PixelIndex};

    fn sample() -> (Point2D, Resolution) {
        let query = Point2D::wgs84(-93.0, 40.0);
        let resolution = Resolution {
            query,
            native_point: Point2D::new(500010.0, 4499990.0, CrsCode::UtmWgs84 { zone: 15, north: true }),
            col_f: 10.0,
            row_f: 10.0,
            index: PixelIndex::from_continuous(10.0, 10.0).unwrap(),
            inside: Some(true),
        };
        (query, resolution)
    }

    #[test]
    fn test_render_text() {
        let (query, resolution) = sample();
        let out = render(OutputFormat::Text, &[query], &[Ok(resolution)]).unwrap();
        assert!(out.contains("[EPSG:4326]"));
        assert!(out.contains("[EPSG:32615]"));
        assert!(out.contains("col 10 row 10 (inside raster)"));
    }

    #[test]
    fn test_render_json() {
        let (query, resolution) = sample();
        let failed = Err(GeorefError::UnsupportedCrs("EPSG:3857".to_string()));
        let out = render(OutputFormat::Json, &[query, query], &[Ok(resolution), failed]).unwrap();

        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["index"]["col"], 10);
        assert_eq!(lines[0]["native_point"]["crs"], "EPSG:32615");
        assert_eq!(lines[1]["error"], "UnsupportedCRS");
    }
}
