//! Batch query input: one `lon,lat` pair per line.

use anyhow::{bail, Context, Result};
use georef_common::{CrsCode, Point2D};

/// Parse a points file. Blank lines and lines starting with `#` are skipped.
pub fn parse_points(text: &str, crs: CrsCode) -> Result<Vec<Point2D>> {
    let mut points = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((x, y)) = line.split_once(',') else {
            bail!("line {}: expected 'lon,lat', got '{}'", i + 1, line);
        };
        let x: f64 = x
            .trim()
            .parse()
            .with_context(|| format!("line {}: invalid longitude '{}'", i + 1, x.trim()))?;
        let y: f64 = y
            .trim()
            .parse()
            .with_context(|| format!("line {}: invalid latitude '{}'", i + 1, y.trim()))?;

        points.push(Point2D::new(x, y, crs));
    }

    Ok(points)
}
