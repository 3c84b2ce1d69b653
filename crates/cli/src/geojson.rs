//! Trigger extraction from GeoJSON.
//!
//! Accepts a FeatureCollection of `Point`, `MultiPoint`, `LineString` and
//! `MultiLineString` geometries; line-like geometries contribute their
//! waypoints as individual triggers. Coordinates are taken as (lon, lat) in
//! the order GeoJSON stores them.

use nalgebra::Point2;
use serde_json::Value;
use tracing::warn;

use runout_core::TriggerGeometry;

use crate::error::CliError;

/// Parse trigger geometries out of GeoJSON text.
///
/// # Errors
/// Malformed JSON, a root that is not a FeatureCollection, or a geometry
/// type this tool cannot treat as trigger points all fail with
/// [`CliError::TriggerParse`]. Features without geometry are skipped with a
/// warning.
pub fn parse_triggers(text: &str) -> Result<Vec<TriggerGeometry>, CliError> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| CliError::TriggerParse(format!("invalid JSON: {e}")))?;

    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CliError::TriggerParse("expected a FeatureCollection with a features array".to_string())
        })?;

    let mut geometries = Vec::new();
    for (index, feature) in features.iter().enumerate() {
        let geometry = feature.get("geometry");
        let Some(geometry) = geometry.filter(|g| !g.is_null()) else {
            warn!(feature = index, "Feature has no geometry, skipping");
            continue;
        };

        let geometry_type = geometry
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| bad_feature(index, "geometry has no type"))?;
        let coordinates = geometry
            .get("coordinates")
            .ok_or_else(|| bad_feature(index, "geometry has no coordinates"))?;

        match geometry_type {
            "Point" => {
                geometries.push(TriggerGeometry::Point(parse_position(index, coordinates)?));
            }
            "MultiPoint" | "LineString" => {
                geometries.push(TriggerGeometry::Path(parse_positions(index, coordinates)?));
            }
            "MultiLineString" => {
                let lines = coordinates
                    .as_array()
                    .ok_or_else(|| bad_feature(index, "MultiLineString coordinates not an array"))?;
                for line in lines {
                    geometries.push(TriggerGeometry::Path(parse_positions(index, line)?));
                }
            }
            other => {
                return Err(bad_feature(
                    index,
                    &format!("unsupported geometry type {other}; use points or lines"),
                ));
            }
        }
    }

    Ok(geometries)
}

fn parse_position(feature: usize, value: &Value) -> Result<Point2<f64>, CliError> {
    let coords = value
        .as_array()
        .ok_or_else(|| bad_feature(feature, "position is not an array"))?;
    if coords.len() < 2 {
        return Err(bad_feature(feature, "position has fewer than 2 ordinates"));
    }
    let lon = coords[0]
        .as_f64()
        .ok_or_else(|| bad_feature(feature, "longitude is not a number"))?;
    let lat = coords[1]
        .as_f64()
        .ok_or_else(|| bad_feature(feature, "latitude is not a number"))?;
    Ok(Point2::new(lon, lat))
}

fn parse_positions(feature: usize, value: &Value) -> Result<Vec<Point2<f64>>, CliError> {
    let positions = value
        .as_array()
        .ok_or_else(|| bad_feature(feature, "coordinates are not an array"))?;
    positions
        .iter()
        .map(|position| parse_position(feature, position))
        .collect()
}

fn bad_feature(index: usize, msg: &str) -> CliError {
    CliError::TriggerParse(format!("feature {index}: {msg}"))
}
