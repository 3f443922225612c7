//! Sampling-unit footprints read from GeoJSON layers.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PsuError, Result};
use crate::geometry::{MultiPolygon, Polygon};

/// Property carrying the unit identifier.
pub const ID_PROPERTY: &str = "EA_Num";

/// One PSU (or one buffer of it).
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingUnit {
    pub ea_num: i64,
    pub footprint: MultiPolygon,
}

// ── GeoJSON schema ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<FeatureDef>,
}

#[derive(Deserialize)]
struct FeatureDef {
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
    geometry: Option<GeometryDef>,
}

type Ring = Vec<Vec<f64>>;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeometryDef {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
}

// ── Conversion ───────────────────────────────────────────────────────────────

fn ring(raw: Ring) -> Result<Vec<[f64; 2]>> {
    raw.into_iter()
        .map(|pos| match pos.as_slice() {
            [lon, lat, ..] => Ok([*lon, *lat]),
            _ => Err(PsuError::Geometry(format!("position with {} coordinates", pos.len()))),
        })
        .collect()
}

fn polygon(rings: Vec<Ring>) -> Result<Polygon> {
    let mut rings = rings.into_iter();
    let exterior = rings
        .next()
        .ok_or_else(|| PsuError::Geometry("polygon without rings".into()))?;
    let holes = rings.map(ring).collect::<Result<Vec<_>>>()?;
    Polygon::new(ring(exterior)?, holes)
}

fn footprint(geometry: GeometryDef) -> Result<MultiPolygon> {
    match geometry {
        GeometryDef::Polygon { coordinates } => MultiPolygon::new(vec![polygon(coordinates)?]),
        GeometryDef::MultiPolygon { coordinates } => {
            MultiPolygon::new(coordinates.into_iter().map(polygon).collect::<Result<_>>()?)
        }
    }
}

/// `EA_Num` may be exported as a number or as a numeric string.
fn ea_num(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a FeatureCollection. Feature order is preserved.
pub fn parse_units(text: &str) -> Result<Vec<SamplingUnit>> {
    let fc: FeatureCollection = serde_json::from_str(text)?;
    fc.features
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            let id = f
                .properties
                .get(ID_PROPERTY)
                .and_then(ea_num)
                .ok_or_else(|| PsuError::Geometry(format!("feature {i}: missing or non-integer {ID_PROPERTY}")))?;
            let geometry = f
                .geometry
                .ok_or_else(|| PsuError::Geometry(format!("feature {i} ({ID_PROPERTY} {id}): null geometry")))?;
            Ok(SamplingUnit {
                ea_num: id,
                footprint: footprint(geometry)?,
            })
        })
        .collect()
}

pub fn read_units(path: &Path) -> Result<Vec<SamplingUnit>> {
    if !path.exists() {
        return Err(PsuError::MissingDataset(path.to_path_buf()));
    }
    parse_units(&fs::read_to_string(path)?)
}
