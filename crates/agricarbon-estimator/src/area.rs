use agricarbon_core::{CarbonError, Result};
use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// GeoJSON position: `[x, y]` with an optional ignored altitude.
pub type Position = Vec<f64>;

/// Polygon or multi-polygon boundary, optionally wrapped in a Feature.
///
/// Coordinates are treated as planar meters. No projection or datum
/// correction is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Boundary {
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    Feature {
        geometry: Box<Boundary>,
    },
}

impl Boundary {
    /// Reads a boundary out of an arbitrary JSON value. Unsupported types and
    /// non-numeric coordinates are geometry errors.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| CarbonError::invalid_geometry(err.to_string()))
    }

    /// Strips the Feature envelope and converts rings into planar polygons.
    pub fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>> {
        match self {
            Self::Feature { geometry } => match geometry.as_ref() {
                Self::Feature { .. } => Err(CarbonError::invalid_geometry(
                    "Feature geometry must be a Polygon or MultiPolygon",
                )),
                inner => inner.to_multi_polygon(),
            },
            Self::Polygon { coordinates } => Ok(MultiPolygon::new(vec![polygon(coordinates)?])),
            Self::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|rings| polygon(rings))
                .collect::<Result<Vec<_>>>()
                .map(MultiPolygon::new),
        }
    }
}

/// Shoelace area of every polygon, holes subtracted, in square meters.
pub fn planar_area_m2(boundary: &Boundary) -> Result<f64> {
    let mut area = 0.0;
    for polygon in boundary.to_multi_polygon()?.iter() {
        area += polygon_area(polygon)?;
    }

    if !area.is_finite() {
        return Err(CarbonError::invalid_geometry("area is not a finite number"));
    }

    Ok(area)
}

/// Outer ring minus its holes. Holes larger than the shell are rejected.
fn polygon_area(polygon: &Polygon<f64>) -> Result<f64> {
    let ring_area = |ring: &LineString<f64>| Polygon::new(ring.clone(), Vec::new()).unsigned_area();

    let shell = ring_area(polygon.exterior());
    let holes: f64 = polygon.interiors().iter().map(ring_area).sum();
    let area = shell - holes;
    if area < 0.0 {
        return Err(CarbonError::invalid_geometry(
            "holes cover more than the outer ring",
        ));
    }

    Ok(area)
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| CarbonError::invalid_geometry("polygon has no rings"))?;

    let interiors = interiors
        .iter()
        .map(|positions| ring(positions))
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(ring(exterior)?, interiors))
}

fn ring(positions: &[Position]) -> Result<LineString<f64>> {
    let coords = positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            [_, _, ..] => Err(CarbonError::invalid_geometry(
                "coordinates must be finite numbers",
            )),
            _ => Err(CarbonError::invalid_geometry(
                "each position needs at least two coordinates",
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    // A closed ring repeats its first point; that repeat is not a vertex.
    let closed = coords.len() > 1 && coords.first() == coords.last();
    let vertices = if closed { coords.len() - 1 } else { coords.len() };
    if vertices < 3 {
        return Err(CarbonError::invalid_geometry(format!(
            "ring has {vertices} points, at least 3 required"
        )));
    }

    Ok(LineString::new(coords))
}

/// Hectare count known to be finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct AreaHectares(f64);

impl AreaHectares {
    pub fn new(hectares: f64) -> Result<Self> {
        if !hectares.is_finite() || hectares <= 0.0 {
            return Err(CarbonError::MissingOrInvalidArea);
        }

        Ok(Self(hectares))
    }

    pub fn from_square_meters(square_meters: f64) -> Result<Self> {
        Self::new(square_meters / SQUARE_METERS_PER_HECTARE)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Where the area of a plot comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaInput {
    Direct(f64),
    Boundary(Boundary),
}

impl AreaInput {
    /// Picks the input path the way callers submit it: a non-zero hectare
    /// figure wins, otherwise the boundary is read and measured. The raw
    /// geometry is only parsed on the boundary path.
    pub fn select(hectares: Option<f64>, geometry: Option<Value>) -> Result<Self> {
        match (hectares, geometry) {
            (Some(hectares), _) if hectares != 0.0 && !hectares.is_nan() => {
                Ok(Self::Direct(hectares))
            }
            (_, Some(geometry)) => Boundary::from_value(geometry).map(Self::Boundary),
            (Some(hectares), None) => Ok(Self::Direct(hectares)),
            (None, None) => Err(CarbonError::MissingOrInvalidArea),
        }
    }

    pub fn resolve(&self) -> Result<AreaHectares> {
        match self {
            Self::Direct(hectares) => AreaHectares::new(*hectares),
            Self::Boundary(boundary) => AreaHectares::from_square_meters(planar_area_m2(boundary)?),
        }
    }
}
