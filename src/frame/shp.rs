//! Reading zipped shapefiles into a [`GeoFrame`].
//!
//! Census archives bundle the `.shp`/`.shx`/`.dbf` trio (plus projection
//! and metadata files) in a single zip. The geometry and attribute members
//! are extracted into memory and decoded with the `shapefile` crate; the
//! remaining members are ignored.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon};
use shapefile::dbase::FieldValue;
use shapefile::{Shape, ShapeReader};
use tracing::debug;

use crate::error::{Error, Result};
use crate::frame::{GeoFrame, Value};

/// Read a zipped shapefile from disk.
pub fn read(path: &Path) -> Result<GeoFrame> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let shp = extract_member(&mut archive, ".shp")?;
    let dbf = extract_member(&mut archive, ".dbf")?;

    let shapes = ShapeReader::new(Cursor::new(shp))?.read()?;
    let mut table = shapefile::dbase::Reader::new(Cursor::new(dbf))?;

    let columns: Vec<String> = table
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .filter(|name| name != "DeletionFlag")
        .collect();
    let records = table.read()?;

    if records.len() != shapes.len() {
        return Err(Error::Malformed(format!(
            "{} shapes but {} attribute records",
            shapes.len(),
            records.len()
        )));
    }
    debug!(records = records.len(), "decoded shapefile");

    let mut frame = GeoFrame::new(columns.clone());
    for (shape, record) in shapes.into_iter().zip(records) {
        let row = columns
            .iter()
            .map(|name| record.get(name).map(field_to_value).unwrap_or(Value::Null))
            .collect();
        frame.push_row(row, shape_to_geometry(shape)?);
    }
    Ok(frame)
}

/// Pull the first archive member with the given extension (any case) into
/// memory. Member paths may carry directory prefixes.
fn extract_member(archive: &mut zip::ZipArchive<File>, extension: &str) -> Result<Vec<u8>> {
    let name = archive
        .file_names()
        .find(|n| n.to_ascii_lowercase().ends_with(extension))
        .map(|n| n.to_string())
        .ok_or_else(|| Error::Malformed(format!("no {extension} member in archive")))?;
    let mut member = archive.by_name(&name)?;
    let mut buf = Vec::with_capacity(member.size() as usize);
    member.read_to_end(&mut buf)?;
    Ok(buf)
}

fn field_to_value(field: &FieldValue) -> Value {
    match field {
        FieldValue::Character(Some(s)) => Value::Text(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Value::Number(*n),
        FieldValue::Float(Some(f)) => Value::Number(f64::from(*f)),
        FieldValue::Integer(i) => Value::Number(f64::from(*i)),
        FieldValue::Double(d) => Value::Number(*d),
        FieldValue::Currency(c) => Value::Number(*c),
        FieldValue::Logical(Some(b)) => Value::Text(b.to_string()),
        FieldValue::Date(Some(d)) => Value::Text(d.to_string()),
        FieldValue::Memo(s) => Value::Text(s.trim().to_string()),
        _ => Value::Null,
    }
}

fn coord(p: &shapefile::Point) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

fn shape_to_geometry(shape: Shape) -> Result<Geometry<f64>> {
    match shape {
        Shape::Point(p) => Ok(geo_types::Point::new(p.x, p.y).into()),
        Shape::Multipoint(mp) => Ok(MultiPoint::new(
            mp.points()
                .iter()
                .map(|p| geo_types::Point::new(p.x, p.y))
                .collect(),
        )
        .into()),
        Shape::Polyline(pl) => Ok(MultiLineString::new(
            pl.parts()
                .iter()
                .map(|part| LineString::new(part.iter().map(coord).collect()))
                .collect(),
        )
        .into()),
        Shape::Polygon(pg) => Ok(polygon_to_geometry(&pg)),
        other => Err(Error::Geometry(format!(
            "unsupported shape type: {}",
            other.shapetype()
        ))),
    }
}

/// Rings are stored flat with outer rings opening a new polygon and inner
/// rings attaching to the most recent outer one.
fn polygon_to_geometry(pg: &shapefile::Polygon) -> Geometry<f64> {
    use shapefile::PolygonRing;

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    for ring in pg.rings() {
        match ring {
            PolygonRing::Outer(points) => {
                let exterior = LineString::new(points.iter().map(coord).collect());
                polygons.push(Polygon::new(exterior, Vec::new()));
            }
            PolygonRing::Inner(points) => {
                let interior = LineString::new(points.iter().map(coord).collect());
                match polygons.last_mut() {
                    Some(current) => current.interiors_push(interior),
                    // A lone inner ring is treated as an outer one.
                    None => polygons.push(Polygon::new(interior, Vec::new())),
                }
            }
        }
    }
    if polygons.len() == 1 {
        if let Some(single) = polygons.pop() {
            return Geometry::Polygon(single);
        }
    }
    Geometry::MultiPolygon(MultiPolygon::new(polygons))
}
