//! Tabular + geometry result frames.
//!
//! A `GeoFrame` is what every geography entry point returns: an ordered set
//! of attribute columns, one row of `Value` cells per record, and a parallel
//! geometry column. The frame owns its data outright; the library keeps no
//! handle on it after returning.

pub mod dissolve;
pub mod normalize;
pub mod shp;

use geo_types::Geometry;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use dissolve::dissolve;
pub use normalize::normalize;

/// A single attribute cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Number(f64),
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// Tabular records with a geometry column and a CRS tag.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFrame {
    /// Coordinate reference system, e.g. "EPSG:4269". Metadata only; the
    /// library never reprojects.
    pub crs: Option<String>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    geometry: Vec<Geometry<f64>>,
}

impl GeoFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            crs: None,
            columns,
            rows: Vec::new(),
            geometry: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First column whose name starts with `prefix`. Vintage-suffixed
    /// columns (ZCTA5CE10, ZCTA5CE20) make exact lookups brittle.
    pub fn column_index_by_prefix(&self, prefix: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.starts_with(prefix))
    }

    pub fn geometry(&self) -> &[Geometry<f64>] {
        &self.geometry
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        self.value(row, column).and_then(Value::as_str)
    }

    /// Append a record. The row must carry exactly one cell per column.
    pub fn push_row(&mut self, row: Vec<Value>, geometry: Geometry<f64>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
        self.geometry.push(geometry);
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Add a column computed per row. Used to rebuild legacy key columns
    /// before dissolving (e.g. the 1990 TRACT base+suffix concatenation).
    pub fn add_column<F>(&mut self, name: &str, mut build: F)
    where
        F: FnMut(&[Value]) -> Value,
    {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            let value = build(row);
            row.push(value);
        }
    }

    /// Rewrite one column in place.
    pub fn map_column<F>(&mut self, name: &str, mut map: F)
    where
        F: FnMut(&Value) -> Value,
    {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = map(&row[idx]);
            }
        }
    }

    /// Keep only the rows whose mask entry is true. The mask must cover
    /// every row.
    pub fn retain_by_mask(&mut self, mask: &[bool]) {
        debug_assert_eq!(mask.len(), self.rows.len());
        let mut keep = mask.iter().copied();
        self.rows.retain(|_| keep.next().unwrap_or(false));
        let mut keep = mask.iter().copied();
        self.geometry.retain(|_| keep.next().unwrap_or(false));
    }

    /// Keep rows whose cell in `column` satisfies the predicate. Filtering
    /// on a column the frame does not carry is an error, so a vintage with
    /// unexpected columns fails loudly instead of yielding an empty frame.
    pub fn retain_where<F>(&mut self, column: &str, mut predicate: F) -> Result<()>
    where
        F: FnMut(&Value) -> bool,
    {
        let idx = self.column_index(column).ok_or_else(|| {
            Error::Malformed(format!("no '{column}' column in the attribute table"))
        })?;
        let mask: Vec<bool> = self.rows.iter().map(|r| predicate(&r[idx])).collect();
        self.retain_by_mask(&mask);
        Ok(())
    }
}
