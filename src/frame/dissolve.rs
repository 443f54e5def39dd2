//! Geometry dissolution.
//!
//! Legacy cartographic boundary files ship one record per polygon part, so
//! a county with islands appears several times. Dissolving groups rows by
//! key columns, unions the geometry of each group, sums the area columns,
//! and keeps the first value seen for everything else.

use std::collections::HashMap;

use geo::BooleanOps;
use geo_types::{Geometry, MultiPolygon};

use crate::error::{Error, Result};
use crate::frame::{GeoFrame, Value};

/// Columns whose values are summed per group instead of taking the first.
const SUMMED_COLUMNS: &[&str] = &["AREA", "PERIMETER"];

/// Dissolve `frame` by the given key columns. Key columns missing from the
/// frame are ignored; if none are present the whole frame collapses into a
/// single row. Group order follows first appearance in the input.
pub fn dissolve(frame: &GeoFrame, keys: &[&str]) -> Result<GeoFrame> {
    let key_indices: Vec<usize> = keys
        .iter()
        .filter_map(|k| frame.column_index(k))
        .collect();

    let mut order: Vec<Vec<Value>> = Vec::new();
    let mut groups: HashMap<Vec<String>, usize> = HashMap::new();
    let mut members: Vec<Vec<usize>> = Vec::new();

    for (row_idx, row) in frame.rows().enumerate() {
        let key: Vec<String> = key_indices
            .iter()
            .map(|&i| match &row[i] {
                Value::Text(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Null => String::new(),
            })
            .collect();
        match groups.get(&key) {
            Some(&slot) => members[slot].push(row_idx),
            None => {
                groups.insert(key, members.len());
                members.push(vec![row_idx]);
                order.push(row.to_vec());
            }
        }
    }

    let mut out = GeoFrame::new(frame.columns().to_vec());
    out.crs = frame.crs.clone();

    for (slot, first_row) in order.into_iter().enumerate() {
        let rows = &members[slot];
        let mut merged = to_multi(&frame.geometry()[rows[0]])?;
        for &row_idx in &rows[1..] {
            let part = to_multi(&frame.geometry()[row_idx])?;
            merged = merged.union(&part);
        }

        let mut values = first_row;
        for name in SUMMED_COLUMNS {
            if let Some(col) = frame.column_index(name) {
                let total: f64 = rows
                    .iter()
                    .map(|&r| frame.value(r, name).and_then(Value::as_f64).unwrap_or(0.0))
                    .sum();
                values[col] = Value::Number(total);
            }
        }
        out.push_row(values, Geometry::MultiPolygon(merged));
    }

    Ok(out)
}

fn to_multi(geometry: &Geometry<f64>) -> Result<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Ok(mp.clone()),
        other => Err(Error::Geometry(format!(
            "cannot dissolve non-areal geometry: {other:?}"
        ))),
    }
}
