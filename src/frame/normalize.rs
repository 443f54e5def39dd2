//! Column standardization across vintages.
//!
//! Source files encode their vintage with "00"/"10" column suffixes and a
//! handful of short legacy names. Both are redundant once the request year
//! is known, so every frame is normalized to the canonical long names
//! before it is returned or dissolved.

use crate::frame::GeoFrame;

/// CRS of every published TIGER/Line and cartographic boundary file
/// (NAD83). Set as metadata; nothing is reprojected.
pub const CRS_NAD83: &str = "EPSG:4269";

const LEGACY_RENAMES: &[(&str, &str)] = &[
    ("COUNTY", "COUNTYFP"),
    ("STATE", "STATEFP"),
    ("CO", "COUNTYFP"),
    ("ST", "STATEFP"),
];

/// Normalize a frame in place: tag the CRS, strip vintage suffixes, and
/// rename legacy short columns. Idempotent.
pub fn normalize(frame: &mut GeoFrame) {
    frame.crs = Some(CRS_NAD83.to_string());

    let stripped: Vec<String> = frame
        .columns()
        .iter()
        .map(|name| {
            if name.len() > 2 && (name.ends_with("00") || name.ends_with("10")) {
                name[..name.len() - 2].to_string()
            } else {
                name.clone()
            }
        })
        .collect();
    for (old, new) in frame.columns().to_vec().iter().zip(&stripped) {
        if old != new {
            frame.rename_column(old, new);
        }
    }

    for (from, to) in LEGACY_RENAMES {
        frame.rename_column(from, to);
    }
}
