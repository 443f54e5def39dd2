//! Geography entry points.
//!
//! `Tigris` owns the HTTP fetcher, the archive cache and the FIPS
//! reference tables, and exposes one method per summary level. Each
//! method validates its inputs, builds the archive URL, fetches and
//! normalizes the frame, and applies the geography's post-filtering.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, Days, Utc};
use tracing::info;

use crate::cache::CacheManager;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, LoadOptions};
use crate::fips::{resolve_county, resolve_state, FipsTables};
use crate::frame::{dissolve, GeoFrame, Value};
use crate::url::{construct_url, Resolution, UrlRequest};

/// Options shared by every geography entry point.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Request generalized cartographic boundary files instead of
    /// full-resolution TIGER/Line files.
    pub cb: bool,
    /// Cartographic boundary resolution: '500k', '5m' or '20m'.
    pub resolution: String,
    /// Vintage year. Defaults to the most recently completed calendar
    /// year (ZCTAs default to 2020).
    pub year: Option<i32>,
    /// Re-download even when a cached archive exists.
    pub refresh: bool,
    /// Keep downloaded archives in the cache directory.
    pub use_cache: bool,
    /// Log download progress.
    pub progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cb: false,
            resolution: "500k".to_string(),
            year: None,
            refresh: false,
            use_cache: true,
            progress: false,
        }
    }
}

impl FetchOptions {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            refresh: self.refresh,
            use_cache: self.use_cache,
            progress: self.progress,
        }
    }
}

/// School district flavor. Parses permissively from either the long name
/// or the Census type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchoolDistrict {
    #[default]
    Unified,
    Elementary,
    Secondary,
}

impl SchoolDistrict {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolDistrict::Unified => "unsd",
            SchoolDistrict::Elementary => "elsd",
            SchoolDistrict::Secondary => "scsd",
        }
    }
}

impl fmt::Display for SchoolDistrict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolDistrict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unified" | "unsd" => Ok(SchoolDistrict::Unified),
            "elementary" | "elsd" => Ok(SchoolDistrict::Elementary),
            "secondary" | "scsd" => Ok(SchoolDistrict::Secondary),
            other => Err(Error::Validation(format!(
                "unknown school district type '{other}', should be one of: 'unified', 'elementary', 'secondary'"
            ))),
        }
    }
}

/// Client for the Census Bureau's TIGER/Line and cartographic boundary
/// archives.
pub struct Tigris {
    fetcher: Fetcher,
    tables: FipsTables,
}

impl Tigris {
    /// Create a client caching under the platform cache directory.
    pub fn new() -> Result<Self> {
        Self::with_cache(CacheManager::new()?)
    }

    /// Create a client caching under an explicit directory.
    pub fn with_cache_dir(dir: PathBuf) -> Result<Self> {
        Self::with_cache(CacheManager::with_dir(dir)?)
    }

    fn with_cache(cache: CacheManager) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(cache)?,
            tables: FipsTables::load()?,
        })
    }

    /// The loaded FIPS reference tables.
    pub fn tables(&self) -> &FipsTables {
        &self.tables
    }

    /// Remove every cached archive.
    pub fn clear_cache(&self) -> Result<()> {
        self.fetcher.cache().clear()
    }

    /// Boundaries of the 50 states plus DC and the island territories.
    pub fn states(&self, options: &FetchOptions) -> Result<GeoFrame> {
        let resolution = options.resolution.parse::<Resolution>()?;
        let year = self.effective_year(options);

        let mut frame = self.fetch("state", options.cb, resolution, year, "us", options)?;
        if legacy_cb(options.cb, year) {
            frame = dissolve(&frame, &["STATEFP"])?;
        }
        Ok(frame)
    }

    /// County boundaries, optionally subset to a list of states. State
    /// tokens may be FIPS codes, full names or abbreviations.
    pub fn counties(&self, states: &[&str], options: &FetchOptions) -> Result<GeoFrame> {
        let resolution = options.resolution.parse::<Resolution>()?;
        let wanted: Vec<String> = states
            .iter()
            .map(|s| resolve_state(&self.tables, s))
            .collect::<Result<_>>()?;
        let year = self.effective_year(options);

        let mut frame = self.fetch("county", options.cb, resolution, year, "us", options)?;
        if legacy_cb(options.cb, year) {
            frame = dissolve(&frame, &["STATEFP", "COUNTYFP"])?;
        }
        if !wanted.is_empty() {
            frame.retain_where("STATEFP", |v| {
                v.as_str().is_some_and(|s| wanted.iter().any(|w| w == s))
            })?;
        }
        Ok(frame)
    }

    /// Census tract boundaries for a state, optionally subset to a list
    /// of counties. A national file exists only for cartographic
    /// boundaries after 2018.
    pub fn tracts(
        &self,
        state: Option<&str>,
        counties: &[&str],
        options: &FetchOptions,
    ) -> Result<GeoFrame> {
        self.tract_level("tract", &["STATEFP", "COUNTYFP", "TRACT"], state, counties, options)
    }

    /// Block group boundaries, gated exactly like tracts.
    pub fn block_groups(
        &self,
        state: Option<&str>,
        counties: &[&str],
        options: &FetchOptions,
    ) -> Result<GeoFrame> {
        self.tract_level(
            "bg",
            &["STATEFP", "COUNTYFP", "TRACT", "BLKGRP"],
            state,
            counties,
            options,
        )
    }

    fn tract_level(
        &self,
        geography: &str,
        dissolve_keys: &[&str],
        state: Option<&str>,
        counties: &[&str],
        options: &FetchOptions,
    ) -> Result<GeoFrame> {
        // Tract-level cartographic files only come in one resolution.
        let resolution = Resolution::R500k;
        let year = self.effective_year(options);

        let state = match state {
            Some(token) => resolve_state(&self.tables, token)?,
            None if options.cb && year > 2018 => "us".to_string(),
            None => {
                return Err(Error::Validation(
                    "set year > 2018 and cb = true to retrieve the whole US".to_string(),
                ))
            }
        };

        let mut frame = self.fetch(geography, options.cb, resolution, year, &state, options)?;

        if !counties.is_empty() {
            if state == "us" {
                return Err(Error::Validation(
                    "county filters require a state".to_string(),
                ));
            }
            let wanted: Vec<String> = counties
                .iter()
                .map(|c| resolve_county(&self.tables, &state, c))
                .collect::<Result<_>>()?;
            frame.retain_where("COUNTYFP", |v| {
                v.as_str().is_some_and(|s| wanted.iter().any(|w| w == s))
            })?;
        }

        if legacy_cb(options.cb, year) {
            repair_legacy_tract_key(&mut frame, year);
            frame = dissolve(&frame, dissolve_keys)?;
        }
        Ok(frame)
    }

    /// School district boundaries. Cartographic boundary files are only
    /// published for 2010, 2016 and 2019 onwards; the national file
    /// requires cb and year >= 2019.
    pub fn school_districts(
        &self,
        state: Option<&str>,
        kind: SchoolDistrict,
        options: &FetchOptions,
    ) -> Result<GeoFrame> {
        let resolution = options.resolution.parse::<Resolution>()?;
        let year = self.effective_year(options);

        if options.cb && !(year == 2010 || year == 2016 || year >= 2019) {
            return Err(Error::Validation(format!(
                "cartographic school district boundaries are only available for 2010, 2016 and 2019 onwards (year specified: {year})"
            )));
        }

        let state = match state {
            Some(token) => resolve_state(&self.tables, token)?,
            None if options.cb && year >= 2019 => "us".to_string(),
            None => {
                return Err(Error::Validation(
                    "set year >= 2019 and cb = true to retrieve school districts for the whole US"
                        .to_string(),
                ))
            }
        };

        self.fetch(kind.as_str(), options.cb, resolution, year, &state, options)
    }

    /// ZIP Code Tabulation Area boundaries. Per-state files only exist
    /// for the 2000 and 2010 vintages; `starts_with` filters by ZCTA
    /// code prefix.
    pub fn zctas(
        &self,
        state: Option<&str>,
        starts_with: Option<&str>,
        options: &FetchOptions,
    ) -> Result<GeoFrame> {
        let resolution = options.resolution.parse::<Resolution>()?;
        let year = options.year.unwrap_or(DEFAULT_ZCTA_YEAR);

        let state = match state {
            Some(token) => {
                let fips = resolve_state(&self.tables, token)?;
                let per_state =
                    (!options.cb && (year == 2000 || year == 2010)) || (options.cb && year == 2000);
                if !per_state {
                    return Err(Error::Validation(format!(
                        "per-state ZCTA files only exist for the 2000 and 2010 TIGER/Line vintages and the 2000 cartographic vintage (year specified: {year})"
                    )));
                }
                fips
            }
            None => "us".to_string(),
        };

        let geography = zcta_token(options.cb, year);
        let mut frame = self.fetch(geography, options.cb, resolution, year, &state, options)?;

        if let Some(prefix) = starts_with {
            // Column name carries the vintage (ZCTA, ZCTA5CE, ...).
            let idx = frame.column_index_by_prefix("ZCTA").ok_or_else(|| {
                Error::Malformed("no ZCTA code column in the attribute table".to_string())
            })?;
            let name = frame.columns()[idx].clone();
            frame.retain_where(&name, |v| {
                v.as_str().is_some_and(|s| s.starts_with(prefix))
            })?;
        }
        Ok(frame)
    }

    fn effective_year(&self, options: &FetchOptions) -> i32 {
        options.year.unwrap_or_else(|| {
            let year = default_year();
            if options.progress {
                info!(year, "no vintage specified, using the most recent complete year");
            }
            year
        })
    }

    fn fetch(
        &self,
        geography: &str,
        cb: bool,
        resolution: Resolution,
        year: i32,
        state: &str,
        options: &FetchOptions,
    ) -> Result<GeoFrame> {
        let request = UrlRequest {
            year,
            geography,
            cb,
            resolution,
            state,
            state_name: self.tables.state_name(state),
        };
        let url = construct_url(&request)?;
        self.fetcher.load(&url, options.load_options())
    }
}

/// ZCTAs are decennial products; the newest complete vintage is a better
/// default than the current year.
const DEFAULT_ZCTA_YEAR: i32 = 2020;

/// Legacy cartographic vintages ship one record per polygon part and need
/// a dissolve pass.
fn legacy_cb(cb: bool, year: i32) -> bool {
    cb && (year == 1990 || year == 2000)
}

/// Most recently completed calendar year, computed with a leap-year-safe
/// 366-day lookback.
fn default_year() -> i32 {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(366))
        .map(|d| d.year())
        .unwrap_or_else(|| Utc::now().year() - 1)
}

/// Geography token for the ZCTA archive of a given vintage. The token
/// carries the decennial suffix outside the eras that encode it in the
/// path instead.
fn zcta_token(cb: bool, year: i32) -> &'static str {
    if cb {
        match year {
            2000 | 1990 => "zt",
            2010 => "zcta",
            y if y >= 2020 => "zcta520",
            _ => "zcta510",
        }
    } else {
        match year {
            2000 | 2010 => "zcta5",
            2008 | 2009 => "zcta500",
            y if y >= 2020 => "zcta520",
            _ => "zcta510",
        }
    }
}

/// Rebuild the tract key on legacy cartographic frames: 1990 splits it
/// into base and suffix columns (missing suffix means "00"), 2000 ships
/// it without leading zeros.
fn repair_legacy_tract_key(frame: &mut GeoFrame, year: i32) {
    if year == 1990 {
        let base = frame.column_index("TRACTBASE");
        let suffix = frame.column_index("TRACTSUF");
        if let Some(base) = base {
            frame.add_column("TRACT", move |row| {
                let b = key_text(&row[base]);
                let s = suffix
                    .map(|i| &row[i])
                    .filter(|v| !v.is_null())
                    .map(key_text)
                    .unwrap_or_else(|| "00".to_string());
                Value::Text(format!("{b}{s}"))
            });
        }
    } else if frame.column_index("TRACT").is_some() {
        frame.map_column("TRACT", |v| match v.as_str() {
            Some(s) => Value::Text(format!("{s:0>6}")),
            None => v.clone(),
        });
    }
}

fn key_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    fn client() -> (tempfile::TempDir, Tigris) {
        let dir = tempfile::tempdir().unwrap();
        let tigris = Tigris::with_cache_dir(dir.path().join("cache")).unwrap();
        (dir, tigris)
    }

    fn options(cb: bool, year: i32) -> FetchOptions {
        FetchOptions {
            cb,
            year: Some(year),
            ..FetchOptions::default()
        }
    }

    #[test]
    fn school_district_parsing() {
        assert_eq!(
            "Unified".parse::<SchoolDistrict>().unwrap(),
            SchoolDistrict::Unified
        );
        assert_eq!(
            "elsd".parse::<SchoolDistrict>().unwrap(),
            SchoolDistrict::Elementary
        );
        assert_eq!(
            " SECONDARY ".parse::<SchoolDistrict>().unwrap(),
            SchoolDistrict::Secondary
        );
        assert!("district".parse::<SchoolDistrict>().is_err());
    }

    #[test]
    fn invalid_resolution_fails_before_any_io() {
        let (_dir, tigris) = client();
        let opts = FetchOptions {
            resolution: "1m".to_string(),
            ..options(true, 2020)
        };
        assert!(matches!(
            tigris.states(&opts),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn national_tracts_require_recent_cb() {
        let (_dir, tigris) = client();
        assert!(matches!(
            tigris.tracts(None, &[], &options(false, 2020)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            tigris.tracts(None, &[], &options(true, 2018)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            tigris.block_groups(None, &[], &options(false, 2020)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn school_district_year_gating() {
        let (_dir, tigris) = client();
        for year in [1990, 1995, 2000, 2002, 2005, 2012, 2014] {
            assert!(
                matches!(
                    tigris.school_districts(Some("ia"), SchoolDistrict::Unified, &options(true, year)),
                    Err(Error::Validation(_))
                ),
                "cb year {year} should be rejected"
            );
        }
        for year in [1990, 1995, 2002, 2005] {
            assert!(
                matches!(
                    tigris.school_districts(Some("ia"), SchoolDistrict::Unified, &options(false, year)),
                    Err(Error::Validation(_))
                ),
                "year {year} should be rejected"
            );
        }
        // National files need cb and 2019 onwards.
        assert!(tigris
            .school_districts(None, SchoolDistrict::Unified, &options(false, 2020))
            .is_err());
        assert!(tigris
            .school_districts(None, SchoolDistrict::Unified, &options(true, 2018))
            .is_err());
    }

    #[test]
    fn zcta_state_gating() {
        let (_dir, tigris) = client();
        for year in [1990, 1995, 2002, 2005, 2013, 2020] {
            assert!(
                matches!(
                    tigris.zctas(Some("co"), None, &options(false, year)),
                    Err(Error::Validation(_))
                ),
                "per-state year {year} should be rejected"
            );
        }
        for year in [2002, 2005, 2010, 2012] {
            assert!(
                matches!(
                    tigris.zctas(Some("co"), None, &options(true, year)),
                    Err(Error::Validation(_))
                ),
                "per-state cb year {year} should be rejected"
            );
        }
    }

    #[test]
    fn zcta_tokens_track_the_vintage() {
        assert_eq!(zcta_token(true, 2000), "zt");
        assert_eq!(zcta_token(true, 2010), "zcta");
        assert_eq!(zcta_token(true, 2015), "zcta510");
        assert_eq!(zcta_token(true, 2020), "zcta520");
        assert_eq!(zcta_token(false, 2000), "zcta5");
        assert_eq!(zcta_token(false, 2008), "zcta500");
        assert_eq!(zcta_token(false, 2014), "zcta510");
        assert_eq!(zcta_token(false, 2021), "zcta520");
    }

    #[test]
    fn default_year_is_a_completed_one() {
        let year = default_year();
        assert!(year < Utc::now().year());
        assert!(year >= Utc::now().year() - 2);
    }

    #[test]
    fn legacy_tract_key_repair() {
        let mut frame = GeoFrame::new(vec!["TRACTBASE".into(), "TRACTSUF".into()]);
        let square: geo_types::Geometry<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]
        .into();
        frame.push_row(vec!["0101".into(), "85".into()], square.clone());
        frame.push_row(vec!["0102".into(), Value::Null], square.clone());
        repair_legacy_tract_key(&mut frame, 1990);
        assert_eq!(frame.text(0, "TRACT"), Some("010185"));
        assert_eq!(frame.text(1, "TRACT"), Some("010200"));

        let mut frame = GeoFrame::new(vec!["TRACT".into()]);
        frame.push_row(vec!["9501".into()], square);
        repair_legacy_tract_key(&mut frame, 2000);
        assert_eq!(frame.text(0, "TRACT"), Some("009501"));
    }
}
