//! tigris - a client for US Census TIGER/Line and cartographic boundary
//! shapefiles.
//!
//! The crate resolves human-friendly state and county identifiers to FIPS
//! codes, builds archive URLs across the Census Bureau's historically
//! inconsistent layouts, downloads and caches the zipped shapefiles, and
//! returns them as normalized tabular+geometry frames.
//!
//! ```no_run
//! use tigris::{FetchOptions, Tigris};
//!
//! let tigris = Tigris::new()?;
//! let counties = tigris.counties(&["GA", "AL"], &FetchOptions::default())?;
//! for row in 0..counties.len() {
//!     println!("{:?}", counties.text(row, "NAME"));
//! }
//! # Ok::<(), tigris::Error>(())
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod fetch;
pub mod fips;
pub mod frame;
pub mod url;

pub use client::{FetchOptions, SchoolDistrict, Tigris};
pub use error::{Error, Result};
pub use fips::{resolve_county, resolve_state, CountyMatch, FipsTables};
pub use frame::{GeoFrame, Value};
pub use url::Resolution;
