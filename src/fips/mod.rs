//! FIPS reference tables and identifier resolution.
//!
//! This module turns user-supplied state and county tokens (FIPS codes,
//! full names, or abbreviations) into canonical FIPS codes using the two
//! bundled Census reference tables. Tables are loaded once and immutable
//! afterwards.

pub mod resolve;
pub mod tables;

pub use resolve::{resolve_county, resolve_state, CountyMatch};
pub use tables::{CountyRow, FipsTables, StateRow};
