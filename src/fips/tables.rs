//! Bundled FIPS reference tables.
//!
//! Two static CSVs ship with the crate: the state table (FIPS code, name,
//! abbreviation) and the national county table (state FIPS, county FIPS,
//! county name), derived from the Census Bureau's published code files.
//! Loading is an explicit one-time step; the resulting tables are owned by
//! the caller and never mutated.

use serde::Deserialize;

use crate::error::Result;

const STATE_FIPS_CSV: &str = include_str!("data/state_fips.csv");
const NATIONAL_COUNTY_CSV: &str = include_str!("data/national_county.csv");

/// One row of the state reference table.
#[derive(Debug, Clone, Deserialize)]
pub struct StateRow {
    /// Two-digit state FIPS code.
    pub fips: String,
    /// Full state name, e.g. "New Mexico".
    pub name: String,
    /// Two-letter postal abbreviation, e.g. "NM".
    pub abb: String,
}

/// One row of the national county reference table.
#[derive(Debug, Clone, Deserialize)]
pub struct CountyRow {
    #[serde(rename = "STATEFP")]
    pub state_fips: String,
    #[serde(rename = "COUNTYFP")]
    pub county_fips: String,
    #[serde(rename = "COUNTYNAME")]
    pub name: String,
}

/// Both reference tables, loaded once at client construction.
#[derive(Debug, Clone)]
pub struct FipsTables {
    states: Vec<StateRow>,
    counties: Vec<CountyRow>,
}

impl FipsTables {
    /// Parse the bundled CSVs. Called once per client; the result is
    /// read-only for the rest of its life.
    pub fn load() -> Result<Self> {
        let mut states = Vec::new();
        let mut reader = csv::Reader::from_reader(STATE_FIPS_CSV.as_bytes());
        for row in reader.deserialize() {
            states.push(row?);
        }

        let mut counties = Vec::new();
        let mut reader = csv::Reader::from_reader(NATIONAL_COUNTY_CSV.as_bytes());
        for row in reader.deserialize() {
            counties.push(row?);
        }

        Ok(Self { states, counties })
    }

    pub fn states(&self) -> &[StateRow] {
        &self.states
    }

    /// Counties belonging to the given state FIPS code.
    pub fn counties_of<'a>(
        &'a self,
        state_fips: &'a str,
    ) -> impl Iterator<Item = &'a CountyRow> + 'a {
        self.counties
            .iter()
            .filter(move |c| c.state_fips == state_fips)
    }

    /// Full state name for a FIPS code, if known. Used by the URL builder
    /// for the 2008/2009 per-state directory scheme.
    pub fn state_name(&self, fips: &str) -> Option<&str> {
        self.states
            .iter()
            .find(|s| s.fips == fips)
            .map(|s| s.name.as_str())
    }
}
