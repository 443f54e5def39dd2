//! State and county token resolution.
//!
//! Tokens may be FIPS codes, full names, or abbreviations, in any case.
//! County name matching is a deliberate case-insensitive substring match so
//! that "Haralson" finds "Haralson County"; an ambiguous match lists every
//! candidate rather than guessing.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fips::tables::FipsTables;

/// Outcome of a fuzzy county-name lookup, before it is turned into a
/// result at the API edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountyMatch {
    /// Exactly one county matched; its three-digit FIPS code.
    Unique(String),
    /// More than one county matched; the candidate names, in table order.
    Ambiguous(Vec<String>),
    NotFound,
}

/// Resolve a state token to its canonical two-digit FIPS code.
///
/// Numeric tokens must be a valid two-digit state FIPS; longer numeric
/// tokens are treated as county/place codes carrying a state prefix and
/// truncated with a warning. Non-numeric tokens match the full state name
/// first, then the postal abbreviation, case-insensitively.
pub fn resolve_state(tables: &FipsTables, token: &str) -> Result<String> {
    let token = token.trim().to_lowercase();

    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        if token.len() == 2 && tables.states().iter().any(|s| s.fips == token) {
            return Ok(token);
        }
        if token.len() > 2 {
            let prefix = &token[..2];
            if tables.states().iter().any(|s| s.fips == prefix) {
                warn!(
                    %token,
                    prefix, "using first 2 digits of a county or place FIPS code"
                );
                return Ok(prefix.to_string());
            }
        }
        return Err(Error::Identifier(format!(
            "'{token}' is not a valid state FIPS code"
        )));
    }

    if let Some(row) = tables
        .states()
        .iter()
        .find(|s| s.name.to_lowercase() == token)
    {
        return Ok(row.fips.clone());
    }
    if let Some(row) = tables
        .states()
        .iter()
        .find(|s| s.abb.to_lowercase() == token)
    {
        return Ok(row.fips.clone());
    }

    Err(Error::Identifier(format!(
        "'{token}' is not a valid state FIPS code, name or abbreviation"
    )))
}

/// Resolve a county token within a state to its three-digit FIPS code.
///
/// The state token is resolved first. A numeric county token requires an
/// exact three-digit FIPS match; anything else is matched as a substring
/// against county names.
pub fn resolve_county(tables: &FipsTables, state_token: &str, county_token: &str) -> Result<String> {
    let state = resolve_state(tables, state_token)?;
    let county = county_token.trim();

    if !county.is_empty() && county.chars().all(|c| c.is_ascii_digit()) {
        if county.len() == 3 && tables.counties_of(&state).any(|c| c.county_fips == county) {
            return Ok(county.to_string());
        }
        return Err(Error::Identifier(format!(
            "'{county}' is not a valid county FIPS code for state {state}"
        )));
    }

    match match_county_name(tables, &state, county) {
        CountyMatch::Unique(fips) => {
            info!(county, %state, %fips, "matched county by name");
            Ok(fips)
        }
        CountyMatch::NotFound => Err(Error::Identifier(format!(
            "no county by name '{county}' can be found for state {state}"
        ))),
        CountyMatch::Ambiguous(candidates) => Err(Error::Identifier(format!(
            "multiple counties found for name '{county}' in state {state}, refine the selection:\n > {}",
            candidates.join("\n > ")
        ))),
    }
}

/// Case-insensitive substring match of `name` against the county names of
/// one state.
pub fn match_county_name(tables: &FipsTables, state_fips: &str, name: &str) -> CountyMatch {
    let needle = name.to_lowercase();
    let hits: Vec<_> = tables
        .counties_of(state_fips)
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect();

    match hits.as_slice() {
        [] => CountyMatch::NotFound,
        [only] => CountyMatch::Unique(only.county_fips.clone()),
        _ => CountyMatch::Ambiguous(hits.iter().map(|c| c.name.clone()).collect()),
    }
}
