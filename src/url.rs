//! Remote archive URL construction.
//!
//! The Census Bureau's archive layout changed incompatibly several times;
//! each era below corresponds to an observed real-world layout. The rules
//! are kept as an ordered table of (predicate, builder) pairs evaluated in
//! sequence, so each era stays independently testable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const BASE_URL: &str = "https://www2.census.gov/geo/tiger/";

/// Cartographic boundary resolution. Parsed from the '500k'|'5m'|'20m'
/// strings the public API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    R500k,
    R5m,
    R20m,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::R500k => "500k",
            Resolution::R5m => "5m",
            Resolution::R20m => "20m",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "500k" => Ok(Resolution::R500k),
            "5m" => Ok(Resolution::R5m),
            "20m" => Ok(Resolution::R20m),
            other => Err(Error::Validation(format!(
                "invalid resolution value '{other}', should be one of: '500k', '5m', '20m'"
            ))),
        }
    }
}

/// Everything the URL rules branch on. `geography` is the lowercase type
/// token used in upstream filenames (state, county, tract, bg, unsd, ...);
/// `state` is a two-digit FIPS code or "us" for national files.
#[derive(Debug, Clone)]
pub struct UrlRequest<'a> {
    pub year: i32,
    pub geography: &'a str,
    pub cb: bool,
    pub resolution: Resolution,
    pub state: &'a str,
    /// Full state name, required only by the 2008/2009 per-state layout.
    pub state_name: Option<&'a str>,
}

/// Numeric summary-level codes used by the 2010 generalized-boundary
/// archive (GENZ2010).
fn summary_level_code(geography: &str) -> Option<&'static str> {
    Some(match geography {
        "region" => "020",
        "division" => "030",
        "state" => "040",
        "county" => "050",
        "tract" => "140",
        "block" | "bg" => "150",
        "place" => "160",
        "zcta" => "860",
        "elsd" => "950",
        "scsd" => "960",
        "unsd" => "970",
        _ => return None,
    })
}

/// Geographies whose 1990/2000 generalized files are published per state,
/// with the state FIPS encoded in the filename instead of a year marker.
fn legacy_state_in_path(geography: &str) -> bool {
    matches!(geography, "tract" | "bg" | "zt")
}

struct Rule {
    matches: fn(&UrlRequest) -> bool,
    build: fn(&UrlRequest) -> Result<String>,
}

/// Ordered by era; the first matching rule wins.
const RULES: &[Rule] = &[
    // Generalized boundaries, 1990/2000 (PREVGENZ).
    Rule {
        matches: |r| r.cb && (r.year == 1990 || r.year == 2000),
        build: |r| {
            let ab: String = r.geography.chars().take(2).collect();
            let yy = r.year % 100;
            let v = if legacy_state_in_path(r.geography) && r.state != "us" {
                r.state
            } else {
                "99"
            };
            Ok(format!("{BASE_URL}PREVGENZ/{ab}/{ab}{yy:02}shp/{ab}{v}_d{yy:02}_shp.zip"))
        },
    },
    // Generalized boundaries, 2010 (GENZ2010, numeric summary-level codes).
    Rule {
        matches: |r| r.cb && r.year == 2010,
        build: |r| {
            let code = summary_level_code(r.geography).ok_or_else(|| {
                Error::Validation(format!(
                    "no 2010 generalized boundary file for geography '{}'",
                    r.geography
                ))
            })?;
            Ok(format!(
                "{BASE_URL}GENZ2010/gz_2010_{}_{code}_00_{}.zip",
                r.state, r.resolution
            ))
        },
    },
    // 2012 published only a redistricting subset.
    Rule {
        matches: |r| r.cb && r.year == 2012,
        build: |r| {
            if !matches!(r.geography, "cd" | "sldl" | "sldu" | "ua") {
                return Err(Error::Validation(format!(
                    "2012 cartographic boundary data is only defined for cd, sldl, sldu and ua (got '{}')",
                    r.geography
                )));
            }
            Ok(format!(
                "{BASE_URL}GENZ2012/shp/cb_rd13_{}_{}_{}.zip",
                r.state, r.geography, r.resolution
            ))
        },
    },
    // 2013 cb files sit directly under GENZ2013.
    Rule {
        matches: |r| r.cb && r.year == 2013,
        build: |r| {
            Ok(format!(
                "{BASE_URL}GENZ2013/cb_2013_{}_{}_{}.zip",
                r.state, r.geography, r.resolution
            ))
        },
    },
    // 2014 onwards adds an shp/ level.
    Rule {
        matches: |r| r.cb && r.year > 2013,
        build: |r| {
            Ok(format!(
                "{BASE_URL}GENZ{0}/shp/cb_{0}_{1}_{2}_{3}.zip",
                r.year, r.state, r.geography, r.resolution
            ))
        },
    },
    Rule {
        matches: |r| r.cb,
        build: |r| {
            Err(Error::Validation(format!(
                "cartographic boundary data is only available for the years 1990, 2000, 2010, and 2012 onwards (year specified: {})",
                r.year
            )))
        },
    },
    // Full-resolution TIGER lines were never published for 1990.
    Rule {
        matches: |r| !r.cb && r.year == 1990,
        build: |_| {
            Err(Error::Validation(
                "request cartographic boundaries (cb) to get 1990 data".to_string(),
            ))
        },
    },
    // 2000 and 2010 both live under the TIGER2010 root, with the vintage
    // as a filename suffix.
    Rule {
        matches: |r| !r.cb && (r.year == 2000 || r.year == 2010),
        build: |r| {
            let yy = r.year % 100;
            Ok(format!(
                "{BASE_URL}TIGER2010/{}/{}/tl_2010_{}_{}{yy:02}.zip",
                r.geography.to_uppercase(),
                r.year,
                r.state,
                r.geography
            ))
        },
    },
    // 2008/2009: national files are flat, per-state files nest under a
    // directory named by the full state name.
    Rule {
        matches: |r| !r.cb && (r.year == 2008 || r.year == 2009),
        build: |r| {
            if r.state == "us" {
                return Ok(format!(
                    "{BASE_URL}TIGER{0}/tl_{0}_us_{1}.zip",
                    r.year, r.geography
                ));
            }
            let name = r.state_name.ok_or_else(|| {
                Error::Validation(format!("unknown state name for FIPS '{}'", r.state))
            })?;
            let dir_name = name.to_uppercase().replace(' ', "_");
            Ok(format!(
                "{BASE_URL}TIGER{0}/{1}_{dir_name}/tl_{0}_{1}_{2}00.zip",
                r.year, r.state, r.geography
            ))
        },
    },
    // 2011-2019 ZCTA files keep the ZCTA5 directory name, with the 2010
    // vintage encoded in the filename only.
    Rule {
        matches: |r| !r.cb && (2011..=2019).contains(&r.year) && r.geography == "zcta510",
        build: |r| {
            Ok(format!(
                "{BASE_URL}TIGER{0}/ZCTA5/tl_{0}_{1}_zcta510.zip",
                r.year, r.state
            ))
        },
    },
    Rule {
        matches: |r| !r.cb && r.year > 2010,
        build: |r| {
            Ok(format!(
                "{BASE_URL}TIGER{0}/{1}/tl_{0}_{2}_{3}.zip",
                r.year,
                r.geography.to_uppercase(),
                r.state,
                r.geography
            ))
        },
    },
    Rule {
        matches: |r| !r.cb,
        build: |r| {
            Err(Error::Validation(format!(
                "full-resolution TIGER/Line data is only available for the years 2000 and 2008 onwards (year specified: {})",
                r.year
            )))
        },
    },
];

/// Build the remote archive URL for a request, or fail with a validation
/// error when no archive was ever published for the combination.
pub fn construct_url(request: &UrlRequest<'_>) -> Result<String> {
    for rule in RULES {
        if (rule.matches)(request) {
            return (rule.build)(request);
        }
    }
    // The two fallback rules above match any year, so this is unreachable
    // for well-formed requests.
    Err(Error::Validation(format!(
        "no archive layout defined for year {} (cb: {})",
        request.year, request.cb
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(year: i32, geography: &'a str, cb: bool, state: &'a str) -> UrlRequest<'a> {
        UrlRequest {
            year,
            geography,
            cb,
            resolution: Resolution::R500k,
            state,
            state_name: None,
        }
    }

    #[test]
    fn resolution_parsing() {
        assert_eq!("500k".parse::<Resolution>().unwrap(), Resolution::R500k);
        assert_eq!("5m".parse::<Resolution>().unwrap(), Resolution::R5m);
        assert_eq!("20m".parse::<Resolution>().unwrap(), Resolution::R20m);
        assert!(matches!(
            "1m".parse::<Resolution>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn cb_legacy_years_use_prevgenz() {
        let url = construct_url(&request(1990, "state", true, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/PREVGENZ/st/st90shp/st99_d90_shp.zip"
        );

        let url = construct_url(&request(2000, "county", true, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/PREVGENZ/co/co00shp/co99_d00_shp.zip"
        );
    }

    #[test]
    fn cb_legacy_tract_encodes_state() {
        let url = construct_url(&request(2000, "tract", true, "25")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/PREVGENZ/tr/tr00shp/tr25_d00_shp.zip"
        );

        let url = construct_url(&request(1990, "bg", true, "35")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/PREVGENZ/bg/bg90shp/bg35_d90_shp.zip"
        );
    }

    #[test]
    fn cb_2010_uses_summary_level_codes() {
        let url = construct_url(&request(2010, "state", true, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/GENZ2010/gz_2010_us_040_00_500k.zip"
        );

        let url = construct_url(&request(2010, "tract", true, "35")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/GENZ2010/gz_2010_35_140_00_500k.zip"
        );

        let url = construct_url(&request(2010, "unsd", true, "35")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/GENZ2010/gz_2010_35_970_00_500k.zip"
        );
    }

    #[test]
    fn cb_2012_restricted_to_redistricting_types() {
        assert!(matches!(
            construct_url(&request(2012, "tract", true, "us")),
            Err(Error::Validation(_))
        ));

        let url = construct_url(&request(2012, "cd", true, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/GENZ2012/shp/cb_rd13_us_cd_500k.zip"
        );
    }

    #[test]
    fn cb_2013_and_later_layouts_differ_by_one_level() {
        let url = construct_url(&request(2013, "county", true, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/GENZ2013/cb_2013_us_county_500k.zip"
        );

        let url = construct_url(&request(2015, "county", true, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/GENZ2015/shp/cb_2015_us_county_500k.zip"
        );
    }

    #[test]
    fn cb_unsupported_years_fail() {
        for year in [1980, 1995, 2002, 2005, 2011] {
            assert!(matches!(
                construct_url(&request(year, "state", true, "us")),
                Err(Error::Validation(_))
            ));
        }
    }

    #[test]
    fn tiger_1990_fails() {
        assert!(matches!(
            construct_url(&request(1990, "state", false, "us")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn tiger_2000_and_2010_share_the_2010_root() {
        let url = construct_url(&request(2000, "tract", false, "35")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/TIGER2010/TRACT/2000/tl_2010_35_tract00.zip"
        );

        let url = construct_url(&request(2010, "county", false, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/TIGER2010/COUNTY/2010/tl_2010_us_county10.zip"
        );
    }

    #[test]
    fn tiger_2008_flat_for_national_nested_for_states() {
        let url = construct_url(&request(2008, "county", false, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/TIGER2008/tl_2008_us_county.zip"
        );

        let mut r = request(2009, "tract", false, "35");
        r.state_name = Some("New Mexico");
        assert_eq!(
            construct_url(&r).unwrap(),
            "https://www2.census.gov/geo/tiger/TIGER2009/35_NEW_MEXICO/tl_2009_35_tract00.zip"
        );
    }

    #[test]
    fn zcta_layouts() {
        let url = construct_url(&request(2010, "zcta", true, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/GENZ2010/gz_2010_us_860_00_500k.zip"
        );

        let url = construct_url(&request(2014, "zcta510", false, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/TIGER2014/ZCTA5/tl_2014_us_zcta510.zip"
        );

        let url = construct_url(&request(2000, "zcta5", false, "35")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/TIGER2010/ZCTA5/2000/tl_2010_35_zcta500.zip"
        );

        let url = construct_url(&request(2020, "zcta520", false, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/TIGER2020/ZCTA520/tl_2020_us_zcta520.zip"
        );
    }

    #[test]
    fn tiger_modern_layout() {
        let url = construct_url(&request(2020, "state", false, "us")).unwrap();
        assert_eq!(
            url,
            "https://www2.census.gov/geo/tiger/TIGER2020/STATE/tl_2020_us_state.zip"
        );
    }

    #[test]
    fn tiger_unsupported_years_fail() {
        for year in [1995, 2002, 2005] {
            assert!(matches!(
                construct_url(&request(year, "state", false, "us")),
                Err(Error::Validation(_))
            ));
        }
    }
}
