use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad request parameters: invalid resolution, unsupported year/flag
    /// combination, availability restrictions. Raised before any network
    /// activity and never retried.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A state or county token could not be resolved to a FIPS code, or
    /// resolved ambiguously. Ambiguous errors list every candidate.
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// The remote archive could not be retrieved.
    #[error("Request to {url} returned status {status}")]
    Retrieval { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid shapefile: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("Invalid attribute table: {0}")]
    Dbase(#[from] shapefile::dbase::Error),

    #[error("Invalid reference table: {0}")]
    Table(#[from] csv::Error),

    /// A shape could not be represented as a supported geometry.
    #[error("Unsupported geometry: {0}")]
    Geometry(String),

    /// The archive was readable but did not contain a usable shapefile.
    #[error("Malformed archive: {0}")]
    Malformed(String),
}

impl Error {
    /// Build a retrieval error from a non-success HTTP response, surfacing
    /// the URL so the caller can see exactly what was requested.
    pub(crate) fn from_status(url: &str, status: reqwest::StatusCode) -> Self {
        Error::Retrieval {
            url: url.to_string(),
            status: status.as_u16(),
        }
    }
}
