//! HTTP retrieval of zipped shapefile archives.

use std::io::{Read, Write};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::error::{Error, Result};
use crate::frame::{normalize, shp, GeoFrame};

/// Time allowed to establish a connection.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Time allowed for a whole download. National TIGER/Line archives run to
/// hundreds of megabytes, so this is much longer than a typical API call.
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Emit a progress line roughly every this many bytes.
const PROGRESS_INTERVAL_BYTES: u64 = 8 * 1024 * 1024;

const USER_AGENT: &str = concat!("tigris/", env!("CARGO_PKG_VERSION"));

/// Per-request retrieval knobs.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Re-download even when a cached copy exists.
    pub refresh: bool,
    /// Keep the downloaded archive on disk. When false the archive lives
    /// in a temp file only as long as it takes to decode it.
    pub use_cache: bool,
    /// Log download progress.
    pub progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            refresh: false,
            use_cache: true,
            progress: false,
        }
    }
}

/// Downloads archives and decodes them into frames.
pub struct Fetcher {
    client: Client,
    cache: CacheManager,
}

impl Fetcher {
    pub fn new(cache: CacheManager) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, cache })
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Fetch the archive at `url` and decode it into a normalized frame.
    ///
    /// The archive is keyed in the cache by the last path segment of the
    /// URL. A cached copy short-circuits the network entirely unless
    /// `refresh` is set.
    pub fn load(&self, url: &str, options: LoadOptions) -> Result<GeoFrame> {
        let file_name = url.rsplit('/').next().unwrap_or(url);

        if options.use_cache && !options.refresh {
            if let Some(path) = self.cache.lookup(file_name) {
                let mut frame = shp::read(&path)?;
                normalize(&mut frame);
                return Ok(frame);
            }
        }

        info!(url, "downloading archive");
        let mut response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(Error::from_status(url, response.status()));
        }

        let mut frame = if options.use_cache {
            let mut staged = self.cache.begin_write()?;
            copy_body(&mut response, &mut staged, options.progress)?;
            let path = self.cache.commit(staged, file_name)?;
            shp::read(&path)?
        } else {
            let mut scratch = tempfile::NamedTempFile::new()?;
            copy_body(&mut response, &mut scratch, options.progress)?;
            shp::read(scratch.path())?
        };

        normalize(&mut frame);
        Ok(frame)
    }
}

fn copy_body<W: Write>(response: &mut Response, dest: &mut W, progress: bool) -> Result<u64> {
    let total = response.content_length();
    let mut buf = [0u8; 64 * 1024];
    let mut written = 0u64;
    let mut last_logged = 0u64;
    loop {
        let n = response.read(&mut buf)?;
        if n == 0 {
            break;
        }
        dest.write_all(&buf[..n])?;
        written += n as u64;
        if progress && written - last_logged >= PROGRESS_INTERVAL_BYTES {
            info!(received = written, total, "download in progress");
            last_logged = written;
        }
    }
    debug!(bytes = written, "download complete");
    Ok(written)
}
