//! Archive retrieval.
//!
//! The fetcher downloads zipped shapefiles over HTTPS, stores them through
//! the cache, and decodes them into normalized frames.

pub mod client;

pub use client::{Fetcher, LoadOptions};
