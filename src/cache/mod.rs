//! Local archive cache.
//!
//! Downloaded zip archives are kept on disk keyed by their remote file
//! name, so repeated requests for the same geography and vintage never
//! touch the network. `CacheManager` owns the directory and the atomic
//! write discipline.

pub mod manager;

pub use manager::CacheManager;
