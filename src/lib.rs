//! Market insights feed ingestion.
//!
//! Fetches RSS 2.0, Atom and RDF feeds, normalizes them into a uniform
//! [`FeedDocument`](feed::FeedDocument) of sanitized articles, and caches
//! the result with a TTL.

pub mod analytics;
pub mod config;
pub mod feed;
pub mod service;
pub mod storage;
pub mod util;
