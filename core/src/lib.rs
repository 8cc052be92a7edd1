//! Synchronous client core for the amoCRM v4 API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and finds the last page of
//! any listing in O(log n) requests even though the API never reports a
//! total.
//!
//! # Design
//! - `CrmClient` is stateless: a `base_url` and an optional token.
//! - Listings are split into `build_list` and `parse_list`, so the I/O
//!   boundary is explicit.
//! - `pagination` knows nothing about HTTP. It consumes a `Probe`
//!   (`page -> has data`) and returns a page count; `CrmClient::page_probe`
//!   and `links_probe` build probes from listing calls.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod types;

pub use client::CrmClient;
pub use config::{ClientConfig, DEFAULT_CEILING};
pub use error::{ApiError, ConfigError, SearchError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pagination::adapter::PageProbe;
pub use pagination::{
    links_probe, BoundaryFinder, CancelToken, ConcurrentFinder, LinksProbe, Probe, SequentialFinder,
};
pub use types::{EntityKind, EntityRef, FieldValue, Link, Links, ListFilter, ListPage};
