//! Geo-radius search and ranking pipeline.

pub mod domain;
pub mod geo;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    RankedResults, RawSearchParams, RoomMatch, SearchQuery, SearchRecord, MAX_RADIUS_KM,
    MIN_RADIUS_KM,
};
pub use router::{search_router, SearchRoutes};
pub use service::{SearchError, SearchEventSink, SearchService};
