//! Engagement analytics: per-listing counters and summaries, plus the
//! favorites, reviews, and interaction logs that feed them.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    DailyCounters, EngagementSummary, Favorite, Interaction, InteractionKind, Metric, Review,
    ReviewId, SummaryPeriod, TotalCounters,
};
pub use repository::{AnalyticsRepository, EngagementStore};
pub use router::{engagement_router, EngagementRoutes};
pub use service::{
    AnalyticsOverview, AnalyticsService, EngagementError, EngagementService, ReviewsView,
};
