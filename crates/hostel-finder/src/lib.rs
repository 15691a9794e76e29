//! Core building blocks for a hostel rental marketplace backend: the
//! geo-radius search pipeline, engagement analytics, and the listing
//! verification workflow, each behind storage traits so the services can be
//! exercised in isolation.

pub mod catalog;
pub mod config;
pub mod engagement;
pub mod error;
pub mod identity;
pub mod moderation;
pub mod search;
pub mod telemetry;
