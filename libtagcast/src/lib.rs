//! Tagcast - republish newly tagged Q&A questions to social media
//!
//! This library provides the polling loop that searches a Stack Exchange site
//! for freshly tagged questions and posts each one exactly once to a
//! downstream platform, respecting rate limits on both sides.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod message;
pub mod platforms;
pub mod posted;
pub mod publisher;
pub mod sources;
pub mod types;
pub mod watermark;

// Re-export commonly used types
pub use config::{Config, DeliveryMode};
pub use credentials::Credentials;
pub use error::{Result, TagcastError};
pub use posted::PostedSet;
pub use publisher::{CycleReport, PublisherLoop};
pub use types::{CandidateItem, FetchOutcome, PublishableMessage};
pub use watermark::Watermark;
