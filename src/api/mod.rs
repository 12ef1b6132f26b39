//! API layer
//!
//! HTTP handlers for:
//! - Users' comments query
//! - Metrics (Prometheus)

mod comments;
mod dto;
pub mod metrics;
mod params;

pub use dto::*;
pub use params::UsersCommentsParams;

pub use comments::comments_router;
pub use metrics::metrics_router;
