//! # ai-router
//!
//! Capability-based request router for multiple AI providers.
//!
//! The router accepts typed task requests and picks the best provider for
//! each one, layering rate limiting, request deduplication, response caching
//! and ordered fallback around a pluggable HTTP transport.
//!
//! ## Overview
//!
//! - **Capability matching**: a task kind plus context hints produce an
//!   ordered candidate list; an explicit provider override bypasses matching.
//! - **Resilience**: per-provider fixed-window rate limiting and an ordered
//!   fallback chain that tries each candidate at most once.
//! - **Efficiency**: concurrent identical requests collapse into a single
//!   upstream execution, and opt-in TTL caching serves repeat requests
//!   without network traffic.
//! - **Observability**: fire-and-forget usage telemetry after every settled
//!   attempt, through a pluggable [`TelemetrySink`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_router::{AiRouter, HttpTransport, Request, TaskKind};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ai_router::Result<()> {
//!     let transport = HttpTransport::new("https://api.openai.com")?;
//!     let router = AiRouter::builder()
//!         .with_transport(Arc::new(transport))
//!         .build()?;
//!
//!     let response = router
//!         .request(Request::new(TaskKind::Question, "What is Rust?"))
//!         .await?;
//!     println!("{} answered: {}", response.provider, response.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`router`] | Router composition, builder and batch execution |
//! | [`catalog`] | Static provider registry (models, budgets, capabilities) |
//! | [`matcher`] | Capability matching and availability probing |
//! | [`adapters`] | Per-API-style payload shaping and content extraction |
//! | [`executor`] | Single-attempt execution, normalization and pricing |
//! | [`transport`] | Pluggable HTTP boundary with the stock reqwest impl |
//! | [`resilience`] | Per-provider rate limiting |
//! | [`dedupe`] | Single-flight collapsing of identical requests |
//! | [`cache`] | TTL response cache with background sweeping |
//! | [`telemetry`] | Usage event sinks |
//! | [`types`] | Request and response types |

pub mod adapters;
pub mod cache;
pub mod catalog;
pub mod dedupe;
pub mod executor;
pub mod matcher;
pub mod resilience;
pub mod router;
pub mod telemetry;
pub mod transport;
pub mod types;

pub mod error;

// Re-export the main surface for convenience
pub use catalog::{ApiStyle, ProviderCatalog, ProviderId, ProviderProfile};
pub use error::{Error, ProviderFailure};
pub use matcher::{AvailabilityProbe, EnvProbe, StaticProbe};
pub use router::{AiRouter, AiRouterBuilder};
pub use telemetry::{TelemetrySink, UsageEvent};
pub use transport::{HttpTransport, Transport, TransportError, TransportOptions};
pub use types::{Hint, Priority, Request, Response, TaskKind};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
