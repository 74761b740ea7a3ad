//! Resilience primitives: per-provider rate limiting.

pub mod rate_limiter;

pub use rate_limiter::RateLimiter;
