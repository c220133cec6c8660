//! Authentication module for bloodboard server
//!
//! Opaque bearer tokens backed by the in-memory session registry: issuing
//! them on login, rotating them on refresh, resolving them per request and
//! sweeping expired ones in the background.

pub mod authenticator;
pub mod handlers;
pub mod middleware;
mod rate_limit;
mod service;
pub mod sweeper;

pub use authenticator::Authenticator;
pub use middleware::{bearer_token, AuthenticatedUser};
pub use rate_limit::{RateLimiter, RateLimitConfig};
pub use service::AuthService;
pub use sweeper::{run_sweep_loop, watch_sweeper, SweeperExit};
