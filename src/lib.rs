//! Trailquest - points, achievements and rewards for travel routes
//!
//! Travellers earn points by completing routes, route challenges and path
//! tasks. Points unlock achievements, raise the traveller's level and can be
//! spent on catalog rewards. Every point movement goes through the ledger,
//! so balances never go negative and no completion pays twice.
//!
//! ## Surfaces
//!
//! 1. **Library**: [`engine::Engine`] exposes the progression operations
//!    directly.
//!
//! 2. **HTTP**: [`server::start_http_server`] serves the same operations as
//!    a JSON API under `/api`.

pub mod advisory;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod server;

pub use domain::*;
pub use engine::{Engine, RewardSettings};
pub use error::{EngineError, EngineResult};
