//! wirebench - Protocol Inference Workbench Client
//!
//! Client-side orchestration layer for a protocol-reverse-engineering
//! backend: a typed REST client over the backend's resource tree, plus the
//! synchronization logic that keeps navigation lists and a job-progress
//! value consistent with server state across asynchronous round trips.
//!
//! The backend owns all records and all inference; this crate only invokes
//! operations and consumes their results.

// Wire records shared by every layer
pub mod models;

// Declarative endpoint tree -> validated URL builders
pub mod endpoint;

// HTTP dispatch behind a swappable trait
pub mod transport;

// The configured gateway instance
pub mod client;

// One named operation per domain intent
pub mod actions;

// Navigation-list synchronization
pub mod nav;

// Progress indicator for long-running jobs
pub mod progress;

// CLI configuration
pub mod config;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::{CliArgs, Config};
pub use models::{Capture, CellGrid, Message, NewMessage, Page, PcapLayer, Symbol};
pub use nav::{NavEntry, NavSync};
pub use progress::JobProgress;
pub use transport::{ApiError, Transport};
