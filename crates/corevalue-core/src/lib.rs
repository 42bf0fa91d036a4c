#![forbid(unsafe_code)]
//! corevalue-core library.
//!
//! Accumulates pairwise "beats" relationships between a fixed set of values
//! and derives a global ranking from them.
//!
//! ## Pipeline
//!
//! ```text
//! ValueSet (*.values)          Session file (.*.session)
//!        ↓ names()                    ↓ session::load()
//!        └──────────→ PreferenceGraph ←┘
//!                         ↓ add_edge() per comparison outcome
//!                         ↓ session::save()
//!                 ranking::degree_ranking()
//!                 TransitiveAnalysis::compute()  (scores + cycles)
//!                         ↓
//!                     report::Report
//! ```
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for graph, session and value-set
//!   failures; `anyhow::Result` for config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod cycles;
pub mod dot;
pub mod error;
pub mod graph;
pub mod ranking;
pub mod report;
pub mod session;
pub mod values;

pub use error::{ErrorCode, GraphError};
pub use graph::PreferenceGraph;
pub use ranking::{RankingMode, TransitiveAnalysis};
pub use report::Report;
pub use values::ValueSet;
