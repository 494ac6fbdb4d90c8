//! Doubt Resolution Agent
//!
//! Answers student doubts for the Manan platform. A question goes through
//! an ordered policy: exam-mode gate, keyword override, fuzzy-matched canned
//! answer, then a single call to a generative model.
//!
//! # Design Principles
//! - Total: `/solve-doubt` always answers 200, failures are described in the answer text
//! - Injected collaborators: document store, model client and credentials are traits
//! - Fail-open gate: an unreadable exam-mode flag counts as off
//! - Static catalog: canned answers are configuration, loaded once
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use doubt_resolution::client::{EnvCredentials, GeminiClient, GeminiConfig, InMemoryStore};
//! use doubt_resolution::contracts::IncomingQuestion;
//! use doubt_resolution::engine::{CannedCatalog, DoubtResolver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = DoubtResolver::new(
//!         Arc::new(InMemoryStore::new()),
//!         Arc::new(GeminiClient::new(GeminiConfig::default())?),
//!         Arc::new(EnvCredentials::default()),
//!         Arc::new(CannedCatalog::embedded()?),
//!     );
//!
//!     let result = resolver
//!         .resolve(&IncomingQuestion::new("student_1", "Help me understand recursion"))
//!         .await;
//!     println!("{}", result.answer_text);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod settings;
pub mod telemetry;

#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use config::AgentConfig;
pub use engine::{DoubtResolver, ResolverOptions};
pub use error::{AgentError, Result};
pub use handler::{create_router, AppState};

/// Agent version (from Cargo.toml)
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Agent identifier
pub const AGENT_ID: &str = "doubt-resolution-agent";
