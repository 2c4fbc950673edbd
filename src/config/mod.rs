//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)                option functions
//!     → loader.rs (parse)               → options.rs (apply in order)
//!     → validation.rs (semantic checks)       │
//!     → Settings.dispatcher ──────────────────┘
//!     → Options (validated, immutable)
//!     → owned by the Dispatcher
//! ```
//!
//! # Design Decisions
//! - Options are immutable once the dispatcher is built; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use options::OptionFn;
pub use schema::{Options, Settings};
