// Weigh-In - Weight-Loss Contest Registry
// Exposes all modules for use in CLI, API server, and tests

pub mod calculator;  // Age / weight-lost / percentage-lost, external or local
pub mod commands;    // Raw input -> registry call -> JSON-shaped response
pub mod config;
pub mod contestant;
pub mod error;
pub mod rankings;
pub mod registry;
pub mod store;       // Whole-snapshot JSON persistence

// Re-export commonly used types
pub use calculator::{
    Calculations, Calculator, LocalCalculator, ProcessCalculator,
    age_on, percentage_lost, weight_lost,
};
pub use commands::{Command, Response, dispatch, execute};
pub use config::{Config, Overrides};
pub use contestant::{ContestantRecord, ContestantView, parse_date_of_birth, parse_weight};
pub use error::{RegistryError, RegistryResult, StoreError};
pub use rankings::{Leaderboard, RankedContestant, NO_CONTESTANTS};
pub use registry::{ContestantEdit, ContestantRegistry};
pub use store::{FlatStore, JsonFileStore, MemoryStore, Snapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
