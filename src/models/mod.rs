//! Domain models for the PrompIP backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the prompt marketplace.

pub mod license;
pub mod prompt;
pub mod user;
pub mod verification;

// Re-export all models for convenient access
pub use license::License;
pub use prompt::{NewPrompt, Prompt, PromptSummary, PromptWithCreator};
pub use user::{CreatorRank, User, UserSummary};
pub use verification::Verification;
