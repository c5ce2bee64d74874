//! Deterministic seed data for Stampede
//!
//! The load universe (which user owns which community, who is a member of
//! which group) is never stored; it is recomputed from the seed counts in
//! configuration. Two processes with the same config therefore agree on
//! every username, membership range and community name without coordination.
//!
//! The only on-disk artifacts are CSV exports: the account roster consumed
//! by identity-pool imports, and the quiz tables consumed by a database
//! import during quiz provisioning.

pub mod content;
pub mod errors;
pub mod export;
pub mod groups;
pub mod quiz;
pub mod users;

// Re-export main types
pub use errors::{SeedError, SeedResult};
pub use groups::{SeedCommunity, SeedGroup};
pub use quiz::{PublishedQuiz, SeedAnswer, SeedQuestion, SeedQuiz};
pub use users::{SeedUser, UserSeeder};
