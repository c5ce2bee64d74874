//! Seed crate errors

use thiserror::Error;

pub type SeedResult<T> = Result<T, SeedError>;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
