//! Local seed data generation

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use stampede_config::StampedeConfig;
use stampede_seed::export::write_roster;
use stampede_seed::{SeedUser, UserSeeder};

/// Write the seed user roster as a CSV file
pub fn export(config: &StampedeConfig, out: &Path, count: Option<u32>) -> Result<()> {
    let seeder = UserSeeder::new(
        config.seed.clone(),
        config.identity.default_password.clone(),
    );
    let count = count.unwrap_or(config.seed.users);
    let users: Vec<SeedUser> = (1..=count).map(|n| seeder.user(n)).collect();

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    write_roster(out, &users).context("Failed to write the user roster")?;

    println!(
        "{}",
        format!("Wrote {} users to {}", users.len(), out.display()).green()
    );
    Ok(())
}
