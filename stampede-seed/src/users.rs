//! Seed users
//!
//! User N is fully determined by N and the seed config: username
//! `{prefix}{N}`, a display name derived from N through a seeded generator,
//! email at the configured domain and the shared default password. No state
//! is kept; any process can name any user.

use serde::Serialize;
use stampede_config::SeedConfig;

/// Length of the generated part of a display name
const DISPLAY_NAME_LEN: usize = 8;

/// One seeded account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedUser {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
}

/// Generator for seed users
#[derive(Debug, Clone)]
pub struct UserSeeder {
    config: SeedConfig,
    password: String,
}

impl UserSeeder {
    pub fn new(config: SeedConfig, password: impl Into<String>) -> Self {
        Self {
            config,
            password: password.into(),
        }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Username of user N
    pub fn username(&self, number: u32) -> String {
        format!("{}{}", self.config.username_prefix, number)
    }

    /// Full seed record of user N
    pub fn user(&self, number: u32) -> SeedUser {
        self.named(self.username(number), display_name(number))
    }

    /// Seed record for an externally supplied username
    ///
    /// The display name is derived from the username so repeated calls agree.
    pub fn user_from_username(&self, username: &str) -> SeedUser {
        let seed = username.bytes().fold(0u64, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(u64::from(b))
        });
        self.named(username.to_string(), display_name_from_seed(seed))
    }

    fn named(&self, username: String, name: String) -> SeedUser {
        SeedUser {
            email: format!("{}@{}", username, self.config.email_domain),
            fullname: format!("{} {}", self.config.full_name_prefix, name),
            username,
            password: self.password.clone(),
        }
    }
}

fn display_name(number: u32) -> String {
    display_name_from_seed(u64::from(number))
}

fn display_name_from_seed(seed: u64) -> String {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut name: String = (0..DISPLAY_NAME_LEN).map(|_| rng.lowercase()).collect();
    if let Some(first) = name.get(0..1) {
        let upper = first.to_ascii_uppercase();
        name.replace_range(0..1, &upper);
    }
    name
}
