//! Seed-data configuration
//!
//! Counts and prefixes that drive the deterministic seed generators. The
//! shape of the dataset (which user belongs to which community and group)
//! follows from these numbers alone, so two runs with the same config
//! produce the same universe.

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Seed-data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Username prefix; user N is `{prefix}{N}`
    #[serde(default = "default_username_prefix")]
    pub username_prefix: String,

    /// Display-name prefix
    #[serde(default = "default_full_name_prefix")]
    pub full_name_prefix: String,

    /// Email domain for seeded accounts
    #[serde(default = "default_email_domain")]
    pub email_domain: String,

    /// Total seeded users
    #[serde(default = "default_users")]
    pub users: u32,

    /// Community name prefix; community N is `{prefix} {N}`
    #[serde(default = "default_community_name_prefix")]
    pub community_name_prefix: String,

    /// Total seeded communities
    #[serde(default = "default_communities")]
    pub communities: u32,

    /// Admins per community (taken from the head of the member range)
    #[serde(default = "default_community_admins")]
    pub community_admins: u32,

    /// Members per community
    #[serde(default = "default_community_members")]
    pub community_members: u32,

    /// Group name prefix; group M is `{prefix} {M}`
    #[serde(default = "default_group_name_prefix")]
    pub group_name_prefix: String,

    /// Groups per community
    #[serde(default = "default_groups_per_community")]
    pub groups_per_community: u32,

    /// Admins per group
    #[serde(default = "default_group_admins")]
    pub group_admins: u32,

    /// Members per group
    #[serde(default = "default_group_members")]
    pub group_members: u32,

    /// Draft posts published per member during content provisioning
    #[serde(default = "default_contents_per_member")]
    pub contents_per_member: u32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            username_prefix: default_username_prefix(),
            full_name_prefix: default_full_name_prefix(),
            email_domain: default_email_domain(),
            users: default_users(),
            community_name_prefix: default_community_name_prefix(),
            communities: default_communities(),
            community_admins: default_community_admins(),
            community_members: default_community_members(),
            group_name_prefix: default_group_name_prefix(),
            groups_per_community: default_groups_per_community(),
            group_admins: default_group_admins(),
            group_members: default_group_members(),
            contents_per_member: default_contents_per_member(),
        }
    }
}

impl Validatable for SeedConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.username_prefix, "username_prefix", self.domain_name())?;
        validate_required_string(&self.email_domain, "email_domain", self.domain_name())?;
        validate_positive(self.users, "users", self.domain_name())?;
        validate_positive(self.communities, "communities", self.domain_name())?;
        validate_positive(self.community_members, "community_members", self.domain_name())?;
        validate_positive(self.group_members, "group_members", self.domain_name())?;

        if self.community_admins > self.community_members {
            return Err(self.validation_error(format!(
                "community_admins ({}) cannot exceed community_members ({})",
                self.community_admins, self.community_members
            )));
        }

        if self.group_admins > self.group_members {
            return Err(self.validation_error(format!(
                "group_admins ({}) cannot exceed group_members ({})",
                self.group_admins, self.group_members
            )));
        }

        if self.group_members > self.community_members {
            return Err(self.validation_error(format!(
                "group_members ({}) cannot exceed community_members ({})",
                self.group_members, self.community_members
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "seed"
    }
}

// Default value functions
fn default_username_prefix() -> String {
    "loaduser".to_string()
}

fn default_full_name_prefix() -> String {
    "Load Test User".to_string()
}

fn default_email_domain() -> String {
    "load.test".to_string()
}

fn default_users() -> u32 {
    10_000
}

fn default_community_name_prefix() -> String {
    "Load Test Community".to_string()
}

fn default_communities() -> u32 {
    500
}

fn default_community_admins() -> u32 {
    5
}

fn default_community_members() -> u32 {
    300
}

fn default_group_name_prefix() -> String {
    "Load Test Group".to_string()
}

fn default_groups_per_community() -> u32 {
    100
}

fn default_group_admins() -> u32 {
    10
}

fn default_group_members() -> u32 {
    100
}

fn default_contents_per_member() -> u32 {
    10
}
