//! Subject selection
//!
//! Virtual users act as members of the seeded universe. Each iteration picks
//! a random group and impersonates one of the users near the head of its
//! member window, the same slice the provisioning flows promote to admins.

use stampede_config::SeedConfig;
use stampede_seed::{SeedGroup, UserSeeder};

/// One simulated identity bound for an iteration
#[derive(Debug, Clone)]
pub struct SeedSubject {
    pub username: String,
    pub community_name: String,
    pub group_name: String,
}

/// Draws subjects out of the deterministic seed universe
pub struct SubjectPool {
    seeder: UserSeeder,
}

impl SubjectPool {
    pub fn new(seed: SeedConfig, password: impl Into<String>) -> Self {
        Self {
            seeder: UserSeeder::new(seed, password),
        }
    }

    /// The seed generator backing this pool
    pub fn seeder(&self) -> &UserSeeder {
        &self.seeder
    }

    /// Pick a random member of a random group
    pub fn pick(&self, rng: &mut fastrand::Rng) -> SeedSubject {
        let config = self.seeder.config();
        let community_number = rng.u32(1..=config.communities.max(1));
        let group_number = rng.u32(1..=config.groups_per_community.max(1));

        let group = SeedGroup::generate(&self.seeder, community_number, group_number);

        let upper = group
            .admins
            .len()
            .saturating_sub(1)
            .min(group.members.len().saturating_sub(1));
        let index = if upper == 0 { 0 } else { rng.usize(1..=upper) };

        SeedSubject {
            username: group.members[index].username.clone(),
            community_name: format!(
                "{} {}",
                config.community_name_prefix, community_number
            ),
            group_name: group.name.clone(),
        }
    }
}
