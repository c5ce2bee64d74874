//! Seed communities and groups
//!
//! Membership is assigned by slicing the global user range: community N owns
//! a window of users starting at `(N - 1) * communities + 1`, and group M of
//! a community owns a window of that community's members. Windows that would
//! run past the end of the range are pulled back so they stay full, which
//! means tail communities and groups share members.

use crate::users::{SeedUser, UserSeeder};
use stampede_config::SeedConfig;

/// One seeded community with its owner and membership
#[derive(Debug, Clone)]
pub struct SeedCommunity {
    pub number: u32,
    pub name: String,
    pub owner: SeedUser,
    pub admins: Vec<SeedUser>,
    pub members: Vec<SeedUser>,
}

/// One seeded group inside a community
#[derive(Debug, Clone)]
pub struct SeedGroup {
    pub number: u32,
    pub name: String,
    pub admins: Vec<SeedUser>,
    pub members: Vec<SeedUser>,
}

impl SeedCommunity {
    /// Community name for an index
    pub fn community_name(config: &SeedConfig, number: u32) -> String {
        format!("{} {}", config.community_name_prefix, number)
    }

    /// Deterministic membership of community `number`
    ///
    /// User `number` owns the community. Admins are the head of the member
    /// window.
    pub fn generate(seeder: &UserSeeder, number: u32) -> Self {
        let config = seeder.config();
        let first = (number - 1) * config.communities + 1;
        let last = first + config.community_members - 1;

        let (first, last) = if last <= config.users {
            (first, last)
        } else {
            (
                config.users.saturating_sub(config.community_members) + 1,
                config.users,
            )
        };

        let members: Vec<SeedUser> = (first..=last).map(|n| seeder.user(n)).collect();
        let admins = members
            .iter()
            .take(config.community_admins as usize)
            .cloned()
            .collect();

        Self {
            number,
            name: Self::community_name(config, number),
            owner: seeder.user(number),
            admins,
            members,
        }
    }
}

impl SeedGroup {
    /// Group name for an index
    pub fn group_name(config: &SeedConfig, number: u32) -> String {
        format!("{} {}", config.group_name_prefix, number)
    }

    /// Deterministic membership of group `number` inside community
    /// `community_number`
    pub fn generate(seeder: &UserSeeder, community_number: u32, group_number: u32) -> Self {
        let config = seeder.config();
        let community = SeedCommunity::generate(seeder, community_number);

        let first_member = (group_number - 1) * config.group_members + 1;
        let last_member = first_member + config.group_members - 1;

        // Zero-based window into the community member list
        let (start, end) = if last_member <= config.community_members {
            (first_member - 1, last_member - 1)
        } else {
            (
                config.community_members.saturating_sub(config.group_members),
                config.community_members - 1,
            )
        };

        let start = (start as usize).min(community.members.len());
        let end = (end as usize + 1).min(community.members.len());
        let members = community.members[start..end].to_vec();
        let admins = members
            .iter()
            .take(config.group_admins as usize)
            .cloned()
            .collect();

        Self {
            number: group_number,
            name: Self::group_name(config, group_number),
            admins,
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeder() -> UserSeeder {
        UserSeeder::new(SeedConfig::default(), "1$orMore")
    }

    fn usernames(users: &[SeedUser]) -> Vec<&str> {
        users.iter().map(|u| u.username.as_str()).collect()
    }

    #[test]
    fn test_first_community_takes_the_head_of_the_range() {
        let community = SeedCommunity::generate(&seeder(), 1);
        assert_eq!(community.name, "Load Test Community 1");
        assert_eq!(community.owner.username, "loaduser1");
        assert_eq!(community.members.len(), 300);
        assert_eq!(community.members[0].username, "loaduser1");
        assert_eq!(community.members[299].username, "loaduser300");
        assert_eq!(
            usernames(&community.admins),
            vec!["loaduser1", "loaduser2", "loaduser3", "loaduser4", "loaduser5"]
        );
    }

    #[test]
    fn test_community_windows_stride_by_community_count() {
        let community = SeedCommunity::generate(&seeder(), 2);
        assert_eq!(community.members[0].username, "loaduser501");
        assert_eq!(community.members[299].username, "loaduser800");
        assert_eq!(community.owner.username, "loaduser2");
    }

    #[test]
    fn test_tail_community_window_is_pulled_back() {
        // Community 21 would start at user 10001; the window snaps to the
        // last 300 users instead
        let community = SeedCommunity::generate(&seeder(), 21);
        assert_eq!(community.members.len(), 300);
        assert_eq!(community.members[0].username, "loaduser9701");
        assert_eq!(community.members[299].username, "loaduser10000");
    }

    #[test]
    fn test_first_group_takes_the_head_of_community_members() {
        let group = SeedGroup::generate(&seeder(), 1, 1);
        assert_eq!(group.name, "Load Test Group 1");
        assert_eq!(group.members.len(), 100);
        assert_eq!(group.members[0].username, "loaduser1");
        assert_eq!(group.members[99].username, "loaduser100");
        assert_eq!(group.admins.len(), 10);
        assert_eq!(group.admins[9].username, "loaduser10");
    }

    #[test]
    fn test_last_full_group_window() {
        let group = SeedGroup::generate(&seeder(), 1, 3);
        assert_eq!(group.members[0].username, "loaduser201");
        assert_eq!(group.members[99].username, "loaduser300");
    }

    #[test]
    fn test_overflowing_group_reuses_the_tail_window() {
        // Community members run out after group 3; later groups all land on
        // the last full window
        let group_4 = SeedGroup::generate(&seeder(), 1, 4);
        let group_3 = SeedGroup::generate(&seeder(), 1, 3);
        assert_eq!(usernames(&group_4.members), usernames(&group_3.members));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = SeedCommunity::generate(&seeder(), 7);
        let b = SeedCommunity::generate(&seeder(), 7);
        assert_eq!(usernames(&a.members), usernames(&b.members));
        assert_eq!(a.members[0].fullname, b.members[0].fullname);
    }
}
