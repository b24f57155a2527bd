use std::collections::HashSet;
use serde::{Serialize, Deserialize};

use super::token::{Token, TokenKind};
use super::types::{ContainerId, ContainerMap, PoolId, SalesStaff, StaffType};

/// Display filter over the salespeople pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolFilter {
    #[default]
    All,
    New,
    Used,
}

impl PoolFilter {
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            PoolFilter::All => true,
            PoolFilter::New => token.staff_type() == Some(StaffType::New),
            PoolFilter::Used => token.staff_type() == Some(StaffType::Used),
        }
    }
}

/// Salespeople pool entries visible under `filter`. Never touches day slots.
pub fn filtered_pool<'a>(containers: &'a ContainerMap, filter: PoolFilter) -> Vec<&'a Token> {
    containers
        .pool(PoolId::Salespeople)
        .iter()
        .filter(|t| filter.matches(t))
        .collect()
}

/// Pool tokens for the staff directory, de-duplicated by base id
pub fn staff_pool_tokens(staff: &[SalesStaff]) -> Vec<Token> {
    let mut seen = HashSet::new();
    staff
        .iter()
        .filter(|s| !s.label().is_empty())
        .map(|s| Token::staff(s.label(), s.staff_type))
        .filter(|t| seen.insert(t.base_id()))
        .collect()
}

/// Rebuilds pool entries from an older stored `salespeople-list` when the
/// directory has no records. Only `new:`/`used:` tokens are carried over.
pub fn legacy_pool_tokens(stored: &ContainerMap) -> Vec<Token> {
    let mut seen = HashSet::new();
    stored
        .pool(PoolId::Salespeople)
        .iter()
        .filter(|t| matches!(t.kind(), TokenKind::Staff { .. }))
        .map(|t| t.without_stamp())
        .filter(|t| seen.insert(t.base_id()))
        .collect()
}

pub fn special_pool_tokens(labels: &[String]) -> Vec<Token> {
    labels
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(Token::special)
        .collect()
}

/// Fills the catalog region of `containers`: staff from the directory (or the
/// legacy fallback), special labels from configuration.
pub fn seed_pools(containers: &mut ContainerMap, staff: &[SalesStaff], special_labels: &[String]) {
    let salespeople = if staff.is_empty() {
        legacy_pool_tokens(containers)
    } else {
        staff_pool_tokens(staff)
    };
    containers.set(ContainerId::Pool(PoolId::Salespeople), salespeople);
    containers.set(ContainerId::Pool(PoolId::SpecialLabels), special_pool_tokens(special_labels));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff(name: &str, staff_type: StaffType) -> SalesStaff {
        SalesStaff { name: name.to_string(), staff_type, display_name: String::new() }
    }

    #[test]
    fn filter_only_looks_at_the_salespeople_pool() {
        let mut containers = ContainerMap::new();
        seed_pools(
            &mut containers,
            &[staff("Gio", StaffType::New), staff("Ana", StaffType::Used)],
            &["Closed".to_string()],
        );
        containers.set(ContainerId::slot(5, 0), vec![Token::parse("used:Ana::1")]);

        let new_only: Vec<String> = filtered_pool(&containers, PoolFilter::New).iter().map(|t| t.to_string()).collect();
        assert_eq!(new_only, vec!["new:Gio"]);
        assert_eq!(filtered_pool(&containers, PoolFilter::All).len(), 2);
        assert_eq!(containers.slot(5, 0).len(), 1);
    }

    #[test]
    fn legacy_fallback_reads_prefixed_stored_entries() {
        let mut containers = ContainerMap::new();
        containers.set(
            ContainerId::Pool(PoolId::Salespeople),
            vec![
                Token::parse("new:Gio"),
                Token::parse("used:Ana::5"),
                Token::parse("Bob"),
                Token::parse("new:Gio::9"),
            ],
        );
        seed_pools(&mut containers, &[], &[]);

        let pool: Vec<String> = containers.pool(PoolId::Salespeople).iter().map(|t| t.to_string()).collect();
        assert_eq!(pool, vec!["new:Gio", "used:Ana"]);
        assert!(containers.pool(PoolId::SpecialLabels).is_empty());
    }

    #[test]
    fn directory_records_replace_stored_pool() {
        let mut containers = ContainerMap::new();
        containers.set(ContainerId::Pool(PoolId::Salespeople), vec![Token::parse("new:Former")]);
        seed_pools(&mut containers, &[staff("Gio", StaffType::New), staff("Gio", StaffType::New)], &[]);

        let pool: Vec<String> = containers.pool(PoolId::Salespeople).iter().map(|t| t.to_string()).collect();
        assert_eq!(pool, vec!["new:Gio"]);
    }
}
