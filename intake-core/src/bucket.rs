//! Size range → bucket decision table.
//!
//! Rules are evaluated top-to-bottom and the first matching predicate wins.
//! `min_size` is consulted before any `max_size` rule, so a company whose
//! minimum headcount is already 1000 lands in `1000+` even when the
//! recorded maximum is inconsistent.

use crate::types::SizeBucket;

/// Headcount range as recorded by the directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeRange {
    pub min_size: i64,
    pub max_size: i64,
}

pub type Rule = (fn(&SizeRange) -> bool, SizeBucket);

pub const SIZE_RULES: [Rule; 6] = [
    (|r| r.min_size >= 1000, SizeBucket::Enterprise),
    (|r| r.max_size <= 10, SizeBucket::Micro),
    (|r| r.max_size <= 50, SizeBucket::Small),
    (|r| r.max_size <= 200, SizeBucket::Medium),
    (|r| r.max_size <= 1000, SizeBucket::Large),
    (|_| true, SizeBucket::Enterprise),
];

/// Map a `(min_size, max_size)` pair onto exactly one bucket.
pub fn bucket_for(min_size: i64, max_size: i64) -> SizeBucket {
    let range = SizeRange { min_size, max_size };
    SIZE_RULES
        .iter()
        .find(|(matches, _)| matches(&range))
        .map(|(_, bucket)| *bucket)
        .unwrap_or(SizeBucket::Enterprise)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_size_rule_wins_over_tiny_max() {
        assert_eq!(bucket_for(1000, 5), SizeBucket::Enterprise);
    }

    #[test]
    fn max_size_boundaries_are_inclusive() {
        assert_eq!(bucket_for(0, 10), SizeBucket::Micro);
        assert_eq!(bucket_for(0, 50), SizeBucket::Small);
        assert_eq!(bucket_for(0, 200), SizeBucket::Medium);
        assert_eq!(bucket_for(0, 1000), SizeBucket::Large);
        assert_eq!(bucket_for(0, 5000), SizeBucket::Enterprise);
    }

    #[test]
    fn just_past_each_boundary_moves_up_one_bucket() {
        assert_eq!(bucket_for(1, 11), SizeBucket::Small);
        assert_eq!(bucket_for(11, 51), SizeBucket::Medium);
        assert_eq!(bucket_for(51, 201), SizeBucket::Large);
        assert_eq!(bucket_for(201, 1001), SizeBucket::Enterprise);
    }

    #[test]
    fn min_just_below_threshold_falls_through_to_max_rules() {
        assert_eq!(bucket_for(999, 1000), SizeBucket::Large);
        assert_eq!(bucket_for(999, 10), SizeBucket::Micro);
    }

    #[test]
    fn degenerate_ranges_still_map() {
        assert_eq!(bucket_for(0, 0), SizeBucket::Micro);
        assert_eq!(bucket_for(-5, -1), SizeBucket::Micro);
        assert_eq!(bucket_for(i64::MAX, i64::MIN), SizeBucket::Enterprise);
        assert_eq!(bucket_for(0, i64::MAX), SizeBucket::Enterprise);
    }

    #[test]
    fn table_ends_with_catch_all() {
        let (last, bucket) = SIZE_RULES[SIZE_RULES.len() - 1];
        assert!(last(&SizeRange {
            min_size: 0,
            max_size: 0
        }));
        assert_eq!(bucket, SizeBucket::Enterprise);
    }
}
