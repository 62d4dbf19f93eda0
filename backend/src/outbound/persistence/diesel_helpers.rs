//! Column conversions shared by the Diesel adapters.

/// Cast database revision (i32) to domain revision (u32).
///
/// Revisions are non-negative, enforced by a `CHECK` constraint.
#[expect(
    clippy::cast_sign_loss,
    reason = "revision is always non-negative in database"
)]
pub fn cast_revision(revision: i32) -> u32 {
    revision as u32
}

/// Cast domain revision (u32) to database revision (i32).
#[expect(
    clippy::cast_possible_wrap,
    reason = "revision values are always small positive integers"
)]
pub fn cast_revision_for_db(revision: u32) -> i32 {
    revision as i32
}

/// Cast a stored ammunition count, rejecting negative values.
pub fn cast_count(count: i32) -> Result<u32, String> {
    u32::try_from(count).map_err(|_| format!("negative ammunition count {count}"))
}

/// Cast a domain ammunition count to its signed column.
pub fn cast_count_for_db(count: u32) -> Result<i32, String> {
    i32::try_from(count).map_err(|_| format!("ammunition count {count} exceeds column range"))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0)]
    #[case(7, 7)]
    fn revisions_round_trip(#[case] stored: i32, #[case] domain: u32) {
        assert_eq!(cast_revision(stored), domain);
        assert_eq!(cast_revision_for_db(domain), stored);
    }

    #[rstest]
    fn counts_outside_the_column_are_rejected() {
        assert!(cast_count(-1).is_err());
        assert!(cast_count_for_db(u32::MAX).is_err());
        assert_eq!(cast_count_for_db(50), Ok(50));
    }
}
