//! Batch and entity id generation

use uuid::Uuid;

/// Prefix used for the synthetic batch ids of standalone calculations.
///
/// Lets batch queries distinguish bulk uploads from individual calls.
pub const SINGLE_BATCH_PREFIX: &str = "single-";

/// Generate a batch id for one bulk upload run.
///
/// UUIDv7: globally unique and time-ordered, so batch listings sort
/// chronologically by id.
pub fn new_batch_id() -> String {
    Uuid::now_v7().to_string()
}

/// Generate a synthetic batch id for a standalone calculation
pub fn single_batch_id() -> String {
    format!("{SINGLE_BATCH_PREFIX}{}", Uuid::now_v7())
}

/// Generate a new entity id (UUIDv4)
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ids_are_unique() {
        assert_ne!(new_batch_id(), new_batch_id());
    }

    #[test]
    fn batch_ids_sort_by_creation_time() {
        let a = new_batch_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = new_batch_id();
        assert!(a < b);
    }

    #[test]
    fn single_ids_carry_the_prefix() {
        assert!(single_batch_id().starts_with(SINGLE_BATCH_PREFIX));
        assert!(!new_batch_id().starts_with(SINGLE_BATCH_PREFIX));
    }
}
