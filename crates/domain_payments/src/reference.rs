//! Payment reference generation
//!
//! References look like `PAY-1718035200123-42-9f2c41d0`: a prefix for the
//! collection channel, the creation time in milliseconds, the student id and
//! a random suffix. Two payers never share a reference because the student
//! id is embedded; the suffix separates repeat attempts by one payer within
//! the same millisecond.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use core_kernel::StudentId;

const SUFFIX_LEN: usize = 8;

/// Generates a reference for a gateway checkout
pub fn generate(student_id: StudentId, now: DateTime<Utc>) -> String {
    build("PAY", student_id, now)
}

/// Generates a reference for an offline payment recorded by staff
pub fn generate_manual(student_id: StudentId, now: DateTime<Utc>) -> String {
    build("MAN", student_id, now)
}

fn build(prefix: &str, student_id: StudentId, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}-{}",
        prefix,
        now.timestamp_millis(),
        student_id.value(),
        &suffix[..SUFFIX_LEN]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_shape() {
        let now = Utc::now();
        let reference = generate(StudentId::new(42), now);
        let parts: Vec<_> = reference.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "PAY");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2], "42");
        assert_eq!(parts[3].len(), SUFFIX_LEN);
    }

    #[test]
    fn test_manual_prefix() {
        let reference = generate_manual(StudentId::new(1), Utc::now());
        assert!(reference.starts_with("MAN-"));
    }

    #[test]
    fn test_same_instant_distinct_payers_never_collide() {
        let now = Utc::now();
        let references: HashSet<_> = (0..10_000)
            .map(|student| generate(StudentId::new(student), now))
            .collect();
        assert_eq!(references.len(), 10_000);
    }

    #[tokio::test]
    async fn test_concurrent_generation_is_unique() {
        let handles: Vec<_> = (0..10_000)
            .map(|student| tokio::spawn(async move { generate(StudentId::new(student), Utc::now()) }))
            .collect();

        let mut references = HashSet::new();
        for handle in handles {
            references.insert(handle.await.unwrap());
        }
        assert_eq!(references.len(), 10_000);
    }
}
