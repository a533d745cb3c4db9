//! Trauma descriptors assigned when sanity collapses to zero.

use rand::prelude::IndexedRandom;

/// The fixed trauma pool. One entry is drawn at random and appended to the
/// character's trauma log each time SP hits 0.
pub const TRAUMAS: [&str; 6] = [
    "Hypervigilance: cannot sleep without watching every entrance.",
    "Uncontrollable hand tremors under stress.",
    "Temporary mutism when exposed to loud noises.",
    "Panic attacks at the smell of blood.",
    "Paralyzing flashbacks on hearing screams.",
    "Aversion to enclosed spaces (acute claustrophobia).",
];

/// Separator between entries in the stored trauma log.
pub const TRAUMA_SEPARATOR: &str = "; ";

/// Draw one trauma descriptor at random.
pub fn random_trauma() -> &'static str {
    let mut rng = rand::rng();
    TRAUMAS.choose(&mut rng).copied().unwrap_or(TRAUMAS[0])
}

/// Append a trauma to an existing log string.
pub fn append_trauma(log: &str, trauma: &str) -> String {
    if log.is_empty() {
        trauma.to_string()
    } else {
        format!("{log}{TRAUMA_SEPARATOR}{trauma}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_trauma_comes_from_pool() {
        for _ in 0..50 {
            assert!(TRAUMAS.contains(&random_trauma()));
        }
    }

    #[test]
    fn test_append_to_empty_log() {
        assert_eq!(append_trauma("", TRAUMAS[0]), TRAUMAS[0]);
    }

    #[test]
    fn test_append_preserves_existing_entries() {
        let log = append_trauma(TRAUMAS[0], TRAUMAS[1]);
        assert!(log.starts_with(TRAUMAS[0]));
        assert!(log.ends_with(TRAUMAS[1]));
        assert_eq!(log.matches(TRAUMA_SEPARATOR).count(), 1);
    }
}
