//! Carried-weight accounting and the overload penalty schedule.

use serde::{Deserialize, Serialize};

/// Penalty steps by kilograms of excess weight.
const PENALTY_STEPS: [(f64, i32); 2] = [(5.0, -1), (10.0, -2)];

/// Penalty once excess weight passes every step.
const PENALTY_FLOOR: i32 = -3;

/// Total carried weight over `(unit_weight, quantity)` pairs.
pub fn total_weight<I>(entries: I) -> f64
where
    I: IntoIterator<Item = (f64, i32)>,
{
    entries
        .into_iter()
        .map(|(weight, quantity)| weight * quantity as f64)
        .sum()
}

/// Whether carried weight exceeds capacity at all.
pub fn is_encumbered(total: f64, max_carry: f64) -> bool {
    total > max_carry
}

/// Penalty applied to weight-sensitive rolls and checks.
///
/// 0 within capacity, then -1 / -2 / -3 as the excess passes 5 and 10 kg.
pub fn overload_penalty(total: f64, max_carry: f64) -> i32 {
    let excess = total - max_carry;
    if excess <= 0.0 {
        return 0;
    }
    for (limit, penalty) in PENALTY_STEPS {
        if excess <= limit {
            return penalty;
        }
    }
    PENALTY_FLOOR
}

/// Weight summary attached to inventory-affecting results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightStatus {
    pub total: f64,
    pub max_carry: f64,
    pub encumbered: bool,
    pub penalty: i32,
}

impl WeightStatus {
    pub fn compute(total: f64, max_carry: f64) -> Self {
        Self {
            total,
            max_carry,
            encumbered: is_encumbered(total, max_carry),
            penalty: overload_penalty(total, max_carry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_weight_sums_per_quantity() {
        let entries = vec![(1.5, 2), (0.5, 4)];
        assert_eq!(total_weight(entries), 5.0);
        assert_eq!(total_weight(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_within_capacity_no_penalty() {
        assert_eq!(overload_penalty(15.0, 15.0), 0);
        assert_eq!(overload_penalty(3.0, 15.0), 0);
        assert!(!is_encumbered(15.0, 15.0));
    }

    #[test]
    fn test_penalty_schedule() {
        // Strength 3 gives 15 kg capacity; 18 kg carried is 3 kg over.
        assert_eq!(overload_penalty(18.0, 15.0), -1);
        assert_eq!(overload_penalty(20.0, 15.0), -1);
        assert_eq!(overload_penalty(20.1, 15.0), -2);
        assert_eq!(overload_penalty(25.0, 15.0), -2);
        assert_eq!(overload_penalty(25.1, 15.0), -3);
        assert_eq!(overload_penalty(80.0, 15.0), -3);
    }

    #[test]
    fn test_weight_status() {
        let status = WeightStatus::compute(18.0, 15.0);
        assert!(status.encumbered);
        assert_eq!(status.penalty, -1);

        let status = WeightStatus::compute(10.0, 15.0);
        assert!(!status.encumbered);
        assert_eq!(status.penalty, 0);
    }
}
