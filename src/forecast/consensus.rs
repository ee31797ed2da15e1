//! Agreement between providers for a fused reading

use crate::models::{Consensus, ConsensusLevel};

/// Spread below which providers are considered in high agreement, °C
pub const HIGH_AGREEMENT_BELOW: f64 = 2.0;
/// Spread below which providers are considered in moderate agreement, °C
pub const MEDIUM_AGREEMENT_BELOW: f64 = 4.0;

/// Classify the population standard deviation of `temperatures`.
///
/// Fewer than two readings cannot disagree and rate as high agreement.
#[must_use]
pub fn consensus(temperatures: &[i32]) -> Consensus {
    if temperatures.len() < 2 {
        return Consensus {
            level: ConsensusLevel::High,
            spread: 0.0,
        };
    }

    let count = temperatures.len() as f64;
    let mean = temperatures.iter().map(|t| f64::from(*t)).sum::<f64>() / count;
    let variance = temperatures
        .iter()
        .map(|t| (f64::from(*t) - mean).powi(2))
        .sum::<f64>()
        / count;
    let spread = variance.sqrt();

    let level = if spread < HIGH_AGREEMENT_BELOW {
        ConsensusLevel::High
    } else if spread < MEDIUM_AGREEMENT_BELOW {
        ConsensusLevel::Medium
    } else {
        ConsensusLevel::Low
    };

    Consensus { level, spread }
}
