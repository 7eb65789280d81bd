//! Behavior clustering from relative offer movement

use serde::{Deserialize, Serialize};

use crate::negotiation::belief::OpponentStance;
use crate::negotiation::metrics::mean;

/// Cluster assignment for an opponent's offer history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorCluster {
    pub cluster: OpponentStance,
    /// Stubbornness score, 0 = cooperative, 1 = stubborn
    pub cluster_score: f64,
    pub avg_concession_pct: f64,
}

impl Default for BehaviorCluster {
    fn default() -> Self {
        Self {
            cluster: OpponentStance::Moderate,
            cluster_score: 0.5,
            avg_concession_pct: 0.0,
        }
    }
}

/// Classify by the mean percentage change between consecutive offers.
///
/// Fewer than two usable observations yield the moderate default. Steps
/// from a non-positive price carry no percentage and are skipped.
pub fn cluster_behavior(offer_history: &[f64]) -> BehaviorCluster {
    let changes: Vec<f64> = offer_history
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]).abs() / w[0] * 100.0)
        .collect();

    let Some(avg) = mean(&changes) else {
        return BehaviorCluster::default();
    };

    let cluster = if avg < 2.0 {
        OpponentStance::Stubborn
    } else if avg < 7.0 {
        OpponentStance::Moderate
    } else {
        OpponentStance::Cooperative
    };

    BehaviorCluster {
        cluster,
        cluster_score: cluster.stubbornness(),
        avg_concession_pct: avg,
    }
}
