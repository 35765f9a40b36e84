//! Capacity-weighted random selection.
//!
//! Each live target is weighted by its spare capacity (`available`). When no
//! live target reports spare capacity, total `capacity` is used instead so a
//! healthy but saturated pool still receives traffic.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::load_balancer::{LoadBalancer, SelectError};
use crate::registry::{Host, Snapshot, TargetStatus};

/// Weighted random selector with its own random source.
#[derive(Debug)]
pub struct WeightedSelector {
    rng: Mutex<StdRng>,
}

impl WeightedSelector {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Selector with a fixed seed, for reproducible draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for WeightedSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancer for WeightedSelector {
    fn select(&self, snapshot: &Snapshot) -> Result<Host, SelectError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        select_with(snapshot, &mut *rng)
    }
}

/// Pick one live host from `targets` using `rng`.
///
/// The draw is uniform over `[0, total)` and the first host whose running
/// weight sum exceeds the draw wins, so a zero-weight host is never picked
/// while any other candidate has weight. Iteration follows the map's key order.
pub fn select_with<R: Rng + ?Sized>(
    targets: &BTreeMap<Host, TargetStatus>,
    rng: &mut R,
) -> Result<Host, SelectError> {
    let candidates: Vec<(&Host, &TargetStatus)> = targets
        .iter()
        .filter(|(_, status)| !status.is_down())
        .collect();

    if candidates.is_empty() {
        return Err(if targets.is_empty() {
            SelectError::NoTargetsConfigured
        } else {
            SelectError::AllTargetsDown
        });
    }

    let total_available = weight_sum(&candidates, TargetStatus::available);
    let weight: fn(&TargetStatus) -> f64 = if total_available > 0.0 {
        TargetStatus::available
    } else {
        TargetStatus::capacity
    };
    let total = weight_sum(&candidates, weight);

    // Up but reporting nothing usable: spread evenly.
    if !(total > 0.0 && total.is_finite()) {
        let index = rng.gen_range(0..candidates.len());
        return Ok(candidates[index].0.clone());
    }

    let choice = rng.gen_range(0.0..total);
    let mut cumsum = 0.0;
    for (host, status) in &candidates {
        cumsum += weight(status);
        if cumsum > choice {
            return Ok((*host).clone());
        }
    }

    // Rounding can leave the running sum just short of the draw.
    let (host, _) = candidates
        .iter()
        .rev()
        .find(|(_, status)| weight(status) > 0.0)
        .unwrap_or(&candidates[candidates.len() - 1]);
    Ok((*host).clone())
}

fn weight_sum(candidates: &[(&Host, &TargetStatus)], weight: fn(&TargetStatus) -> f64) -> f64 {
    candidates.iter().map(|(_, status)| weight(status)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn snapshot(entries: &[(&str, TargetStatus)]) -> Snapshot {
        Arc::new(
            entries
                .iter()
                .map(|(h, s)| (Host::parse(h).unwrap(), *s))
                .collect(),
        )
    }

    fn up(available: f64, capacity: f64) -> TargetStatus {
        TargetStatus::Reporting { available, capacity }
    }

    #[test]
    fn test_empty_registry() {
        let lb = WeightedSelector::seeded(1);
        assert_eq!(lb.select(&snapshot(&[])), Err(SelectError::NoTargetsConfigured));
    }

    #[test]
    fn test_all_down() {
        let lb = WeightedSelector::seeded(1);
        let snap = snapshot(&[("http://a", TargetStatus::Down)]);
        assert_eq!(lb.select(&snap), Err(SelectError::AllTargetsDown));
    }

    #[test]
    fn test_only_host_with_spare_capacity_is_chosen() {
        let lb = WeightedSelector::seeded(7);
        let snap = snapshot(&[("http://a", up(3.0, 10.0)), ("http://b", up(0.0, 5.0))]);
        for _ in 0..1000 {
            assert_eq!(lb.select(&snap).unwrap().as_str(), "http://a");
        }
    }

    #[test]
    fn test_never_picks_down_host() {
        let lb = WeightedSelector::seeded(3);
        let snap = snapshot(&[
            ("http://a", TargetStatus::Down),
            ("http://b", up(1.0, 1.0)),
            ("http://c", TargetStatus::Down),
        ]);
        for _ in 0..500 {
            assert_eq!(lb.select(&snap).unwrap().as_str(), "http://b");
        }
    }

    #[test]
    fn test_capacity_fallback() {
        let lb = WeightedSelector::seeded(11);
        let snap = snapshot(&[
            ("http://a", up(0.0, 4.0)),
            ("http://b", up(0.0, 0.0)),
            ("http://c", TargetStatus::Down),
        ]);
        for _ in 0..500 {
            assert_eq!(lb.select(&snap).unwrap().as_str(), "http://a");
        }
    }

    #[test]
    fn test_zero_capacity_pool_still_selects() {
        let lb = WeightedSelector::seeded(5);
        let snap = snapshot(&[("http://a", up(0.0, 0.0)), ("http://b", up(0.0, 0.0))]);
        let host = lb.select(&snap).unwrap();
        assert!(snap.contains_key(&host));
    }

    #[test]
    fn test_distribution_follows_availability() {
        let lb = WeightedSelector::seeded(42);
        let snap = snapshot(&[("http://a", up(1.0, 10.0)), ("http://b", up(3.0, 10.0))]);

        let mut b_count = 0;
        for _ in 0..4000 {
            if lb.select(&snap).unwrap().as_str() == "http://b" {
                b_count += 1;
            }
        }
        assert!((2700..=3300).contains(&b_count), "b picked {b_count} times");
    }

    #[test]
    fn test_fractional_weights() {
        let lb = WeightedSelector::seeded(13);
        let snap = snapshot(&[("http://a", up(0.5, 1.0)), ("http://b", up(1.5, 2.0))]);

        let mut b_count = 0;
        for _ in 0..4000 {
            if lb.select(&snap).unwrap().as_str() == "http://b" {
                b_count += 1;
            }
        }
        assert!((2700..=3300).contains(&b_count), "b picked {b_count} times");
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let snap = snapshot(&[("http://a", up(5.0, 5.0)), ("http://b", up(5.0, 5.0)), ("http://c", up(5.0, 5.0))]);
        let first = WeightedSelector::seeded(9);
        let second = WeightedSelector::seeded(9);
        for _ in 0..100 {
            assert_eq!(first.select(&snap), second.select(&snap));
        }
    }
}
