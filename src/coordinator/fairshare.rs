use crate::coordinator::env::EnvRegistry;
use crate::coordinator::model::EnvId;
use crate::coordinator::model::ScoredGroup;
use serde::Serialize;

pub const MIN_WEIGHT: f64 = 0.01;

#[derive(Debug, Serialize)]
pub struct FairShareStatus {
    pub current_step: i64,
    pub queue_size: u64,
    pub unallocated_fraction: f64,
    pub self_queue_size: u64,
    pub max_group_size: u32,
    pub env_weight: f64,
}

/// Computes one environment's self-throttling numbers: its normalised
/// weight, the fraction of each batch nobody has reserved, and its queue
/// depth expressed in "groups of my size" rather than raw sequence count.
///
/// As a side effect, raises the queried env's `group_size` to the largest
/// cardinality it has ever submitted -- the coordinator only learns
/// upward, there is no API to reset this (see DESIGN.md).
pub fn status_env<'a>(
    envs: &mut EnvRegistry,
    queue: impl Iterator<Item = &'a ScoredGroup>,
    env_id: EnvId,
    current_step: i64,
) -> FairShareStatus {
    let total_weighted: f64 = envs
        .iter()
        .filter(|e| e.connected)
        .map(|e| f64::from(e.max_context_len) * e.weight.max(0.0))
        .sum();

    let env_weight = match envs.get(env_id) {
        Some(env) if total_weighted > 0.0 => {
            (f64::from(env.max_context_len) * env.weight / total_weighted).max(MIN_WEIGHT)
        }
        _ if total_weighted > 0.0 => MIN_WEIGHT,
        _ => 1.0,
    };

    let allocated: f64 = envs
        .iter()
        .filter(|e| e.connected)
        .filter_map(|e| e.min_batch_allocation)
        .sum();
    let unallocated_fraction = 1.0 - allocated.min(1.0);

    let mut queue_len: u64 = 0;
    let mut max_group_size: u32 = 1;
    let mut max_seen_by_env: u32 = 0;
    let mut self_sequences: u64 = 0;
    for group in queue {
        let cardinality = group.cardinality() as u32;
        queue_len += 1;
        max_group_size = max_group_size.max(cardinality);
        if group.env_id == Some(env_id) {
            max_seen_by_env = max_seen_by_env.max(cardinality);
            self_sequences += u64::from(cardinality);
        }
    }

    let env_group_size = match envs.get_mut(env_id) {
        Some(env) => {
            env.group_size = env.group_size.max(max_seen_by_env);
            env.group_size
        }
        None => 1,
    };

    FairShareStatus {
        current_step,
        queue_size: queue_len / u64::from(env_group_size),
        unallocated_fraction,
        self_queue_size: self_sequences / u64::from(env_group_size),
        max_group_size,
        env_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::env::RegisterEnvRequest;

    fn req(weight: f64, min: Option<f64>) -> RegisterEnvRequest {
        RegisterEnvRequest {
            max_token_length: 256,
            desired_name: "e".into(),
            weight: Some(weight),
            group_size: 1,
            min_batch_allocation: min,
        }
    }

    #[test]
    fn normalises_weight_by_share_of_total() {
        let mut envs = EnvRegistry::default();
        envs.register(req(1.0, None));
        envs.register(req(3.0, None));
        let a = status_env(&mut envs, std::iter::empty(), 0, 0);
        let b = status_env(&mut envs, std::iter::empty(), 1, 0);
        assert!((a.env_weight - 0.25).abs() < 1e-9);
        assert!((b.env_weight - 0.75).abs() < 1e-9);
    }

    #[test]
    fn no_connected_envs_defaults_weight_to_one() {
        let mut envs = EnvRegistry::default();
        let status = status_env(&mut envs, std::iter::empty(), 0, 0);
        assert_eq!(status.env_weight, 1.0);
    }

    #[test]
    fn unallocated_fraction_clamps_at_zero() {
        let mut envs = EnvRegistry::default();
        envs.register(req(1.0, Some(0.5)));
        envs.register(req(1.0, Some(0.4)));
        envs.register(req(1.0, Some(0.3)));
        let status = status_env(&mut envs, std::iter::empty(), 0, 0);
        assert_eq!(status.unallocated_fraction, 0.0);
    }

    #[test]
    fn disconnected_envs_are_excluded_from_the_weight_denominator() {
        let mut envs = EnvRegistry::default();
        envs.register(req(1.0, None));
        envs.register(req(3.0, None));
        envs.disconnect(1);
        let status = status_env(&mut envs, std::iter::empty(), 0, 0);
        assert_eq!(status.env_weight, 1.0);
    }
}
