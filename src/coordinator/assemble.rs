use crate::coordinator::model::Batch;
use crate::coordinator::model::EnvironmentDescriptor;
use crate::coordinator::model::ScoredGroup;

/// Walks `pool` head-to-tail, picking entries that don't overshoot `target`,
/// until the running sum hits `target` exactly. Returns the picked indices
/// in ascending (original) order on a hit; `pool` itself is never touched --
/// callers only commit a removal once they know the attempt succeeded.
fn greedy_fill(pool: &[ScoredGroup], target: u64) -> Option<Vec<usize>> {
    if target == 0 {
        return Some(Vec::new());
    }
    let mut picked = Vec::new();
    let mut sum = 0u64;
    for (i, g) in pool.iter().enumerate() {
        if sum >= target {
            break;
        }
        let card = g.cardinality() as u64;
        if sum + card <= target {
            picked.push(i);
            sum += card;
        }
    }
    (sum == target).then_some(picked)
}

/// Strategy B: reserve from the tail for every connected env with a
/// `min_batch_allocation`, in registration order, then fill the remainder
/// from the head. Returns ascending indices into `pool` on success.
fn reserve_and_fill(
    pool: &[ScoredGroup],
    envs: &[EnvironmentDescriptor],
    batch_size: u32,
) -> Option<Vec<usize>> {
    let mut consumed = vec![false; pool.len()];
    let mut reserved_indices = Vec::new();
    let mut reserved_total = 0u64;

    for env in envs.iter().filter(|e| e.connected) {
        let Some(fraction) = env.min_batch_allocation else {
            continue;
        };
        let min_seqs = (f64::from(batch_size) * fraction).ceil() as u64;
        if min_seqs == 0 {
            continue;
        }
        let mut collected = 0u64;
        let mut i = pool.len();
        while i > 0 {
            i -= 1;
            if collected >= min_seqs {
                break;
            }
            if consumed[i] || pool[i].env_id != Some(env.registered_id) {
                continue;
            }
            let card = pool[i].cardinality() as u64;
            if collected + card <= min_seqs {
                consumed[i] = true;
                reserved_indices.push(i);
                collected += card;
            }
        }
        reserved_total += collected;
    }

    if reserved_total > u64::from(batch_size) {
        return None;
    }
    let remaining_target = u64::from(batch_size) - reserved_total;

    let mut filler_indices = Vec::new();
    let mut sum = 0u64;
    for (i, g) in pool.iter().enumerate() {
        if sum >= remaining_target {
            break;
        }
        if consumed[i] {
            continue;
        }
        let card = g.cardinality() as u64;
        if sum + card <= remaining_target {
            filler_indices.push(i);
            sum += card;
        }
    }
    if sum != remaining_target {
        return None;
    }

    let mut all = reserved_indices;
    all.extend(filler_indices);
    all.sort_unstable();
    Some(all)
}

fn commit(pool: &mut Vec<ScoredGroup>, indices: Vec<usize>) -> Batch {
    let mut batch = Vec::with_capacity(indices.len());
    for &idx in indices.iter().rev() {
        batch.push(pool.remove(idx));
    }
    batch.reverse();
    batch
}

/// Stateless: given a snapshot of the queue and the environment table,
/// produces every batch currently assemblable and returns the leftover
/// queue. Strategy is picked once, by whether any connected env declares a
/// `min_batch_allocation`; otherwise every batch in this call uses the same
/// strategy.
pub fn assemble(
    queue: Vec<ScoredGroup>,
    envs: &[EnvironmentDescriptor],
    batch_size: u32,
) -> (Vec<Batch>, Vec<ScoredGroup>) {
    let has_minimums = envs
        .iter()
        .any(|e| e.connected && e.min_batch_allocation.is_some());
    let mut pool = queue;
    let mut batches = Vec::new();
    loop {
        let attempt = if has_minimums {
            reserve_and_fill(&pool, envs, batch_size)
        } else {
            greedy_fill(&pool, u64::from(batch_size))
        };
        match attempt {
            Some(indices) if !indices.is_empty() => {
                batches.push(commit(&mut pool, indices));
            }
            _ => break,
        }
    }
    (batches, pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::model::EnvId;

    fn group(cardinality: usize, env_id: Option<EnvId>) -> ScoredGroup {
        ScoredGroup {
            tokens: vec![vec![1]; cardinality],
            masks: vec![vec![1]; cardinality],
            scores: vec![0.0; cardinality],
            env_id,
            ..Default::default()
        }
    }

    fn env(registered_id: EnvId, min_batch_allocation: Option<f64>) -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            registered_id,
            desired_name: format!("env{registered_id}"),
            real_name: format!("env{registered_id}_0"),
            max_context_len: 256,
            weight: 1.0,
            group_size: 1,
            min_batch_allocation,
            connected: true,
        }
    }

    #[test]
    fn strategy_a_packs_exact_sum() {
        let queue = vec![group(1, None), group(2, None), group(1, None), group(3, None)];
        let (batches, remainder) = assemble(queue, &[], 4);
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].iter().map(ScoredGroup::cardinality).sum::<usize>(),
            4
        );
        assert_eq!(remainder.len(), 1);
        assert_eq!(remainder[0].cardinality(), 3);
    }

    #[test]
    fn strategy_a_returns_partial_accumulation_untouched() {
        let queue = vec![group(3, None), group(3, None)];
        let (batches, remainder) = assemble(queue, &[], 4);
        assert!(batches.is_empty());
        assert_eq!(remainder.len(), 2);
        assert_eq!(remainder[0].cardinality(), 3);
        assert_eq!(remainder[1].cardinality(), 3);
    }

    #[test]
    fn strategy_b_honours_min_allocation_quota() {
        let envs = vec![env(0, Some(0.6)), env(1, None)];
        let mut queue = Vec::new();
        for _ in 0..8 {
            queue.push(group(1, Some(1)));
            queue.push(group(1, Some(0)));
        }
        let (batches, _remainder) = assemble(queue, &envs, 10);
        assert_eq!(batches.len(), 1);
        let env0_count = batches[0].iter().filter(|g| g.env_id == Some(0)).count();
        assert!(env0_count >= 6, "expected at least 6 env0 groups, got {env0_count}");
        assert_eq!(
            batches[0].iter().map(ScoredGroup::cardinality).sum::<usize>(),
            10
        );
    }

    #[test]
    fn atomic_groups_are_never_split() {
        let queue = vec![group(5, None), group(5, None)];
        let (batches, remainder) = assemble(queue, &[], 4);
        assert!(batches.is_empty());
        assert_eq!(remainder.len(), 2);
    }
}
