use rand::Rng;

/// 按权重随机挑选一个下标。
///
/// 非有限或不大于零的权重不参与累计，总权重不大于零时退化为等概率挑选。
/// 仅当候选为空时返回 None。
pub fn pick_weighted<R: Rng>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();

    if total <= 0.0 {
        return Some(rng.gen_range(0..weights.len()));
    }

    let roll: f64 = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_positive = None;

    for (i, w) in weights.iter().enumerate() {
        if !w.is_finite() || *w <= 0.0 {
            continue;
        }
        cumulative += w;
        last_positive = Some(i);
        if roll < cumulative {
            return Some(i);
        }
    }

    // 浮点累计误差可能让 roll 压线越过末尾
    last_positive
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_weighted(&mut rng, &[]), None);
    }

    #[test]
    fn test_single_candidate_always_wins() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            assert_eq!(pick_weighted(&mut rng, &[0.3]), Some(0));
        }
        // 唯一候选即使权重为零也应中选（等概率回退）
        assert_eq!(pick_weighted(&mut rng, &[0.0]), Some(0));
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert_eq!(pick_weighted(&mut rng, &[0.0, 5.0]), Some(1));
        }
    }

    #[test]
    fn test_invalid_weights_skipped() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..1000 {
            assert_eq!(pick_weighted(&mut rng, &[f64::NAN, -1.0, 2.0]), Some(2));
        }
    }

    #[test]
    fn test_all_zero_weights_fall_back_to_uniform() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = [false; 3];
        for _ in 0..1000 {
            let idx = pick_weighted(&mut rng, &[0.0, 0.0, 0.0]).unwrap();
            seen[idx] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_distribution_matches_weights() {
        let mut rng = StdRng::seed_from_u64(6);
        let weights = [3.0, 1.0];
        let mut hits = [0u32; 2];
        let draws = 10_000;
        for _ in 0..draws {
            hits[pick_weighted(&mut rng, &weights).unwrap()] += 1;
        }

        let share = hits[0] as f64 / draws as f64;
        assert!(
            (share - 0.75).abs() < 0.02,
            "expected ~0.75 for weight 3 of 4, got {share}"
        );
    }
}
