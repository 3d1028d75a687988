// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use rand::Rng;

use crate::types::rating::Rating;

/// Weight of a card that has never been reviewed: between the weakest and
/// the best-known cards.
const UNREVIEWED_WEIGHT: u32 = 8;

/// How strongly a card should be favoured when ordering a session. Ranges
/// from 10 (rated 0.5) down to 1 (rated 5).
pub fn review_weight(rating: Option<Rating>) -> u32 {
    match rating {
        None => UNREVIEWED_WEIGHT,
        // round(11 - 2r) is exact on the half-point scale: 11 - halves.
        Some(rating) => 11u32.saturating_sub(rating.halves() as u32).max(1),
    }
}

/// Order `items` by repeatedly drawing one survivor with probability
/// proportional to its weight, without replacement. Weights are taken over
/// the shrinking pool at every draw, so the result is a Plackett-Luce
/// permutation rather than a single weighted shuffle.
pub fn weighted_order<T, R>(items: Vec<T>, weight: impl Fn(&T) -> u32, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    let mut pool: Vec<(T, u32)> = items
        .into_iter()
        .map(|item| {
            let w = weight(&item).max(1);
            (item, w)
        })
        .collect();
    let mut order = Vec::with_capacity(pool.len());
    while !pool.is_empty() {
        let total: u32 = pool.iter().map(|(_, w)| w).sum();
        let mut pick = rng.gen_range(0..total);
        let mut chosen = pool.len() - 1;
        for (i, (_, w)) in pool.iter().enumerate() {
            if pick < *w {
                chosen = i;
                break;
            }
            pick -= w;
        }
        // `remove`, not `swap_remove`: survivors keep their relative order.
        let (item, _) = pool.remove(chosen);
        order.push(item);
    }
    order
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::error::Fallible;

    #[test]
    fn test_weights() -> Fallible<()> {
        assert_eq!(review_weight(None), 8);
        assert_eq!(review_weight(Some(Rating::new(0.5)?)), 10);
        assert_eq!(review_weight(Some(Rating::new(2.5)?)), 6);
        assert_eq!(review_weight(Some(Rating::new(4.5)?)), 2);
        assert_eq!(review_weight(Some(Rating::new(5.0)?)), 1);
        Ok(())
    }

    #[test]
    fn test_empty_and_single() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: Vec<u32> = weighted_order(Vec::new(), |_| 1, &mut rng);
        assert!(empty.is_empty());
        assert_eq!(weighted_order(vec![7], |_| 1, &mut rng), vec![7]);
    }

    #[test]
    fn test_output_is_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 1..30u32 {
            let items: Vec<u32> = (0..n).collect();
            let mut order = weighted_order(items.clone(), |i| i % 10 + 1, &mut rng);
            assert_eq!(order.len(), items.len());
            order.sort();
            assert_eq!(order, items);
        }
    }

    #[test]
    fn test_scripted_source_always_takes_first_survivor() {
        // A source that always yields zero picks the first remaining item.
        let mut rng = StepRng::new(0, 0);
        let order = weighted_order(vec!['a', 'b', 'c', 'd'], |_| 5, &mut rng);
        assert_eq!(order, vec!['a', 'b', 'c', 'd']);
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let items: Vec<u32> = (0..20).collect();
        let a = weighted_order(items.clone(), |_| 3, &mut StdRng::seed_from_u64(9));
        let b = weighted_order(items, |_| 3, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_weak_cards_come_first_in_expectation() -> Fallible<()> {
        let weak = Some(Rating::new(0.5)?);
        let strong = Some(Rating::new(5.0)?);
        let ratings = vec![strong, None, weak, strong, None, weak];
        let mut rng = StdRng::seed_from_u64(7);
        let trials = 4000;
        let mut position_sum = [0usize; 6];
        for _ in 0..trials {
            let items: Vec<usize> = (0..ratings.len()).collect();
            let order = weighted_order(items, |i| review_weight(ratings[*i]), &mut rng);
            for (position, item) in order.iter().enumerate() {
                position_sum[*item] += position;
            }
        }
        let mean = |i: usize| position_sum[i] as f64 / trials as f64;
        for strong_idx in [0, 3] {
            for early_idx in [1, 2, 4, 5] {
                assert!(mean(early_idx) < mean(strong_idx));
            }
        }
        // The weakest cards also beat unreviewed ones on average.
        assert!(mean(2) + mean(5) < mean(1) + mean(4));
        Ok(())
    }

    #[test]
    fn test_equal_weights_are_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(3);
        let trials = 6000;
        let mut first = [0usize; 3];
        for _ in 0..trials {
            let order = weighted_order(vec![0usize, 1, 2], |_| 4, &mut rng);
            first[order[0]] += 1;
        }
        for count in first {
            let share = count as f64 / trials as f64;
            assert!((share - 1.0 / 3.0).abs() < 0.05);
        }
    }
}
