use std::collections::HashSet;
use std::sync::Arc;

use parla_domain::VocabularyItem;
use rand::seq::SliceRandom;
use rand::Rng;

/// Builds an answer set: the target plus up to `count` distractors drawn uniformly from `pool`,
/// in shuffled order.
///
/// Distractors are excluded by id, so an item that shares the target's text under another id is
/// still eligible. A short pool yields fewer options instead of an error.
pub fn select_options<R: Rng + ?Sized>(
    target: &Arc<VocabularyItem>,
    pool: &[Arc<VocabularyItem>],
    count: usize,
    rng: &mut R,
) -> Vec<Arc<VocabularyItem>> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(pool.len() + 1);
    seen.insert(target.id.as_str());
    let mut candidates: Vec<&Arc<VocabularyItem>> = pool
        .iter()
        .filter(|item| seen.insert(item.id.as_str()))
        .collect();

    let (chosen, _) = candidates.partial_shuffle(rng, count);
    let mut options = Vec::with_capacity(chosen.len() + 1);
    options.push(target.clone());
    options.extend(chosen.iter().map(|item| Arc::clone(item)));
    options.shuffle(rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(size: usize) -> Vec<Arc<VocabularyItem>> {
        (0..size)
            .map(|i| Arc::new(VocabularyItem::new(format!("w{i}"), format!("term{i}"), "m")))
            .collect()
    }

    fn ids(options: &[Arc<VocabularyItem>]) -> Vec<String> {
        options.iter().map(|item| item.id.clone()).collect()
    }

    #[test]
    fn contains_target_once_without_duplicates() {
        for size in 4..12 {
            let pool = pool(size);
            for (seed, target) in pool.iter().enumerate() {
                let mut rng = StdRng::seed_from_u64(seed as u64);
                let options = select_options(target, &pool, 3, &mut rng);
                assert_eq!(options.len(), 4);
                assert_eq!(options.iter().filter(|o| o.id == target.id).count(), 1);
                let unique: HashSet<_> = options.iter().map(|o| o.id.as_str()).collect();
                assert_eq!(unique.len(), options.len());
            }
        }
    }

    #[test]
    fn five_item_pool_gives_four_options_in_varying_order() {
        let pool = pool(5);
        let target = pool[2].clone();
        let orders: HashSet<Vec<String>> = (0..32)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let options = select_options(&target, &pool, 3, &mut rng);
                assert_eq!(options.len(), 4);
                ids(&options)
            })
            .collect();
        assert!(orders.len() > 1, "order should vary across seeds");
        let positions: HashSet<usize> = (0..32)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                select_options(&target, &pool, 3, &mut rng)
                    .iter()
                    .position(|o| o.id == target.id)
                    .unwrap()
            })
            .collect();
        assert!(positions.len() > 1, "target position should vary");
    }

    #[test]
    fn short_pool_returns_fewer_options() {
        let pool = pool(3);
        let mut rng = StdRng::seed_from_u64(7);
        let options = select_options(&pool[0], &pool, 3, &mut rng);
        assert_eq!(options.len(), 3);

        let lonely = pool[..1].to_vec();
        let options = select_options(&lonely[0], &lonely, 3, &mut rng);
        assert_eq!(ids(&options), vec!["w0".to_string()]);
    }

    #[test]
    fn same_text_different_id_is_eligible() {
        let target = Arc::new(VocabularyItem::new("a", "bank", "river side"));
        let twin = Arc::new(VocabularyItem::new("b", "bank", "money place"));
        let pool = vec![target.clone(), twin.clone(), target.clone()];
        let mut rng = StdRng::seed_from_u64(1);
        let options = select_options(&target, &pool, 3, &mut rng);
        let mut got = ids(&options);
        got.sort();
        assert_eq!(got, vec!["a".to_string(), "b".to_string()]);
    }
}
