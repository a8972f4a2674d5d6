//! Bounded list of the fittest items seen so far.

use crate::schema::{Genotype, NoveltyItem};

/// Default capacity of the fittest list.
pub const FITTEST_CAPACITY: usize = 5;

/// Fittest-so-far items, sorted by descending fitness.
///
/// Holds independent copies; offering an item never retains a reference to it.
#[derive(Clone)]
pub struct FittestList<G: Genotype = ()> {
    items: Vec<NoveltyItem<G>>,
    capacity: usize,
}

impl<G: Genotype> Default for FittestList<G> {
    fn default() -> Self {
        Self::new(FITTEST_CAPACITY)
    }
}

impl<G: Genotype> FittestList<G> {
    /// Create an empty list holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Offer a copy of `item`. Returns whether it was kept.
    ///
    /// Below capacity every item is kept. At capacity the item must beat the
    /// current minimum, which is then dropped.
    pub fn offer(&mut self, item: &NoveltyItem<G>) -> bool {
        if self.items.len() < self.capacity {
            self.items.push(item.clone());
            self.resort();
            return true;
        }

        match self.items.last() {
            Some(min) if item.fitness > min.fitness => {
                self.items.push(item.clone());
                self.resort();
                self.items.pop();
                true
            }
            _ => false,
        }
    }

    /// Restore descending fitness order.
    pub fn resort(&mut self) {
        self.items.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    }

    /// Items, fittest first.
    pub fn items(&self) -> &[NoveltyItem<G>] {
        &self.items
    }

    /// Mutable access for re-scoring; call [`FittestList::resort`] afterwards.
    pub fn items_mut(&mut self) -> &mut [NoveltyItem<G>] {
        &mut self.items
    }

    /// The fittest item.
    pub fn best(&self) -> Option<&NoveltyItem<G>> {
        self.items.first()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(fitness: f32) -> NoveltyItem {
        NoveltyItem::from_descriptor(vec![fitness]).with_fitness(fitness)
    }

    fn fitnesses(list: &FittestList) -> Vec<f32> {
        list.items().iter().map(|i| i.fitness).collect()
    }

    #[test]
    fn test_fills_to_capacity_sorted() {
        let mut list = FittestList::default();
        for f in [0.3, 0.9, 0.1, 0.5, 0.7] {
            assert!(list.offer(&item(f)));
        }
        assert_eq!(list.len(), 5);
        assert_eq!(fitnesses(&list), vec![0.9, 0.7, 0.5, 0.3, 0.1]);
    }

    #[test]
    fn test_replaces_minimum_at_capacity() {
        let mut list = FittestList::new(3);
        for f in [0.2, 0.4, 0.6] {
            list.offer(&item(f));
        }

        assert!(!list.offer(&item(0.1)));
        assert!(!list.offer(&item(0.2)));
        assert!(list.offer(&item(0.5)));

        assert_eq!(fitnesses(&list), vec![0.6, 0.5, 0.4]);
        assert_eq!(list.best().unwrap().fitness, 0.6);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut list = FittestList::default();
        for i in 0..50 {
            list.offer(&item((i * 37 % 11) as f32));
            assert!(list.len() <= FITTEST_CAPACITY);
            let f = fitnesses(&list);
            assert!(f.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_stores_copies() {
        let mut list = FittestList::default();
        let mut original = item(1.0);
        list.offer(&original);

        original.behavior[0][0] = 42.0;
        original.fitness = -1.0;

        assert_eq!(list.items()[0].behavior[0][0], 1.0);
        assert_eq!(list.items()[0].fitness, 1.0);
    }

    #[test]
    fn test_resort_after_mutation() {
        let mut list = FittestList::default();
        list.offer(&item(0.5));
        list.offer(&item(0.4));
        list.items_mut()[1].fitness = 2.0;
        list.resort();
        assert_eq!(fitnesses(&list), vec![2.0, 0.5]);
    }
}
