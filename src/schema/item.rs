//! Novelty items: behavior descriptors with scores and archive bookkeeping.

use std::fmt;
use std::io::{self, Write};

/// Genetic representation carried by a [`NoveltyItem`] for archival printing.
///
/// `Clone` must produce an independent deep copy. Archived items are clones of
/// population members and must not share state with them.
pub trait Genotype: Clone {
    /// Compiled form of the genotype (e.g. a network), kept alongside it.
    type Network: Clone;

    /// Write the genome print-out that precedes a novelty-point record.
    fn write_genome(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// Items without a genetic representation print nothing before their point.
impl Genotype for () {
    type Network = ();

    fn write_genome(&self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}

/// A "stake in the ground": one evaluated behavior and its scores.
#[derive(Clone)]
pub struct NoveltyItem<G: Genotype = ()> {
    /// Behavior descriptor. In practice a single flat vector.
    pub behavior: Vec<Vec<f32>>,
    /// Last novelty (or density) score assigned by the archive.
    pub novelty: f32,
    /// Objective fitness, used by the fittest tracker.
    pub fitness: f32,
    /// Age, used to discount young neighbors under age smoothing.
    pub age: f32,
    /// Generation stamped at scoring or admission.
    pub generation: usize,
    /// Index of the individual this item was taken from.
    pub source_id: Option<u64>,
    /// Whether this item (or its copy) has entered the archive.
    pub admitted: bool,
    /// Owned genotype, printed with the archive.
    pub genotype: Option<G>,
    /// Owned compiled network.
    pub network: Option<G::Network>,
}

impl<G: Genotype> NoveltyItem<G> {
    /// Create an item from a behavior descriptor.
    pub fn new(behavior: Vec<Vec<f32>>) -> Self {
        Self {
            behavior,
            novelty: 0.0,
            fitness: 0.0,
            age: 0.0,
            generation: 0,
            source_id: None,
            admitted: false,
            genotype: None,
            network: None,
        }
    }

    /// Create an item from a single flat descriptor.
    pub fn from_descriptor(descriptor: Vec<f32>) -> Self {
        Self::new(vec![descriptor])
    }

    /// Set the objective fitness.
    pub fn with_fitness(mut self, fitness: f32) -> Self {
        self.fitness = fitness;
        self
    }

    /// Set the source individual index.
    pub fn with_source_id(mut self, id: u64) -> Self {
        self.source_id = Some(id);
        self
    }

    /// Set the age.
    pub fn with_age(mut self, age: f32) -> Self {
        self.age = age;
        self
    }

    /// Attach the genotype.
    pub fn with_genotype(mut self, genotype: G) -> Self {
        self.genotype = Some(genotype);
        self
    }

    /// Attach the compiled network.
    pub fn with_network(mut self, network: G::Network) -> Self {
        self.network = Some(network);
        self
    }

    /// The flat descriptor used for dimension weighting (first sub-vector).
    pub fn descriptor(&self) -> &[f32] {
        self.behavior.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of scalars across all sub-vectors.
    pub fn behavior_len(&self) -> usize {
        self.behavior.iter().map(Vec::len).sum()
    }
}

impl<G: Genotype> fmt::Debug for NoveltyItem<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoveltyItem")
            .field("behavior", &self.behavior)
            .field("novelty", &self.novelty)
            .field("fitness", &self.fitness)
            .field("age", &self.age)
            .field("generation", &self.generation)
            .field("source_id", &self.source_id)
            .field("admitted", &self.admitted)
            .field("has_genotype", &self.genotype.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Tagged(Vec<u8>);

    impl Genotype for Tagged {
        type Network = String;

        fn write_genome(&self, out: &mut dyn Write) -> io::Result<()> {
            writeln!(out, "genome {:?}", self.0)
        }
    }

    #[test]
    fn test_new_item_defaults() {
        let item: NoveltyItem = NoveltyItem::from_descriptor(vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(item.age, 0.0);
        assert!(!item.admitted);
        assert_eq!(item.source_id, None);
        assert_eq!(item.descriptor(), &[1.0, 2.0, 1.0, 2.0]);
        assert_eq!(item.behavior_len(), 4);
    }

    #[test]
    fn test_empty_behavior_descriptor() {
        let item: NoveltyItem = NoveltyItem::new(Vec::new());
        assert!(item.descriptor().is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = NoveltyItem::from_descriptor(vec![0.5])
            .with_genotype(Tagged(vec![1, 2, 3]))
            .with_network("net".to_string());
        let mut copy = original.clone();

        copy.genotype.as_mut().unwrap().0.push(4);
        copy.behavior[0][0] = 9.0;

        assert_eq!(original.genotype.as_ref().unwrap().0, vec![1, 2, 3]);
        assert_eq!(original.behavior[0][0], 0.5);
        assert_eq!(copy.network.as_deref(), Some("net"));
    }
}
