//! Novelty archive: brute-force k-NN scoring with an adaptive admission
//! threshold.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::mem;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::Rng;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::fittest::FittestList;
use super::record;
use crate::compute::distance::DistanceFn;
use crate::compute::weighting::component_weights;
use crate::schema::{ArchiveConfig, ConfigError, Genotype, NoveltyItem};

/// Items admitted unconditionally before neighbor queries are meaningful.
pub const ARCHIVE_SEED_AMOUNT: usize = 1;
/// Consecutive starved cycles before the threshold is lowered.
pub const STARVATION_LIMIT: u32 = 10;
/// Factor applied to the threshold after `STARVATION_LIMIT` starved cycles.
pub const THRESHOLD_DECAY: f32 = 0.95;
/// Factor applied to the threshold after a surplus cycle.
pub const THRESHOLD_GROWTH: f32 = 1.2;
/// Admissions in one cycle above which the threshold is raised.
pub const SURPLUS_LIMIT: usize = 4;
/// Per-individual probability of random admission.
pub const RANDOM_ADMISSION_RATE: f64 = 0.0005;
/// Novelty an individual needs before it may be admitted at random.
pub const MIN_ACCEPTABLE_NOVELTY: f32 = 0.005;

/// Base of the age discount `1 - AGE_DISCOUNT^age`.
const AGE_DISCOUNT: f32 = 0.95;

/// Archive errors.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid archive configuration: {0}")]
    Config(#[from] ConfigError),
}

/// How [`NoveltyArchive::evaluate_individual`] uses the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Nearest-neighbor novelty against the archive; admit above threshold.
    Admission,
    /// k-NN density against the archive (and population), used as fitness.
    FitnessProxy,
}

/// Archive of novel behaviors.
///
/// Every query scans the whole archive. The archive is expected to stay in
/// the tens to hundreds of items.
pub struct NoveltyArchive<G: Genotype = ()> {
    config: ArchiveConfig,
    distance: DistanceFn,
    /// Admitted items, in admission order.
    items: Vec<NoveltyItem<G>>,
    fittest: FittestList<G>,
    /// Candidates of the current generation (generational mode).
    current_generation: Vec<NoveltyItem<G>>,
    /// Indices into `items` admitted since the last adaptation.
    pending: Vec<usize>,
    threshold: f32,
    starvation: u32,
    generation: usize,
    /// Archive size at the last adaptation.
    generation_boundary: usize,
    run_log: Option<BufWriter<File>>,
}

impl<G: Genotype> NoveltyArchive<G> {
    /// Create an archive. Opens the run log if one is configured.
    pub fn new(config: ArchiveConfig, distance: DistanceFn) -> Result<Self, ArchiveError> {
        config.validate()?;

        let run_log = match &config.run_log {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };

        Ok(Self {
            fittest: FittestList::new(config.fittest_capacity),
            threshold: config.initial_threshold,
            config,
            distance,
            items: Vec::new(),
            current_generation: Vec::new(),
            pending: Vec::new(),
            starvation: 0,
            generation: 0,
            generation_boundary: ARCHIVE_SEED_AMOUNT,
            run_log,
        })
    }

    /// Create an archive from a distance closure.
    pub fn with_distance<F>(config: ArchiveConfig, distance: F) -> Result<Self, ArchiveError>
    where
        F: Fn(&[Vec<f32>], &[Vec<f32>], &[f32]) -> f32 + Send + Sync + 'static,
    {
        Self::new(config, Box::new(distance))
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Current admission threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Archive size recorded at the last threshold adaptation.
    pub fn generation_boundary(&self) -> usize {
        self.generation_boundary
    }

    /// Consecutive starved adaptation cycles so far.
    pub fn starvation(&self) -> u32 {
        self.starvation
    }

    /// Number of admissions since the last threshold adaptation.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Items admitted since the last threshold adaptation.
    pub fn pending(&self) -> impl Iterator<Item = &NoveltyItem<G>> {
        self.pending.iter().map(|&index| &self.items[index])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NoveltyItem<G>> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[NoveltyItem<G>] {
        &self.items
    }

    /// Fittest items seen so far, fittest first.
    pub fn fittest(&self) -> &[NoveltyItem<G>] {
        self.fittest.items()
    }

    /// Candidates queued for the current generation.
    pub fn current_generation(&self) -> &[NoveltyItem<G>] {
        &self.current_generation
    }

    /// Append `item` to the archive and return its index.
    ///
    /// With `queue` the admission counts toward the next threshold
    /// adaptation.
    pub fn admit(&mut self, mut item: NoveltyItem<G>, queue: bool) -> usize {
        item.admitted = true;
        item.generation = self.generation;
        let index = self.items.len();
        self.items.push(item);
        if queue {
            self.pending.push(index);
        }
        index
    }

    /// Whether a novelty score clears the admission threshold.
    pub fn should_admit(&self, novelty: f32) -> bool {
        novelty > self.threshold
    }

    /// Admit a copy of `item` if it has not been admitted yet. The caller's
    /// item is marked admitted too.
    fn admit_copy(&mut self, item: &mut NoveltyItem<G>) -> Option<usize> {
        if item.admitted {
            return None;
        }
        item.admitted = true;
        item.generation = self.generation;
        Some(self.admit(item.clone(), true))
    }

    /// Admit copies of scored candidates above the threshold. Returns the
    /// number admitted.
    pub fn admit_novel(&mut self, candidates: &mut [NoveltyItem<G>]) -> usize {
        let mut admitted = 0;
        for candidate in candidates.iter_mut() {
            if self.should_admit(candidate.novelty) && self.admit_copy(candidate).is_some() {
                admitted += 1;
            }
        }
        admitted
    }

    /// Admit population members at random, without queueing them.
    ///
    /// Each member is drawn with probability [`RANDOM_ADMISSION_RATE`] and
    /// kept only if its novelty exceeds [`MIN_ACCEPTABLE_NOVELTY`].
    pub fn admit_randomly<R: Rng + ?Sized>(
        &mut self,
        population: &[NoveltyItem<G>],
        rng: &mut R,
    ) -> usize {
        let mut admitted = 0;
        for item in population {
            if rng.gen_bool(RANDOM_ADMISSION_RATE) && item.novelty > MIN_ACCEPTABLE_NOVELTY {
                self.admit(item.clone(), false);
                admitted += 1;
            }
        }
        admitted
    }

    /// Distances from `behavior` to every archive item and population member,
    /// ascending, paired with the neighbor's age.
    fn neighbor_distances(
        &self,
        behavior: &[Vec<f32>],
        population: &[NoveltyItem<G>],
    ) -> Vec<(f32, f32)> {
        let weights = component_weights(
            self.items.iter().chain(population).map(NoveltyItem::descriptor),
            self.config.weight_dimensions,
            self.config.dispersion,
        );

        let mut distances: Vec<(f32, f32)> = self
            .items
            .iter()
            .chain(population)
            .map(|other| ((self.distance)(&other.behavior, behavior, &weights), other.age))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));
        distances
    }

    /// Score `item` from its sorted neighbor distances, bootstrapping the
    /// archive when it is still below the seed amount.
    fn settle(
        &mut self,
        item: &mut NoveltyItem<G>,
        distances: &[(f32, f32)],
        k: usize,
        age_smooth: bool,
    ) -> f32 {
        let density = if self.items.len() < ARCHIVE_SEED_AMOUNT {
            item.age = 1.0;
            item.novelty = 0.0;
            // Copies of items archived elsewhere still seed this archive
            item.admitted = false;
            if let Some(index) = self.admit_copy(item) {
                debug!("Seeded archive with item {index}");
            }
            0.0
        } else {
            weighted_density(distances, k, age_smooth)
        };

        item.novelty = density;
        item.generation = self.generation;
        density
    }

    /// Weighted average distance to the `k` nearest neighbors.
    ///
    /// Neighbors come from the archive, plus `population` when given (the
    /// dimension weights then cover both). Under `age_smooth` each neighbor
    /// contributes `1 - 0.95^age`, and neighbors are consumed until their
    /// weights add up to `k` or the list runs out.
    ///
    /// While the archive is below [`ARCHIVE_SEED_AMOUNT`] a copy of `item` is
    /// admitted unconditionally and the score is `0`.
    pub fn novelty_avg_nn(
        &mut self,
        item: &mut NoveltyItem<G>,
        k: usize,
        age_smooth: bool,
        population: Option<&[NoveltyItem<G>]>,
    ) -> f32 {
        let distances = self.neighbor_distances(&item.behavior, population.unwrap_or(&[]));
        self.settle(item, &distances, k, age_smooth)
    }

    /// Novelty score: distance to the single nearest archive item.
    pub fn test_novelty(&mut self, item: &mut NoveltyItem<G>) -> f32 {
        self.novelty_avg_nn(item, 1, false, None)
    }

    /// Fitness-proxy score: average distance to the configured number of
    /// nearest archive items.
    pub fn test_fitness(&mut self, item: &mut NoveltyItem<G>) -> f32 {
        let k = self.config.neighbors;
        self.novelty_avg_nn(item, k, false, None)
    }

    /// Evaluate one individual.
    ///
    /// In [`EvaluationMode::Admission`] the item gets its nearest-neighbor
    /// novelty and a copy is admitted if it clears the threshold. In
    /// [`EvaluationMode::FitnessProxy`] the k-NN density against the archive
    /// and `population` is returned for use as fitness.
    pub fn evaluate_individual(
        &mut self,
        item: &mut NoveltyItem<G>,
        population: Option<&[NoveltyItem<G>]>,
        mode: EvaluationMode,
    ) -> f32 {
        match mode {
            EvaluationMode::Admission => {
                let novelty = self.test_novelty(item);
                if self.should_admit(novelty) {
                    self.admit_copy(item);
                }
                novelty
            }
            EvaluationMode::FitnessProxy => {
                let k = self.config.neighbors;
                self.novelty_avg_nn(item, k, false, population)
            }
        }
    }

    /// Evaluate every member of `population`. In fitness-proxy mode each
    /// member is scored against the archive plus the whole population.
    pub fn evaluate_population(
        &mut self,
        population: &mut [NoveltyItem<G>],
        mode: EvaluationMode,
    ) -> Vec<f32> {
        let mut scores = Vec::with_capacity(population.len());
        for index in 0..population.len() {
            let score = match mode {
                EvaluationMode::Admission => {
                    self.evaluate_individual(&mut population[index], None, mode)
                }
                EvaluationMode::FitnessProxy => {
                    let distances =
                        self.neighbor_distances(&population[index].behavior, population);
                    let k = self.config.neighbors;
                    self.settle(&mut population[index], &distances, k, false)
                }
            };
            scores.push(score);
        }
        scores
    }

    /// Score a batch of candidates against the archive without admitting
    /// them. The distance scans run in parallel; only the bootstrap of an
    /// empty archive mutates it.
    pub fn score_candidates(&mut self, candidates: &mut [NoveltyItem<G>], k: usize)
    where
        G: Sync,
        G::Network: Sync,
    {
        let start = if self.items.len() < ARCHIVE_SEED_AMOUNT {
            match candidates.first_mut() {
                Some(first) => {
                    self.novelty_avg_nn(first, k, false, None);
                    1
                }
                None => return,
            }
        } else {
            0
        };

        let rest = &mut candidates[start..];
        let densities = self.densities(rest, k);
        for (candidate, density) in rest.iter_mut().zip(densities) {
            candidate.novelty = density;
            candidate.generation = self.generation;
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn densities(&self, candidates: &[NoveltyItem<G>], k: usize) -> Vec<f32>
    where
        G: Sync,
        G::Network: Sync,
    {
        candidates
            .par_iter()
            .map(|candidate| {
                let distances = self.neighbor_distances(&candidate.behavior, &[]);
                weighted_density(&distances, k, false)
            })
            .collect()
    }

    #[cfg(target_arch = "wasm32")]
    fn densities(&self, candidates: &[NoveltyItem<G>], k: usize) -> Vec<f32> {
        // Sequential scoring for WASM
        candidates
            .iter()
            .map(|candidate| {
                let distances = self.neighbor_distances(&candidate.behavior, &[]);
                weighted_density(&distances, k, false)
            })
            .collect()
    }

    /// Offer a copy of `item` to the fittest list.
    pub fn update_fittest(&mut self, item: &NoveltyItem<G>) -> bool {
        self.fittest.offer(item)
    }

    /// Re-sort the fittest list after external fitness changes.
    pub fn resort_fittest(&mut self) {
        self.fittest.resort();
    }

    /// Queue a candidate for end-of-generation processing.
    pub fn add_to_generation(&mut self, item: NoveltyItem<G>) {
        self.current_generation.push(item);
    }

    /// Score every queued candidate for novelty, admitting those above the
    /// threshold when `admit` is set.
    pub fn find_novel_items(&mut self, admit: bool) {
        let mut pool = mem::take(&mut self.current_generation);
        for item in pool.iter_mut() {
            let novelty = self.test_novelty(item);
            if admit && self.should_admit(novelty) {
                self.admit_copy(item);
            }
        }
        self.current_generation = pool;
    }

    /// Admit the most novel candidate of the generation that is not already
    /// in the archive.
    fn admit_hall_of_fame(&mut self) {
        let mut pool = mem::take(&mut self.current_generation);
        pool.sort_by(|a, b| b.novelty.total_cmp(&a.novelty));
        if let Some(best) = pool.iter_mut().find(|item| !item.admitted) {
            let novelty = best.novelty;
            if let Some(index) = self.admit_copy(best) {
                info!("Hall of fame admitted item {index} (novelty {novelty:.4})");
            }
        }
        self.current_generation = pool;
    }

    /// Generational end-of-generation hook.
    ///
    /// Advances the generation, runs threshold and hall-of-fame admission
    /// over the queued candidates, writes the detail file, clears the queue
    /// and adapts the threshold. The queue is cleared and the threshold
    /// adapted even if writing the detail file fails.
    pub fn end_of_generation(&mut self) -> Result<(), ArchiveError> {
        self.generation += 1;

        if self.config.threshold_add {
            self.find_novel_items(true);
        }
        if self.config.hall_of_fame {
            self.find_novel_items(false);
            self.admit_hall_of_fame();
        }

        let cleaned = self.clean_generation();
        let adapted = self.adapt_threshold();
        cleaned.and(adapted)
    }

    /// Steady-state end-of-generation hook, called every fixed number of
    /// evaluations.
    pub fn end_of_generation_steady(&mut self) -> Result<(), ArchiveError> {
        self.generation += 1;
        self.adapt_threshold()
    }

    /// Write the generation's candidates to the detail file (if configured)
    /// and clear the queue. Admitted candidates live on as archive copies.
    pub fn clean_generation(&mut self) -> Result<(), ArchiveError> {
        let pool = mem::take(&mut self.current_generation);
        if let Some(path) = self.detail_path() {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            record::save_points(&path, &pool)?;
            info!("Wrote {} candidates to {}", pool.len(), path.display());
        }
        Ok(())
    }

    fn detail_path(&self) -> Option<PathBuf> {
        self.config
            .detail_dir
            .as_ref()
            .map(|dir| dir.join(format!("out{}.dat", self.generation)))
    }

    /// Adjust the threshold from the number of admissions since the last
    /// call, then start a new cycle.
    ///
    /// A cycle is starved when nothing was admitted, or in hall-of-fame mode
    /// when only the forced admission happened. After
    /// [`STARVATION_LIMIT`] consecutive starved cycles the threshold decays
    /// (never below the floor). More than [`SURPLUS_LIMIT`] admissions raise
    /// it. The run log line is written after the state update.
    pub fn adapt_threshold(&mut self) -> Result<(), ArchiveError> {
        let admitted = self.pending.len();
        let logged_threshold = self.threshold;

        let starved = if self.config.hall_of_fame {
            admitted == 1
        } else {
            admitted == 0
        };
        if starved {
            self.starvation += 1;
        } else {
            self.starvation = 0;
        }

        if self.starvation == STARVATION_LIMIT {
            self.threshold = (self.threshold * THRESHOLD_DECAY).max(self.config.threshold_floor);
            self.starvation = 0;
            debug!("Threshold lowered to {:.4}", self.threshold);
        }

        if admitted > SURPLUS_LIMIT {
            self.threshold *= THRESHOLD_GROWTH;
            debug!(
                "Threshold raised to {:.4} after {admitted} admissions",
                self.threshold
            );
        }

        self.pending.clear();
        self.generation_boundary = self.items.len();

        if let Some(log) = self.run_log.as_mut() {
            writeln!(log, "{} {}", logged_threshold, admitted)?;
            log.flush()?;
        }
        Ok(())
    }

    /// Write full records of every archived item.
    pub fn write_archive(&self, out: &mut dyn Write) -> io::Result<()> {
        for item in &self.items {
            record::write_item(item, out)?;
        }
        Ok(())
    }

    /// Write the archive to a new file at `path`.
    pub fn serialize<P: AsRef<Path>>(&self, path: P) -> Result<(), ArchiveError> {
        record::save_items(path.as_ref(), &self.items)?;
        info!(
            "Saved {} archived items to {}",
            self.items.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Write the fittest list to a new file at `path`.
    pub fn serialize_fittest<P: AsRef<Path>>(&self, path: P) -> Result<(), ArchiveError> {
        record::save_items(path, self.fittest.items())?;
        Ok(())
    }
}

impl<G: Genotype> fmt::Debug for NoveltyArchive<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoveltyArchive")
            .field("items", &self.items.len())
            .field("threshold", &self.threshold)
            .field("generation", &self.generation)
            .field("pending", &self.pending.len())
            .field("starvation", &self.starvation)
            .field("fittest", &self.fittest.len())
            .finish_non_exhaustive()
    }
}

/// Weighted average of ascending neighbor distances.
///
/// Consumes neighbors until the accumulated weight reaches `k` or the list
/// ends. Returns `0` when the accumulated weight is zero.
fn weighted_density(neighbors: &[(f32, f32)], k: usize, age_smooth: bool) -> f32 {
    let target = k as f32;
    let mut sum = 0.0;
    let mut weight = 0.0;

    for &(distance, age) in neighbors {
        if weight >= target {
            break;
        }
        let w = if age_smooth {
            1.0 - AGE_DISCOUNT.powf(age)
        } else {
            1.0
        };
        sum += distance * w;
        weight += w;
    }

    if weight == 0.0 { 0.0 } else { sum / weight }
}
