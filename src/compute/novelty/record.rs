//! Text records for archived novelty items.
//!
//! # Format
//!
//! Each item is written as its genome print-out (if any) followed by a
//! two-line novelty point:
//!
//! ```text
//! /* Novelty: 2.5 Fitness: 0.75 Generation: 3 Indiv: 17 */
//! /* Point: 0.5 1.25 0.5 1.25 */
//! ```
//!
//! `Indiv` is `-1` for items without a source individual. The point lists
//! every scalar of every behavior sub-vector. Scalars use shortest round-trip
//! formatting, so parsing recovers the written values exactly.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::{Genotype, NoveltyItem};

/// Write the two-line novelty point for `item`.
pub fn write_novelty_point<G: Genotype>(
    item: &NoveltyItem<G>,
    out: &mut dyn Write,
) -> io::Result<()> {
    let indiv = item.source_id.map_or(-1, |id| id as i64);
    writeln!(
        out,
        "/* Novelty: {} Fitness: {} Generation: {} Indiv: {} */",
        item.novelty, item.fitness, item.generation, indiv
    )?;
    write!(out, "/* Point:")?;
    for value in item.behavior.iter().flatten() {
        write!(out, " {}", value)?;
    }
    writeln!(out, " */")
}

/// Write the genome print-out followed by the novelty point.
pub fn write_item<G: Genotype>(item: &NoveltyItem<G>, out: &mut dyn Write) -> io::Result<()> {
    if let Some(genotype) = &item.genotype {
        genotype.write_genome(out)?;
    }
    write_novelty_point(item, out)
}

/// Write full records for every item to a new file at `path`.
pub fn save_items<'a, G, I, P>(path: P, items: I) -> io::Result<()>
where
    G: Genotype + 'a,
    I: IntoIterator<Item = &'a NoveltyItem<G>>,
    P: AsRef<Path>,
{
    let mut out = BufWriter::new(File::create(path)?);
    for item in items {
        write_item(item, &mut out)?;
    }
    out.flush()
}

/// Write only the novelty points of `items` to a new file at `path`.
pub fn save_points<'a, G, I, P>(path: P, items: I) -> io::Result<()>
where
    G: Genotype + 'a,
    I: IntoIterator<Item = &'a NoveltyItem<G>>,
    P: AsRef<Path>,
{
    let mut out = BufWriter::new(File::create(path)?);
    for item in items {
        write_novelty_point(item, &mut out)?;
    }
    out.flush()
}

/// A parsed novelty point. Sub-vector boundaries are not recorded, so the
/// behavior comes back as one flat vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltyPoint {
    pub novelty: f32,
    pub fitness: f32,
    pub generation: usize,
    pub source_id: Option<u64>,
    pub point: Vec<f32>,
}

impl NoveltyPoint {
    /// Rebuild an (unadmitted) item from the parsed point.
    pub fn into_item<G: Genotype>(self) -> NoveltyItem<G> {
        let mut item = NoveltyItem::from_descriptor(self.point).with_fitness(self.fitness);
        item.novelty = self.novelty;
        item.generation = self.generation;
        item.source_id = self.source_id;
        item
    }
}

/// Novelty record parse errors.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("No novelty header found")]
    MissingHeader,
    #[error("Novelty header is not followed by a point line")]
    MissingPoint,
    #[error("Malformed record line: {0}")]
    Malformed(String),
    #[error("Missing field {0}")]
    MissingField(&'static str),
    #[error("Invalid value for {field} {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Parse the first novelty point in `text`.
pub fn parse_novelty_point(text: &str) -> Result<NoveltyPoint, RecordError> {
    let mut lines = text.lines();
    parse_next(&mut lines)?.ok_or(RecordError::MissingHeader)
}

/// Parse every novelty point in `text`, skipping genome print-outs.
pub fn parse_novelty_points(text: &str) -> Result<Vec<NoveltyPoint>, RecordError> {
    let mut lines = text.lines();
    let mut points = Vec::new();
    while let Some(point) = parse_next(&mut lines)? {
        points.push(point);
    }
    Ok(points)
}

fn parse_next<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
) -> Result<Option<NoveltyPoint>, RecordError> {
    let Some(header) = lines.find(|line| line.trim_start().starts_with("/* Novelty:")) else {
        return Ok(None);
    };
    let point_line = lines
        .find(|line| !line.trim().is_empty())
        .ok_or(RecordError::MissingPoint)?;

    let mut tokens = comment_body(header)?.split_whitespace();
    let novelty = field(&mut tokens, "Novelty:")?;
    let fitness = field(&mut tokens, "Fitness:")?;
    let generation = field(&mut tokens, "Generation:")?;
    let indiv: i64 = field(&mut tokens, "Indiv:")?;

    let mut tokens = comment_body(point_line)?.split_whitespace();
    if tokens.next() != Some("Point:") {
        return Err(RecordError::MissingPoint);
    }
    let point = tokens
        .map(|token| parse_value("Point:", token))
        .collect::<Result<Vec<f32>, _>>()?;

    Ok(Some(NoveltyPoint {
        novelty,
        fitness,
        generation,
        source_id: u64::try_from(indiv).ok(),
        point,
    }))
}

fn comment_body(line: &str) -> Result<&str, RecordError> {
    line.trim()
        .strip_prefix("/*")
        .and_then(|rest| rest.strip_suffix("*/"))
        .ok_or_else(|| RecordError::Malformed(line.to_string()))
}

fn field<'a, T: FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    label: &'static str,
) -> Result<T, RecordError> {
    if tokens.next() != Some(label) {
        return Err(RecordError::MissingField(label));
    }
    let value = tokens.next().ok_or(RecordError::MissingField(label))?;
    parse_value(label, value)
}

fn parse_value<T: FromStr>(label: &'static str, value: &str) -> Result<T, RecordError> {
    value.parse().map_err(|_| RecordError::InvalidField {
        field: label,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Clone)]
    struct Printed(&'static str);

    impl Genotype for Printed {
        type Network = ();

        fn write_genome(&self, out: &mut dyn Write) -> io::Result<()> {
            writeln!(out, "genomestart {}", self.0)?;
            writeln!(out, "genomeend {}", self.0)
        }
    }

    fn sample() -> NoveltyItem {
        let mut item = NoveltyItem::from_descriptor(vec![0.5, 1.25, 0.5, 1.25])
            .with_fitness(0.75)
            .with_source_id(17);
        item.novelty = 2.5;
        item.generation = 3;
        item
    }

    fn render<G: Genotype>(item: &NoveltyItem<G>) -> String {
        let mut buffer = Vec::new();
        write_item(item, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_point_format() {
        assert_eq!(
            render(&sample()),
            "/* Novelty: 2.5 Fitness: 0.75 Generation: 3 Indiv: 17 */\n\
             /* Point: 0.5 1.25 0.5 1.25 */\n"
        );
    }

    #[test]
    fn test_missing_source_prints_minus_one() {
        let item: NoveltyItem = NoveltyItem::new(vec![vec![1.0], vec![2.0, 3.0]]);
        assert_eq!(
            render(&item),
            "/* Novelty: 0 Fitness: 0 Generation: 0 Indiv: -1 */\n/* Point: 1 2 3 */\n"
        );
    }

    #[test]
    fn test_genome_precedes_point() {
        let item = NoveltyItem::from_descriptor(vec![1.0]).with_genotype(Printed("g1"));
        let text = render(&item);
        assert!(text.starts_with("genomestart g1\ngenomeend g1\n/* Novelty:"));
    }

    #[test]
    fn test_roundtrip_recovers_values() {
        let mut item = sample();
        item.novelty = 0.1 + 0.2;
        item.behavior = vec![vec![1.0 / 3.0, -7.125, 1e-7, 12345.678]];

        let parsed = parse_novelty_point(&render(&item)).unwrap();
        assert_eq!(parsed.novelty, item.novelty);
        assert_eq!(parsed.fitness, item.fitness);
        assert_eq!(parsed.generation, 3);
        assert_eq!(parsed.source_id, Some(17));
        assert_eq!(parsed.point, item.behavior[0]);
    }

    #[test]
    fn test_parse_many_skips_genomes() {
        let a = NoveltyItem::from_descriptor(vec![1.0]).with_genotype(Printed("a"));
        let b = NoveltyItem::from_descriptor(vec![2.0, 3.0]).with_genotype(Printed("b"));
        let text = format!("{}{}", render(&a), render(&b));

        let points = parse_novelty_points(&text).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].point, vec![2.0, 3.0]);
        assert_eq!(points[0].source_id, None);

        let rebuilt: NoveltyItem = points[1].clone().into_item();
        assert_eq!(rebuilt.descriptor(), &[2.0, 3.0]);
        assert!(!rebuilt.admitted);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_novelty_point("nothing here"),
            Err(RecordError::MissingHeader)
        ));
        assert!(matches!(
            parse_novelty_point("/* Novelty: 1 Fitness: 2 Generation: 3 Indiv: 4 */\n"),
            Err(RecordError::MissingPoint)
        ));
        assert!(matches!(
            parse_novelty_point(
                "/* Novelty: x Fitness: 2 Generation: 3 Indiv: 4 */\n/* Point: 1 */\n"
            ),
            Err(RecordError::InvalidField { field: "Novelty:", .. })
        ));
        assert!(matches!(
            parse_novelty_point("/* Novelty: 1 Fitness: 2 Indiv: 4 */\n/* Point: 1 */\n"),
            Err(RecordError::MissingField("Generation:"))
        ));
    }

    #[test]
    fn test_save_items_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.dat");
        let items = vec![sample(), sample().with_fitness(0.25)];

        save_items(&path, &items).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let points = parse_novelty_points(&text).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].fitness, 0.25);
    }
}
