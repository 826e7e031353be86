// src/pipeline/analytics/embeddings.rs
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::{info, instrument, warn};

use crate::config::EmbedsParams;
use crate::data_model::{AnalysisSelection, CleanedRecord};
use crate::error::{PipelineError, Result};
use crate::pipeline::store::ProjectLayout;
use crate::pipeline::writers::CsvWriter;
use crate::utils::create_progress_bar;

/// Word vectors restricted to the vocabulary an analysis needs.
#[derive(Debug, Clone, Default)]
pub struct WordVectors {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl WordVectors {
    /// Reads word2vec/GloVe text format (`word v1 v2 ...` per line, optional
    /// `<count> <dim>` header), keeping only words in `vocabulary`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, vocabulary: &HashSet<&str>) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let reader = BufReader::new(File::open(path)?);
        let mut vectors = HashMap::new();
        let mut dim = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let rest: Vec<&str> = parts.collect();
            if line_no == 0 && rest.len() == 1 && word.parse::<usize>().is_ok() {
                continue;
            }
            if !vocabulary.contains(word) || vectors.contains_key(word) {
                continue;
            }
            let values = rest
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| PipelineError::MalformedRecord {
                    path: path.to_path_buf(),
                    reason: format!("line {}: {}", line_no + 1, e),
                })?;
            if dim == 0 {
                dim = values.len();
            } else if values.len() != dim {
                return Err(PipelineError::MalformedRecord {
                    path: path.to_path_buf(),
                    reason: format!(
                        "line {}: expected {} dimensions, found {}",
                        line_no + 1,
                        dim,
                        values.len()
                    ),
                });
            }
            vectors.insert(word.to_string(), values);
        }
        info!(dim, found = vectors.len(), wanted = vocabulary.len(), "Loaded word vectors");
        Ok(WordVectors { dim, vectors })
    }

    pub fn from_entries<I: IntoIterator<Item = (String, Vec<f32>)>>(entries: I) -> Self {
        let vectors: HashMap<String, Vec<f32>> = entries.into_iter().collect();
        let dim = vectors.values().next().map(Vec::len).unwrap_or(0);
        WordVectors { dim, vectors }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(word)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Cosine similarity; `None` if either word is missing or a zero vector.
    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let (va, vb) = (self.vectors.get(a)?, self.vectors.get(b)?);
        let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
        for (x, y) in va.iter().zip(vb) {
            let (x, y) = (*x as f64, *y as f64);
            dot += x * y;
            na += x * x;
            nb += y * y;
        }
        if na == 0.0 || nb == 0.0 {
            return None;
        }
        Some(dot / (na.sqrt() * nb.sqrt()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Similarity {
    pub term_a: String,
    pub term_b: String,
    pub score: f64,
}

/// Every unordered pair of distinct in-vocabulary terms, most similar first.
pub fn pairwise_similarities(terms: &BTreeSet<String>, vectors: &WordVectors) -> Vec<Similarity> {
    let known: Vec<&String> = terms.iter().filter(|t| vectors.contains(t)).collect();
    let total = known.len() * known.len().saturating_sub(1) / 2;
    let pb = create_progress_bar(total as u64, "Comparing word vectors");
    let mut pairs: Vec<Similarity> = known
        .iter()
        .tuple_combinations()
        .filter_map(|(a, b)| {
            pb.inc(1);
            vectors.similarity(a, b).map(|score| Similarity {
                term_a: (*a).clone(),
                term_b: (*b).clone(),
                score,
            })
        })
        .collect();
    pb.finish_and_clear();
    pairs.sort_by(|x, y| y.score.total_cmp(&x.score));
    pairs
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub term_a: String,
    pub term_b: String,
    pub score: f64,
    /// `1 + t`, where `t` is the score normalized over the kept edges.
    pub width: f64,
    /// Reversed "winter" ramp at `t`, as `#rrggbb`.
    pub color: String,
}

/// Reversed matplotlib "winter" colormap: green at 0, blue at 1.
pub fn winter_r(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let g = ((1.0 - t) * 255.0).round() as u8;
    let b = ((0.5 + 0.5 * t) * 255.0).round() as u8;
    format!("#00{:02x}{:02x}", g, b)
}

/// Edges scoring strictly above `threshold`, with width and color scaled over their range.
pub fn graph_edges(similarities: &[Similarity], threshold: f64) -> Vec<GraphEdge> {
    let kept: Vec<&Similarity> = similarities.iter().filter(|s| s.score > threshold).collect();
    let (min, max) = kept.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.score), hi.max(s.score))
    });
    kept.into_iter()
        .map(|s| {
            let t = if max > min {
                (s.score - min) / (max - min)
            } else {
                0.0
            };
            GraphEdge {
                term_a: s.term_a.clone(),
                term_b: s.term_b.clone(),
                score: s.score,
                width: 1.0 + t,
                color: winter_r(t),
            }
        })
        .collect()
}

fn quote(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Undirected Graphviz graph of the edges.
pub fn render_dot(edges: &[GraphEdge], with_labels: bool) -> String {
    let mut dot = String::from("graph embeds {\n  layout=neato;\n  overlap=false;\n");
    if with_labels {
        dot.push_str("  node [shape=plaintext, fontsize=8];\n");
    } else {
        dot.push_str("  node [shape=point, width=0.08];\n");
    }
    for edge in edges {
        let _ = writeln!(
            dot,
            "  {} -- {} [penwidth={:.3}, color=\"{}\", similarity={:.4}];",
            quote(&edge.term_a),
            quote(&edge.term_b),
            edge.width,
            edge.color,
            edge.score
        );
    }
    dot.push_str("}\n");
    dot
}

fn write_similarities(path: PathBuf, rows: &[Similarity]) -> Result<PathBuf> {
    let mut writer = CsvWriter::create(path, ["term_a", "term_b", "score"])?;
    for s in rows {
        writer.write_row([s.term_a.clone(), s.term_b.clone(), s.score.to_string()])?;
    }
    writer.close()
}

fn write_text_atomic(path: PathBuf, contents: &str) -> Result<PathBuf> {
    let mut partial = path.clone().into_os_string();
    partial.push(".partial");
    if let Err(e) = fs::write(&partial, contents).and_then(|_| fs::rename(&partial, &path)) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    Ok(path)
}

pub fn run_embeds(
    layout: &ProjectLayout,
    records: &[CleanedRecord],
    selection: &AnalysisSelection,
    threshold: f64,
    params: &EmbedsParams,
    vectors_path: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let vectors_path = vectors_path.ok_or_else(|| {
        PipelineError::ConfigError("embeddings.vectors_path is not configured".to_string())
    })?;
    let terms: BTreeSet<String> = records
        .iter()
        .flat_map(|r| r.lemmas.iter())
        .filter(|l| !l.is_empty())
        .cloned()
        .collect();
    let vocabulary: HashSet<&str> = terms.iter().map(String::as_str).collect();
    let vectors = WordVectors::load(vectors_path, &vocabulary)?;

    let similarities = pairwise_similarities(&terms, &vectors);
    let n = similarities.len();
    let extract = params.extract_size.min(n);

    let mut artifacts = vec![
        write_similarities(layout.analysis_path("similarities", selection, "csv"), &similarities)?,
        write_similarities(
            layout.analysis_path("most_similar", selection, "csv"),
            &similarities[..extract],
        )?,
        write_similarities(
            layout.analysis_path("least_similar", selection, "csv"),
            &similarities[n - extract..],
        )?,
    ];

    let edges = graph_edges(&similarities, threshold);
    if edges.is_empty() {
        warn!(threshold, "No similarity exceeds the threshold, graph is empty");
    }
    let stem = format!("embeds_{}", threshold);
    let mut edge_table = CsvWriter::create(
        layout.analysis_path(&format!("{}_edges", stem), selection, "csv"),
        ["term_a", "term_b", "score", "width", "color"],
    )?;
    for e in &edges {
        edge_table.write_row([
            e.term_a.clone(),
            e.term_b.clone(),
            e.score.to_string(),
            format!("{:.4}", e.width),
            e.color.clone(),
        ])?;
    }
    artifacts.push(edge_table.close()?);
    artifacts.push(write_text_atomic(
        layout.analysis_path(&stem, selection, "dot"),
        &render_dot(&edges, true),
    )?);
    artifacts.push(write_text_atomic(
        layout.analysis_path(&format!("embeds_nolabels_{}", threshold), selection, "dot"),
        &render_dot(&edges, false),
    )?);

    info!(
        terms = terms.len(),
        pairs = n,
        edges = edges.len(),
        "Embedding analysis finished"
    );
    Ok(artifacts)
}
