// src/pipeline/collector/mod.rs

pub mod twitter;

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::data_model::Post;
use crate::error::{PipelineError, Result};
use crate::pipeline::store::ProjectLayout;
use crate::pipeline::writers::{BaseWriter, CsvWriter};
use crate::utils::create_progress_bar;

pub use twitter::TwitterTimelineClient;

/// Bounds of one timeline page request. Ids are inclusive upper (`max_id`)
/// and exclusive lower (`since_id`) bounds, as in the Twitter v1.1 API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub count: u32,
    pub since_id: Option<u64>,
    pub max_id: Option<u64>,
}

/// A remote timeline returning posts newest-first.
pub trait TimelineSource {
    fn fetch_page(&self, query: &str, request: &PageRequest) -> Result<Vec<Post>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMode {
    /// Walk the timeline back from the newest post until exhausted.
    Backfill,
    /// Fetch everything newer than the cursor.
    Incremental { since_id: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub pages: usize,
    pub posts: usize,
    /// Raw batch written by this run, if any post was fetched.
    pub batch: Option<PathBuf>,
}

/// Pages through the timeline and returns every fetched post, newest-first.
pub fn fetch_timeline(
    source: &dyn TimelineSource,
    query: &str,
    page_size: u32,
    mode: CollectionMode,
) -> Result<(Vec<Post>, usize)> {
    let since_id = match mode {
        CollectionMode::Backfill => None,
        CollectionMode::Incremental { since_id } => Some(since_id),
    };
    let pb = create_progress_bar(0, &format!("Fetching @{}", query));
    let mut posts: Vec<Post> = Vec::new();
    let mut max_id: Option<u64> = None;
    let mut pages = 0usize;

    loop {
        let request = PageRequest {
            count: page_size,
            since_id,
            max_id,
        };
        let page = source.fetch_page(query, &request)?;
        pages += 1;
        if page.is_empty() {
            break;
        }
        let oldest = page
            .iter()
            .map(|p| {
                p.numeric_id().ok_or_else(|| {
                    PipelineError::SourceError(format!("post id '{}' is not numeric", p.id))
                })
            })
            .collect::<Result<Vec<u64>>>()?
            .into_iter()
            .min()
            .unwrap_or(0);
        if let Some(bound) = max_id {
            if oldest > bound {
                warn!(query, bound, "Timeline page made no progress, stopping");
                break;
            }
        }
        posts.extend(page);
        pb.set_position(posts.len() as u64);
        if oldest == 0 {
            break;
        }
        max_id = Some(oldest - 1);
    }
    pb.finish_and_clear();
    Ok((posts, pages))
}

/// Writes fetched posts as `raw/<newest id>.csv`. Nothing is written for no posts.
pub fn write_raw_batch(layout: &ProjectLayout, posts: &[Post]) -> Result<Option<PathBuf>> {
    let Some(newest) = posts.iter().filter_map(Post::numeric_id).max() else {
        return Ok(None);
    };
    let mut writer = CsvWriter::for_schema::<Post, _>(layout.raw_batch_path(&newest.to_string()))?;
    writer.write_batch(posts)?;
    Ok(Some(writer.close()?))
}

/// Collects from the stored cursor: backfill when `raw/` is empty, incremental otherwise.
#[instrument(skip(layout, source), fields(root = %layout.root().display()))]
pub fn collect(
    layout: &ProjectLayout,
    source: &dyn TimelineSource,
    query: &str,
    page_size: u32,
) -> Result<CollectionOutcome> {
    layout.ensure()?;
    let mode = match layout.latest_post_id()? {
        Some(since_id) => CollectionMode::Incremental { since_id },
        None => CollectionMode::Backfill,
    };
    info!(?mode, "Collecting timeline");
    let (posts, pages) = fetch_timeline(source, query, page_size, mode)?;
    let batch = write_raw_batch(layout, &posts)?;
    match &batch {
        Some(path) => info!(posts = posts.len(), pages, path = %path.display(), "Stored raw batch"),
        None => info!(pages, "No new posts"),
    }
    Ok(CollectionOutcome {
        pages,
        posts: posts.len(),
        batch,
    })
}

/// Creates the project layout and backfills the timeline if nothing was collected yet.
pub fn initialise(
    layout: &ProjectLayout,
    source: &dyn TimelineSource,
    query: &str,
    page_size: u32,
) -> Result<CollectionOutcome> {
    layout.ensure()?;
    if !layout.raw_batches()?.is_empty() {
        info!(root = %layout.root().display(), "Project already initialised, skipping backfill");
        return Ok(CollectionOutcome::default());
    }
    collect(layout, source, query, page_size)
}
