use std::cell::RefCell;

use tempfile::tempdir;
use TweetLens::data_model::Post;
use TweetLens::error::Result;
use TweetLens::pipeline::collector::{
    collect, fetch_timeline, initialise, CollectionMode, PageRequest, TimelineSource,
};
use TweetLens::pipeline::readers::{BaseReader, CsvReader};
use TweetLens::pipeline::store::ProjectLayout;

fn post(id: u64) -> Post {
    Post {
        id: id.to_string(),
        text: format!("post number {}", id),
        favorite_count: id,
        retweet_count: 0,
        created_at: format!("2021-04-{:02} 12:00:00+00:00", id % 28 + 1),
        source: "Web App".to_string(),
        in_reply_to_id: None,
        in_reply_to_user: None,
    }
}

/// In-memory timeline honouring `since_id`/`max_id` like the real endpoint.
struct MockTimeline {
    ids: Vec<u64>,
    requests: RefCell<Vec<PageRequest>>,
}

impl MockTimeline {
    fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        let mut ids: Vec<u64> = ids.into_iter().collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        MockTimeline {
            ids,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl TimelineSource for MockTimeline {
    fn fetch_page(&self, _query: &str, request: &PageRequest) -> Result<Vec<Post>> {
        self.requests.borrow_mut().push(*request);
        Ok(self
            .ids
            .iter()
            .copied()
            .filter(|id| request.since_id.map_or(true, |s| *id > s))
            .filter(|id| request.max_id.map_or(true, |m| *id <= m))
            .take(request.count as usize)
            .map(post)
            .collect())
    }
}

/// Ignores paging bounds and keeps returning the newest page.
struct StuckTimeline;

impl TimelineSource for StuckTimeline {
    fn fetch_page(&self, _query: &str, _request: &PageRequest) -> Result<Vec<Post>> {
        Ok(vec![post(10), post(9)])
    }
}

fn ids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.id.clone()).collect()
}

#[test]
fn backfill_pages_until_an_empty_page() {
    let timeline = MockTimeline::new(1..=5);
    let (posts, pages) = fetch_timeline(&timeline, "someone", 2, CollectionMode::Backfill).unwrap();

    assert_eq!(ids(&posts), vec!["5", "4", "3", "2", "1"]);
    assert_eq!(pages, 4);
    let max_ids: Vec<Option<u64>> = timeline.requests.borrow().iter().map(|r| r.max_id).collect();
    assert_eq!(max_ids, vec![None, Some(3), Some(1), Some(0)]);
    assert!(timeline.requests.borrow().iter().all(|r| r.since_id.is_none()));
}

#[test]
fn collect_writes_one_batch_named_after_newest_post() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path(), "demo");
    let timeline = MockTimeline::new(1..=5);

    let outcome = collect(&layout, &timeline, "someone", 2).unwrap();
    let batch = outcome.batch.expect("a batch should be written");
    assert_eq!(batch, layout.raw_dir().join("5.csv"));
    assert_eq!(outcome.posts, 5);

    let stored = CsvReader::<Post>::new(&batch).read_all().unwrap();
    assert_eq!(ids(&stored), vec!["5", "4", "3", "2", "1"]);
    assert_eq!(stored[0], post(5));
    assert_eq!(layout.latest_post_id().unwrap(), Some(5));
}

#[test]
fn incremental_collection_starts_from_the_cursor() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path(), "demo");
    collect(&layout, &MockTimeline::new(1..=3), "someone", 200).unwrap();

    let timeline = MockTimeline::new(1..=6);
    let outcome = collect(&layout, &timeline, "someone", 2).unwrap();

    assert_eq!(outcome.posts, 3);
    assert_eq!(outcome.batch, Some(layout.raw_dir().join("6.csv")));
    let requests = timeline.requests.borrow();
    assert!(requests.iter().all(|r| r.since_id == Some(3)));
    assert_eq!(requests[0].max_id, None);
    assert_eq!(requests[1].max_id, Some(4));

    let batches = layout.raw_batches().unwrap();
    assert_eq!(
        batches,
        vec![layout.raw_dir().join("3.csv"), layout.raw_dir().join("6.csv")]
    );
}

#[test]
fn nothing_is_written_when_no_posts_are_new() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path(), "demo");
    let outcome = collect(&layout, &MockTimeline::new(Vec::new()), "someone", 200).unwrap();

    assert_eq!(outcome.posts, 0);
    assert_eq!(outcome.pages, 1);
    assert!(outcome.batch.is_none());
    assert!(layout.raw_batches().unwrap().is_empty());
}

#[test]
fn a_page_without_progress_ends_the_run() {
    let (posts, pages) = fetch_timeline(&StuckTimeline, "someone", 200, CollectionMode::Backfill).unwrap();
    assert_eq!(ids(&posts), vec!["10", "9"]);
    assert_eq!(pages, 2);
}

#[test]
fn initialise_skips_projects_that_already_have_batches() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path(), "demo");
    let first = initialise(&layout, &MockTimeline::new(1..=2), "someone", 200).unwrap();
    assert_eq!(first.posts, 2);

    let timeline = MockTimeline::new(1..=9);
    let second = initialise(&layout, &timeline, "someone", 200).unwrap();
    assert_eq!(second.posts, 0);
    assert!(timeline.requests.borrow().is_empty());
    assert!(layout.cleaned_dir().is_dir());
    assert!(layout.analysis_dir().is_dir());
}
