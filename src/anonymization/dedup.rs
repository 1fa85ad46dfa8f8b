//! Content-hash deduplication and batched detection
//!
//! Blocks are grouped by the SHA-256 of their text. Detection runs once per
//! group on the representative block and the result is re-attributed to every
//! member; positions are block-local so they transfer unchanged.

use crate::anonymization::detector::Detector;
use crate::anonymization::models::{Category, Detection};
use crate::docx::Block;
use crate::domain::{BlockId, ContentHash, DocanonError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Blocks sharing identical text
#[derive(Debug, Clone)]
pub struct ContentGroup {
    pub hash: ContentHash,
    pub text: String,
    /// First member in document order
    pub representative: BlockId,
    pub members: Vec<BlockId>,
}

/// Groups blocks by content hash, in order of first appearance
pub fn group_by_content(blocks: &[Block]) -> Vec<ContentGroup> {
    let mut groups: Vec<ContentGroup> = Vec::new();
    let mut index: HashMap<ContentHash, usize> = HashMap::new();

    for block in blocks {
        let hash = ContentHash::of(&block.text);
        match index.get(&hash) {
            Some(&i) => groups[i].members.push(block.block_id.clone()),
            None => {
                index.insert(hash.clone(), groups.len());
                groups.push(ContentGroup {
                    hash,
                    text: block.text.clone(),
                    representative: block.block_id.clone(),
                    members: vec![block.block_id.clone()],
                });
            }
        }
    }

    groups
}

/// Runs the detector once per unique block content
pub fn dedupe_blocks(
    blocks: &[Block],
    detector: &dyn Detector,
    categories: &[Category],
) -> HashMap<ContentHash, Vec<Detection>> {
    group_by_content(blocks)
        .into_iter()
        .map(|g| {
            let detections = detector.detect(&g.representative, &g.text, categories);
            (g.hash, detections)
        })
        .collect()
}

/// Re-attributes representative detections to every block with the same content
///
/// Blocks whose hash is absent from `by_hash` get no entry.
pub fn expand(
    by_hash: &HashMap<ContentHash, Vec<Detection>>,
    blocks: &[Block],
) -> BTreeMap<BlockId, Vec<Detection>> {
    blocks
        .iter()
        .filter_map(|block| {
            let detections = by_hash.get(&ContentHash::of(&block.text))?;
            let attributed = detections
                .iter()
                .map(|d| d.for_block(block.block_id.clone()))
                .collect();
            Some((block.block_id.clone(), attributed))
        })
        .collect()
}

/// Parallel detection settings
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Unique blocks per worker task
    pub batch_size: usize,
    pub max_concurrency: usize,
    /// Bound on the whole detection pass for one document
    pub timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            max_concurrency: 4,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Result of a batched detection pass
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub by_hash: HashMap<ContentHash, Vec<Detection>>,
    /// False when the deadline expired before every batch finished
    pub complete: bool,
    /// Groups without results, empty when complete
    pub missing: Vec<ContentHash>,
}

type BatchResult = Result<Vec<(ContentHash, Vec<Detection>)>>;

/// Detects every group in parallel batches under one deadline.
///
/// Results are keyed by content hash so the merge does not depend on
/// completion order. When the deadline expires, outstanding batches are
/// aborted and the outcome is marked incomplete. A crashed worker is an
/// [`DocanonError::Unavailable`] failure.
pub async fn detect_batched(
    detector: Arc<dyn Detector>,
    groups: &[ContentGroup],
    categories: Arc<[Category]>,
    options: &BatchOptions,
) -> Result<BatchOutcome> {
    let deadline = tokio::time::Instant::now() + options.timeout;
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let mut tasks: JoinSet<BatchResult> = JoinSet::new();

    for (batch_no, chunk) in groups.chunks(options.batch_size.max(1)).enumerate() {
        let work: Vec<(ContentHash, BlockId, String)> = chunk
            .iter()
            .map(|g| (g.hash.clone(), g.representative.clone(), g.text.clone()))
            .collect();
        let detector = Arc::clone(&detector);
        let categories = Arc::clone(&categories);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| DocanonError::Unavailable(format!("detection pool closed: {e}")))?;
            debug!(batch = batch_no, blocks = work.len(), "Detecting batch");
            tokio::task::spawn_blocking(move || {
                work.into_iter()
                    .map(|(hash, block_id, text)| {
                        let detections = detector.detect(&block_id, &text, &categories);
                        (hash, detections)
                    })
                    .collect()
            })
            .await
            .map_err(|e| DocanonError::Unavailable(format!("detection worker failed: {e}")))
        });
    }

    let mut outcome = BatchOutcome {
        complete: true,
        ..Default::default()
    };

    loop {
        match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Ok(None) => break,
            Ok(Some(Ok(Ok(results)))) => outcome.by_hash.extend(results),
            Ok(Some(Ok(Err(e)))) => {
                tasks.abort_all();
                return Err(e);
            }
            Ok(Some(Err(e))) => {
                tasks.abort_all();
                return Err(DocanonError::Unavailable(format!(
                    "detection task failed: {e}"
                )));
            }
            Err(_) => {
                tasks.abort_all();
                outcome.complete = false;
                break;
            }
        }
    }

    outcome.missing = groups
        .iter()
        .filter(|g| !outcome.by_hash.contains_key(&g.hash))
        .map(|g| g.hash.clone())
        .collect();

    if !outcome.complete {
        warn!(
            finished = outcome.by_hash.len(),
            missing = outcome.missing.len(),
            timeout_secs = options.timeout.as_secs_f64(),
            "Detection deadline expired, results are incomplete"
        );
    }

    Ok(outcome)
}
