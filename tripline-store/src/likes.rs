//! The likes collection, the one piece of state that changes while the service runs.

use crate::{
    record::LikeRecord,
    store::{RecordStore, Result as StoreResult},
};
use serde::Serialize;
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard, mpsc, oneshot};
use tracing::{debug, error, warn};
use tripline_common::{
    derived,
    model::{
        Id,
        journey::JourneyMarker,
        like::{Like, LikeAction},
        user::UserMarker,
    },
};

/// What happens to the likes collection after a change.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum LikePersistence {
    /// Rewrite the likes file after every change.
    Durable(RecordStore),
    /// Keep changes in memory only.
    Discard,
}

impl LikePersistence {
    async fn persist(&self, likes: &[Like]) -> StoreResult<()> {
        match self {
            LikePersistence::Durable(store) => {
                let records: Vec<LikeRecord> = likes.iter().map(LikeRecord::from).collect();
                store.persist(&records).await
            }
            LikePersistence::Discard => Ok(()),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
pub struct LikeSummary {
    pub like_count: usize,
    pub liked_by_me: bool,
    pub global_like_count: usize,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The like queue has shut down")]
pub struct LikeQueueClosedError;

struct Mutation {
    post_id: Id<JourneyMarker>,
    user_id: Id<UserMarker>,
    action: LikeAction,
    done: oneshot::Sender<LikeSummary>,
}

/// Owner of the likes collection.
///
/// Changes are queued to a single worker task which applies them one at a time: check the
/// current state, update memory, persist, then report back. A queued change runs to completion
/// even if the caller stops waiting for it. Reads share a lock with the worker and therefore
/// never see a change half applied.
#[derive(Debug)]
pub struct LikeLedger {
    likes: Arc<RwLock<Vec<Like>>>,
    queue: mpsc::UnboundedSender<Mutation>,
}

impl LikeLedger {
    /// Starts the worker for a ledger holding `likes`. Must be called inside a tokio runtime.
    ///
    /// Duplicate `(post_id, user_id)` pairs in `likes` are dropped, keeping the first.
    #[must_use]
    pub fn new(likes: Vec<Like>, persistence: LikePersistence) -> Self {
        let likes = Arc::new(RwLock::new(dedup(likes)));
        let (queue, pending) = mpsc::unbounded_channel();

        tokio::spawn(run_queue(Arc::clone(&likes), persistence, pending));

        Self { likes, queue }
    }

    /// Queues `action` for the pair and waits until it has been applied.
    ///
    /// Liking an already liked post and unliking a post that is not liked change nothing and
    /// skip persistence. The returned summary reflects the collection right after this change.
    pub async fn apply(
        &self,
        post_id: Id<JourneyMarker>,
        user_id: Id<UserMarker>,
        action: LikeAction,
    ) -> Result<LikeSummary, LikeQueueClosedError> {
        let (done, applied) = oneshot::channel();
        self.queue
            .send(Mutation {
                post_id,
                user_id,
                action,
                done,
            })
            .map_err(|_| LikeQueueClosedError)?;

        applied.await.map_err(|_| LikeQueueClosedError)
    }

    /// A consistent read-only view of the collection. Queued changes wait while it is held.
    pub async fn view(&self) -> LikesView<'_> {
        LikesView(self.likes.read().await)
    }
}

pub struct LikesView<'a>(RwLockReadGuard<'a, Vec<Like>>);

impl LikesView<'_> {
    #[must_use]
    pub fn like_count(&self, post_id: &str) -> usize {
        derived::like_count(&self.0, post_id)
    }

    #[must_use]
    pub fn liked_by(&self, post_id: &str, user_id: &str) -> bool {
        derived::liked_by(&self.0, post_id, user_id)
    }

    #[must_use]
    pub fn global_like_count(&self) -> usize {
        derived::global_like_count(&self.0)
    }

    #[must_use]
    pub fn summary(&self, post_id: &str, user_id: &str) -> LikeSummary {
        summarize(&self.0, post_id, user_id)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Like] {
        &self.0
    }
}

async fn run_queue(
    collection: Arc<RwLock<Vec<Like>>>,
    persistence: LikePersistence,
    mut pending: mpsc::UnboundedReceiver<Mutation>,
) {
    while let Some(mutation) = pending.recv().await {
        let mut likes = collection.write().await;
        let post_id = mutation.post_id.as_str();
        let user_id = mutation.user_id.as_str();
        let existing = likes.iter().position(|like| like.is_by(post_id, user_id));

        let changed = match (mutation.action, existing) {
            (LikeAction::Like, None) => {
                likes.push(Like::new(mutation.post_id.clone(), mutation.user_id.clone()));
                true
            }
            (LikeAction::Unlike, Some(index)) => {
                likes.remove(index);
                true
            }
            (LikeAction::Like, Some(_)) | (LikeAction::Unlike, None) => false,
        };

        debug!(%post_id, %user_id, action = %mutation.action, changed, "Applied like action");

        if changed && let Err(err) = persistence.persist(&likes).await {
            // The in-memory change stands; the next successful write catches storage up.
            error!(error = %err, "Persisting likes failed");
        }

        let summary = summarize(&likes, post_id, user_id);
        drop(likes);

        if mutation.done.send(summary).is_err() {
            debug!(%post_id, %user_id, "Like action finished after its caller left");
        }
    }
}

fn summarize(likes: &[Like], post_id: &str, user_id: &str) -> LikeSummary {
    LikeSummary {
        like_count: derived::like_count(likes, post_id),
        liked_by_me: derived::liked_by(likes, post_id, user_id),
        global_like_count: derived::global_like_count(likes),
    }
}

fn dedup(likes: Vec<Like>) -> Vec<Like> {
    let total = likes.len();
    let mut seen = HashSet::new();
    let unique: Vec<Like> = likes
        .into_iter()
        .filter(|like| seen.insert((like.post_id.clone(), like.user_id.clone())))
        .collect();

    if unique.len() != total {
        warn!(
            dropped = total - unique.len(),
            "Ignoring duplicate likes in storage"
        );
    }
    unique
}
