use crate::{
    likes::{LikeLedger, LikePersistence},
    record::{JourneyRecord, LikeRecord, Record, UserRecord},
    store::{RecordStore, Result},
};
use serde::Deserialize;
use std::{collections::HashMap, fmt::Display, sync::Arc};
use tracing::{info, warn};
use tripline_common::model::{
    Id, ModelValidationError,
    journey::{Journey, JourneyMarker},
    like::Like,
    user::{User, UserMarker},
};

/// How long loaded data lives and whether like changes reach storage.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Load once per process; like changes are written back to storage.
    #[default]
    Durable,
    /// Load on every request; like changes live only as long as that request.
    Ephemeral,
}

impl Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StorageMode::Durable => "durable",
            StorageMode::Ephemeral => "ephemeral",
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Users(HashMap<Id<UserMarker>, User>);

impl Users {
    #[must_use]
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self(users.into_iter().map(|user| (user.id.clone(), user)).collect())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&User> {
        self.0.get(id)
    }

    /// The user's display name, or the raw id for users that do not exist.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |user| user.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Journeys {
    list: Vec<Journey>,
    by_id: HashMap<Id<JourneyMarker>, usize>,
}

impl Journeys {
    /// Later journeys win lookups by id when ids repeat; iteration still yields every journey.
    #[must_use]
    pub fn new(list: Vec<Journey>) -> Self {
        let by_id = list
            .iter()
            .enumerate()
            .map(|(index, journey)| (journey.id.clone(), index))
            .collect();

        Self { list, by_id }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Journey> {
        self.by_id.get(id).map(|&index| &self.list[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Journey> {
        self.list.iter()
    }

    pub fn by_author<'a>(&'a self, author: &'a str) -> impl Iterator<Item = &'a Journey> {
        self.list
            .iter()
            .filter(move |journey| journey.author.as_str() == author)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Everything a request reads: users and journeys, fixed after loading, and the likes ledger.
#[derive(Debug)]
pub struct Repositories {
    pub users: Users,
    pub journeys: Journeys,
    pub likes: LikeLedger,
}

impl Repositories {
    pub async fn load(store: &RecordStore, mode: StorageMode) -> Result<Self> {
        let users = Users::new(load_models::<UserRecord, User>(store.load().await?));
        let journeys = Journeys::new(load_models::<JourneyRecord, Journey>(store.load().await?));

        let (likes, persistence) = match mode {
            StorageMode::Durable => (
                store.load_or_create::<LikeRecord>().await?,
                LikePersistence::Durable(store.clone()),
            ),
            StorageMode::Ephemeral => {
                let likes = store.load::<LikeRecord>().await.unwrap_or_else(|err| {
                    warn!(error = %err, "Likes unavailable, starting empty");
                    Vec::new()
                });
                (likes, LikePersistence::Discard)
            }
        };
        let likes = LikeLedger::new(load_models::<LikeRecord, Like>(likes), persistence);

        Ok(Self {
            users,
            journeys,
            likes,
        })
    }
}

fn load_models<R, M>(records: Vec<R>) -> Vec<M>
where
    R: Record,
    M: TryFrom<R, Error = ModelValidationError>,
{
    records
        .into_iter()
        .filter_map(|record| {
            M::try_from(record)
                .inspect_err(|err| warn!(kind = ?R::KIND, error = %err, "Skipping invalid record"))
                .ok()
        })
        .collect()
}

/// Hands out the repositories each request works against.
#[derive(Clone, Debug)]
pub enum RepositorySource {
    /// One set of repositories shared by every request.
    Shared(Arc<Repositories>),
    /// A fresh set loaded from the store for every request.
    PerRequest(RecordStore),
}

impl RepositorySource {
    /// Loads the collections once, failing early when required data is missing.
    pub async fn open(store: RecordStore, mode: StorageMode) -> Result<Self> {
        let repositories = Repositories::load(&store, mode).await?;
        info!(
            %mode,
            users = repositories.users.len(),
            journeys = repositories.journeys.len(),
            "Loaded repositories"
        );

        Ok(match mode {
            StorageMode::Durable => RepositorySource::Shared(Arc::new(repositories)),
            StorageMode::Ephemeral => RepositorySource::PerRequest(store),
        })
    }

    #[must_use]
    pub fn mode(&self) -> StorageMode {
        match self {
            RepositorySource::Shared(_) => StorageMode::Durable,
            RepositorySource::PerRequest(_) => StorageMode::Ephemeral,
        }
    }

    pub async fn repositories(&self) -> Result<Arc<Repositories>> {
        match self {
            RepositorySource::Shared(repositories) => Ok(Arc::clone(repositories)),
            RepositorySource::PerRequest(store) => Ok(Arc::new(
                Repositories::load(store, StorageMode::Ephemeral).await?,
            )),
        }
    }
}
