pub mod likes;
pub mod record;
pub mod repository;
pub mod store;

pub use likes::{LikeLedger, LikePersistence, LikeSummary, LikesView};
pub use repository::{Journeys, Repositories, RepositorySource, StorageMode, Users};
pub use store::{RecordKind, RecordStore, StoreError};
