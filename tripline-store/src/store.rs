use crate::record::Record;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Reading {path} failed: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Writing {path} failed: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("{path} is not valid CSV: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Encoding records for {path} failed: {source}")]
    Encode { path: PathBuf, source: csv::Error },
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum RecordKind {
    Users,
    Journeys,
    Likes,
}

impl RecordKind {
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Users => "users.csv",
            RecordKind::Journeys => "journeys.csv",
            RecordKind::Likes => "likes.csv",
        }
    }
}

/// Collections of records kept as one CSV file each inside a directory.
///
/// The first line of every file is a header naming the columns; each following line is one
/// record. Writes replace a whole collection at once.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path(&self, kind: RecordKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub async fn load<R: Record>(&self) -> Result<Vec<R>> {
        let path = self.path(R::KIND);
        let contents = tokio::fs::read(&path).await.map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;

        let records = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(contents.as_slice())
            .deserialize()
            .collect::<Result<Vec<R>, _>>()
            .map_err(|source| StoreError::Csv { path, source })?;

        debug!(kind = ?R::KIND, count = records.len(), "Loaded records");
        Ok(records)
    }

    /// Loads a collection that may not exist yet, creating it with only a header if missing.
    pub async fn load_or_create<R: Record>(&self) -> Result<Vec<R>> {
        let path = self.path(R::KIND);
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;

        if !exists {
            info!(path = %path.display(), "Creating empty record collection");
            self.persist::<R>(&[]).await?;
            return Ok(Vec::new());
        }

        self.load().await
    }

    /// Replaces a collection. The new contents are written to a temporary file that is then
    /// renamed over the old one, so readers see either the old or the new collection.
    pub async fn persist<R: Record>(&self, records: &[R]) -> Result<()> {
        let path = self.path(R::KIND);
        let encoded = encode(records).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;

        let mut tmp_name = path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        if let Err(source) = tokio::fs::write(&tmp_path, &encoded).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Write {
                path: tmp_path,
                source,
            });
        }

        if let Err(source) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Write { path, source });
        }

        debug!(kind = ?R::KIND, count = records.len(), "Persisted records");
        Ok(())
    }
}

fn encode<R: Record>(records: &[R]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(R::HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
