use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::calendar::CalendarStore;

use super::{
    entities::{CalendarEntity, CALENDAR_FORMAT_VERSION},
    CalendarStorage, LoadOutcome, LoadStatus, StorageError,
};

/// Keeps a calendar as a single JSON document.
///
/// A file that fails to load is never overwritten. It is renamed to
/// `<name>.unreadable-<timestamp>` right before the first save replaces it.
pub struct FileCalendarStorage {
    path: PathBuf,
    unreadable: AtomicBool,
}

impl FileCalendarStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            unreadable: AtomicBool::new(false),
        }
    }

    async fn read(&self) -> Result<CalendarStore, StorageError> {
        debug!("Reading {:?}", self.path);
        let mut file = File::open(&self.path).await?;
        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        let entity = serde_json::from_str::<CalendarEntity>(&content)?;
        if entity.version != CALENDAR_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion(entity.version));
        }
        Ok(entity.into())
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|v| v.to_os_string())
            .unwrap_or_else(|| OsString::from("calendar"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Sibling file the snapshot is written to before replacing the real one.
    fn temp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn unreadable_path(&self, at: DateTime<Utc>) -> PathBuf {
        self.sibling_path(&format!(".unreadable-{}", at.format("%Y%m%d%H%M%S")))
    }

    async fn write_temp(temp: &Path, data: &[u8]) -> Result<(), StorageError> {
        let mut file = File::create(temp).await?;
        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::write_with_file(&mut file, data).await;
        file.unlock_async().await?;
        result
    }

    async fn write_with_file(file: &mut File, data: &[u8]) -> Result<(), StorageError> {
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn set_aside_unreadable(&self) -> Result<(), StorageError> {
        let target = self.unreadable_path(Utc::now());
        match tokio::fs::rename(&self.path, &target).await {
            Ok(()) => warn!("Moved unreadable calendar {:?} to {:?}", self.path, target),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.unreadable.store(false, Ordering::Release);
        Ok(())
    }

    async fn replace_with(&self, temp: &Path, data: &[u8]) -> Result<(), StorageError> {
        Self::write_temp(temp, data).await?;
        if self.unreadable.load(Ordering::Acquire) {
            self.set_aside_unreadable().await?;
        }
        tokio::fs::rename(temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CalendarStorage for FileCalendarStorage {
    async fn load(&self) -> LoadOutcome {
        match self.read().await {
            Ok(store) => LoadOutcome {
                store,
                status: LoadStatus::Opened,
            },
            Err(StorageError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                LoadOutcome::empty(LoadStatus::Missing)
            }
            Err(e) => {
                warn!("Calendar {:?} is unreadable {e}", self.path);
                self.unreadable.store(true, Ordering::Release);
                LoadOutcome::empty(LoadStatus::Unreadable(e.to_string()))
            }
        }
    }

    async fn save(&self, store: &CalendarStore) -> Result<(), StorageError> {
        let entity = CalendarEntity::from(store);
        if let Some(date) = entity.non_finite_date() {
            return Err(StorageError::NonFiniteHours(date));
        }
        let data = serde_json::to_vec_pretty(&entity)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        if let Err(e) = self.replace_with(&temp, &data).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        debug!("Saved {:?}", self.path);
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
