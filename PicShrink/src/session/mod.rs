//! Session state: the item registry
//!
//! [`Session`] is the single owner of every item, the shared options, the
//! preview store and the session error banner. Nothing outside this module
//! writes item fields; the pipeline reports progress through the id-keyed
//! `mark_*` operations, and concurrent tasks reach the session through a
//! [`SessionHandle`].
//!
//! Item lifecycle:
//!
//! ```text
//! Idle ──► Processing ──► Done
//!  ▲            │
//!  │            ▼
//!  └──────── Failed ──► Processing (next batch)
//! ```

pub mod config;
pub mod intake;
pub mod options;
pub mod preview;

use crate::archive::{self, ExportEntry};
use crate::image_processor::format::{InputFormat, OutputFormat};
use crate::utils::error::{PicError, Result};
use bytes::Bytes;
use intake::{validate_batch, IncomingFile};
use options::{OptionsUpdate, ProcessingOptions};
use preview::{PreviewHandle, PreviewStore};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Message shown on an item when any step of its processing fails
pub const ITEM_FAILURE_MESSAGE: &str = "Failed to process image";

/// Opaque item identifier, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Where an item is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemState {
    Idle,
    Processing,
    Done,
    Failed(String),
}

impl ItemState {
    pub fn name(&self) -> &'static str {
        match self {
            ItemState::Idle => "Idle",
            ItemState::Processing => "Processing",
            ItemState::Done => "Done",
            ItemState::Failed(_) => "Failed",
        }
    }
}

/// The image as it was submitted
#[derive(Debug, Clone)]
pub struct OriginalImage {
    pub name: String,
    pub format: InputFormat,
    pub bytes: Bytes,
    pub preview: PreviewHandle,
    pub size: u64,
}

/// A successful processing result
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Bytes,
    pub format: OutputFormat,
    /// Quality the result was produced with
    pub quality: u8,
    pub preview: PreviewHandle,
    pub size: u64,
}

/// What the pipeline hands back for a finished item
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    pub bytes: Bytes,
    pub format: OutputFormat,
    pub quality: u8,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub original: OriginalImage,
    pub processed: Option<ProcessedImage>,
    pub state: ItemState,
}

impl Item {
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ItemState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Idle and Failed items are picked up by the next batch
    pub fn is_eligible(&self) -> bool {
        matches!(self.state, ItemState::Idle | ItemState::Failed(_))
    }
}

/// Snapshot of what a pipeline task needs from an item
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: ItemId,
    pub name: String,
    pub format: InputFormat,
    pub bytes: Bytes,
}

/// Which kind of action raised the session error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    Intake,
    Batch,
}

/// Dismissable session-level error banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
}

#[derive(Debug)]
pub struct Session {
    items: Vec<Item>,
    previews: PreviewStore,
    options: ProcessingOptions,
    defaults: ProcessingOptions,
    /// Batches currently in flight
    active_batches: usize,
    error: Option<SessionError>,
    next_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_defaults(ProcessingOptions::default())
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose options start at, and reset to, `defaults`
    pub fn with_defaults(defaults: ProcessingOptions) -> Self {
        Self {
            items: Vec::new(),
            previews: PreviewStore::new(),
            options: defaults,
            defaults,
            active_batches: 0,
            error: None,
            next_id: 0,
        }
    }

    // ---- intake & removal ----

    /// Add a batch of picked files
    ///
    /// The whole batch is rejected if any file has an unsupported type; in
    /// that case no item is created and the session error is set.
    pub fn add_files(&mut self, files: Vec<IncomingFile>) -> Result<Vec<ItemId>> {
        let accepted = match validate_batch(&files) {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("Intake rejected: {}", e);
                self.set_error(SessionErrorKind::Intake, e.to_string());
                return Err(e);
            }
        };

        let mut ids = Vec::with_capacity(accepted.len());
        for file in accepted {
            self.next_id += 1;
            let id = ItemId(self.next_id);
            let size = file.bytes.len() as u64;
            let preview = self.previews.create(file.bytes.clone());

            tracing::debug!("Added {} ({}, {} bytes) as {}", file.name, file.format, size, id);
            self.items.push(Item {
                id,
                original: OriginalImage {
                    name: file.name,
                    format: file.format,
                    bytes: file.bytes,
                    preview,
                    size,
                },
                processed: None,
                state: ItemState::Idle,
            });
            ids.push(id);
        }

        self.clear_error(SessionErrorKind::Intake);
        Ok(ids)
    }

    /// Remove an item and release its previews
    ///
    /// Unknown ids are ignored. Returns whether something was removed.
    pub fn remove(&mut self, id: ItemId) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };

        let item = self.items.remove(index);
        self.previews.release(item.original.preview);
        if let Some(processed) = &item.processed {
            self.previews.release(processed.preview);
        }
        tracing::debug!("Removed {}", id);
        true
    }

    // ---- per-item transitions ----

    fn item_mut(&mut self, id: ItemId) -> Result<&mut Item> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| PicError::UnknownItem(id.to_string()))
    }

    fn invalid(id: ItemId, from: &ItemState, to: &'static str) -> PicError {
        let err = PicError::InvalidTransition {
            id: id.to_string(),
            from: from.name(),
            to,
        };
        tracing::warn!("{}", err);
        err
    }

    /// Idle/Failed → Processing
    pub fn mark_processing(&mut self, id: ItemId) -> Result<()> {
        let item = self.item_mut(id)?;
        if !item.is_eligible() {
            return Err(Self::invalid(id, &item.state, "Processing"));
        }
        item.state = ItemState::Processing;
        Ok(())
    }

    /// Processing → Done, storing the result
    pub fn mark_done(&mut self, id: ItemId, output: ProcessedOutput) -> Result<()> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| PicError::UnknownItem(id.to_string()))?;

        if self.items[index].state != ItemState::Processing {
            return Err(Self::invalid(id, &self.items[index].state, "Done"));
        }

        let preview = self.previews.create(output.bytes.clone());
        let processed = ProcessedImage {
            size: output.bytes.len() as u64,
            bytes: output.bytes,
            format: output.format,
            quality: output.quality,
            preview,
        };

        let item = &mut self.items[index];
        let superseded = item.processed.replace(processed).map(|old| old.preview);
        item.state = ItemState::Done;

        if let Some(old) = superseded {
            self.previews.release(old);
        }
        Ok(())
    }

    /// Processing → Failed
    pub fn mark_failed(&mut self, id: ItemId, message: impl Into<String>) -> Result<()> {
        let item = self.item_mut(id)?;
        if item.state != ItemState::Processing {
            return Err(Self::invalid(id, &item.state, "Failed"));
        }
        item.state = ItemState::Failed(message.into());
        Ok(())
    }

    // ---- batch bookkeeping ----

    /// Snapshot of every item the next batch should process
    pub fn eligible_work(&self) -> Vec<WorkItem> {
        self.items
            .iter()
            .filter(|item| item.is_eligible())
            .map(Self::work_of)
            .collect()
    }

    /// Ids of every item the next batch should process
    pub fn eligible_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.is_eligible())
            .map(|item| item.id)
            .collect()
    }

    /// Snapshot of one item, whatever its state
    pub fn work_item(&self, id: ItemId) -> Result<WorkItem> {
        self.get(id)
            .map(Self::work_of)
            .ok_or_else(|| PicError::UnknownItem(id.to_string()))
    }

    fn work_of(item: &Item) -> WorkItem {
        WorkItem {
            id: item.id,
            name: item.original.name.clone(),
            format: item.original.format,
            bytes: item.original.bytes.clone(),
        }
    }

    /// Start a batch: snapshot eligible work and the options it runs with
    ///
    /// With nothing eligible the session error is set and items are left
    /// alone.
    pub fn begin_batch(&mut self) -> Result<(Vec<WorkItem>, ProcessingOptions)> {
        let work = self.eligible_work();
        if work.is_empty() {
            tracing::warn!("Batch requested with no eligible items");
            self.set_error(SessionErrorKind::Batch, PicError::NothingToProcess.to_string());
            return Err(PicError::NothingToProcess);
        }

        self.active_batches += 1;
        self.clear_error(SessionErrorKind::Batch);
        Ok((work, self.options))
    }

    pub fn end_batch(&mut self) {
        self.active_batches = self.active_batches.saturating_sub(1);
    }

    /// True while any batch is still running
    pub fn is_processing(&self) -> bool {
        self.active_batches > 0
    }

    // ---- options ----

    pub fn options(&self) -> ProcessingOptions {
        self.options
    }

    pub fn set_options(&mut self, update: OptionsUpdate) {
        self.options.merge(update);
        tracing::debug!("Options now {:?}", self.options);
    }

    // ---- error banner ----

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, kind: SessionErrorKind, message: impl Into<String>) {
        self.error = Some(SessionError {
            kind,
            message: message.into(),
        });
    }

    /// Clear the banner if it was raised by `kind`
    pub fn clear_error(&mut self, kind: SessionErrorKind) {
        if self.error.as_ref().is_some_and(|e| e.kind == kind) {
            self.error = None;
        }
    }

    // ---- reads ----

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn processed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.state == ItemState::Done)
            .count()
    }

    /// Archive entries for every Done item
    pub fn export_entries(&self) -> Vec<ExportEntry> {
        archive::export_entries(&self.items)
    }

    /// Resolve a preview handle to its bytes
    pub fn preview(&self, handle: PreviewHandle) -> Result<Bytes> {
        self.previews.resolve(handle)
    }

    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    // ---- reset ----

    /// Drop every item, release every preview, restore default options
    pub fn reset(&mut self) {
        let released = self.previews.release_all();
        tracing::debug!(
            "Reset session: {} items, {} previews released",
            self.items.len(),
            released
        );
        self.items.clear();
        self.options = self.defaults;
        self.active_batches = 0;
        self.error = None;
    }
}

/// Shared access to a [`Session`] from concurrent pipeline tasks
///
/// The lock is only ever held for a single synchronous operation.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    /// Lock the session, ignoring poisoning
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
