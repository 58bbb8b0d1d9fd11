//! Preview handles
//!
//! A preview handle stands for a displayable copy of some image bytes. Each
//! handle is created by the session and released exactly once, either when
//! its item goes away or when a newer processed result replaces it.
//! Resolving a released handle is an error, not a dangling read.

use crate::utils::error::{PicError, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

/// Opaque reference to bytes held by a [`PreviewStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewHandle(u64);

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview:{}", self.0)
    }
}

/// Arena of live preview handles
#[derive(Debug, Default)]
pub struct PreviewStore {
    next_id: u64,
    live: HashMap<PreviewHandle, Bytes>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return a fresh handle
    ///
    /// Handles are never reused, even after release.
    pub fn create(&mut self, bytes: Bytes) -> PreviewHandle {
        self.next_id += 1;
        let handle = PreviewHandle(self.next_id);
        self.live.insert(handle, bytes);
        handle
    }

    /// Bytes behind a live handle
    pub fn resolve(&self, handle: PreviewHandle) -> Result<Bytes> {
        self.live
            .get(&handle)
            .cloned()
            .ok_or(PicError::PreviewReleased(handle.0))
    }

    /// Release a handle; `false` if it was already gone
    pub fn release(&mut self, handle: PreviewHandle) -> bool {
        let released = self.live.remove(&handle).is_some();
        if !released {
            tracing::warn!("{} released twice", handle);
        }
        released
    }

    /// Release every live handle, returning how many there were
    pub fn release_all(&mut self) -> usize {
        let count = self.live.len();
        self.live.clear();
        count
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
