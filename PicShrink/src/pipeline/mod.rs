//! Conversion pipeline
//!
//! Drives each item through compress → (skip or convert) → done/failed.
//! Pixel work runs on the blocking pool; the session lock is taken only for
//! the id-keyed state updates in between, never across an await.

use crate::compression::{CompressionConfig, Compressor, ImageCompressor};
use crate::image_processor::format::{InputFormat, OutputFormat};
use crate::image_processor::magic::sniff;
use crate::image_processor::CodecAdapter;
use crate::session::options::ProcessingOptions;
use crate::session::{ItemId, ProcessedOutput, SessionHandle, WorkItem, ITEM_FAILURE_MESSAGE};
use crate::utils::error::{PicError, Result};
use bytes::Bytes;
use std::sync::Arc;
use tokio::task::{self, JoinSet};

/// Outcome counts for one `process_all` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items removed before their result could be recorded
    pub dropped: usize,
}

/// How one item's run ended
#[derive(Debug)]
pub enum ItemOutcome {
    Done,
    /// The item is now Failed; the cause is also logged
    Failed(PicError),
    /// The item was removed while it was being processed
    Dropped,
}

/// Whether compressed bytes can be used as the final output
///
/// True when the item is already in the target format and compression made
/// it strictly smaller.
pub fn should_skip_conversion(
    original: InputFormat,
    original_len: usize,
    target: OutputFormat,
    compressed_len: usize,
) -> bool {
    original.as_output() == Some(target) && compressed_len < original_len
}

#[derive(Clone)]
pub struct Pipeline {
    session: SessionHandle,
    compressor: Arc<dyn Compressor>,
    adapter: Arc<CodecAdapter>,
}

impl Pipeline {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            compressor: Arc::new(ImageCompressor::default()),
            adapter: Arc::new(CodecAdapter::default()),
        }
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_adapter(mut self, adapter: CodecAdapter) -> Self {
        self.adapter = Arc::new(adapter);
        self
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Process every Idle or Failed item concurrently
    ///
    /// Fails only when there is nothing to process. Individual item
    /// failures are recorded on the items and counted in the report.
    pub async fn process_all(&self) -> Result<BatchReport> {
        let (work, options) = self.session.lock().begin_batch()?;

        let mut report = BatchReport {
            attempted: work.len(),
            ..Default::default()
        };
        tracing::info!(
            "Processing {} images as {} at quality {}",
            report.attempted,
            options.format,
            options.quality
        );

        let mut tasks = JoinSet::new();
        for item in work {
            let pipeline = self.clone();
            tasks.spawn(async move { pipeline.process_item(item, options).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(ItemOutcome::Done)) => report.succeeded += 1,
                Ok(Ok(ItemOutcome::Failed(_))) => report.failed += 1,
                Ok(Ok(ItemOutcome::Dropped)) => report.dropped += 1,
                Ok(Err(e)) => {
                    tracing::debug!("Item not started: {}", e);
                    report.dropped += 1;
                }
                Err(e) => {
                    tracing::error!("Pipeline task aborted: {}", e);
                    report.failed += 1;
                }
            }
        }

        self.session.lock().end_batch();
        tracing::info!(
            "Batch finished: {} done, {} failed, {} dropped",
            report.succeeded,
            report.failed,
            report.dropped
        );
        Ok(report)
    }

    /// Process a single item with the current options
    pub async fn process_one(&self, id: ItemId) -> Result<ItemOutcome> {
        let (work, options) = {
            let session = self.session.lock();
            (session.work_item(id)?, session.options())
        };
        self.process_item(work, options).await
    }

    /// Run one item through the pipeline and record the outcome
    ///
    /// Errors only when the item cannot enter Processing.
    pub async fn process_item(
        &self,
        work: WorkItem,
        options: ProcessingOptions,
    ) -> Result<ItemOutcome> {
        self.session.lock().mark_processing(work.id)?;
        tracing::debug!("Processing {} ({})", work.id, work.name);

        let id = work.id;
        match self.run(work, options).await {
            Ok(output) => {
                let size = output.bytes.len();
                let recorded = self.session.lock().mark_done(id, output);
                match recorded {
                    Ok(()) => {
                        tracing::info!("{} done, {} bytes", id, size);
                        Ok(ItemOutcome::Done)
                    }
                    Err(e) => {
                        tracing::debug!("Dropping result for {}: {}", id, e);
                        Ok(ItemOutcome::Dropped)
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to process {}: {}", id, e);
                let recorded = self.session.lock().mark_failed(id, ITEM_FAILURE_MESSAGE);
                match recorded {
                    Ok(()) => Ok(ItemOutcome::Failed(e)),
                    Err(gone) => {
                        tracing::debug!("Dropping failure for {}: {}", id, gone);
                        Ok(ItemOutcome::Dropped)
                    }
                }
            }
        }
    }

    async fn run(&self, work: WorkItem, options: ProcessingOptions) -> Result<ProcessedOutput> {
        let config = CompressionConfig::from_options(work.format, &options);
        let compressor = Arc::clone(&self.compressor);
        let source = work.bytes.clone();
        let compressed = task::spawn_blocking(move || compressor.compress(&source, work.format, &config))
            .await
            .map_err(|e| PicError::Compression(format!("Task join error: {}", e)))??;

        if should_skip_conversion(work.format, work.bytes.len(), options.format, compressed.len()) {
            tracing::debug!(
                "{} is already {} and smaller after compression, skipping conversion",
                work.id,
                options.format
            );
            return Ok(ProcessedOutput {
                bytes: Bytes::from(compressed),
                format: options.format,
                quality: options.quality,
            });
        }

        let declared = sniff(&compressed).unwrap_or(work.format);
        let adapter = Arc::clone(&self.adapter);
        let (target, quality) = (options.format, options.quality);
        let converted = task::spawn_blocking(move || adapter.convert(&compressed, declared, target, quality))
            .await
            .map_err(|e| PicError::Encode(format!("Task join error: {}", e)))??;

        Ok(ProcessedOutput {
            bytes: Bytes::from(converted),
            format: target,
            quality,
        })
    }
}
