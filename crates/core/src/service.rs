//! Orchestration of one analysis from submitted text to stored record.

use crate::analyzer::{AnalysisRequest, Analyzer};
use crate::assembler::Assembler;
use crate::config::CoreConfig;
use crate::error::{AnalysisResult, StorageResult};
use crate::history::HistoryStore;
use crate::record::AnalysisRecord;
use crate::segments::{partition, Segment};
use crate::storage::KeyValueStorage;
use crate::validation::validate_conversation;
use rda_types::DetailLevel;
use rda_uuid::{Identifier, MonotonicClock, UuidGenerator};
use std::sync::Arc;

/// Owns the history and drives analyses through validation, the analyzer and the assembler.
///
/// Shared between request handlers behind an `Arc`; all methods take `&self`.
pub struct AnalysisService {
    analyzer: Arc<dyn Analyzer>,
    assembler: Assembler,
    history: HistoryStore,
    max_protocol_length: usize,
    detail_level: DetailLevel,
    toxicity_threshold: u8,
}

impl AnalysisService {
    pub fn new(
        config: &CoreConfig,
        analyzer: Arc<dyn Analyzer>,
        assembler: Assembler,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        Self {
            analyzer,
            assembler,
            history: HistoryStore::load(storage, config.history_capacity()),
            max_protocol_length: config.max_protocol_length(),
            detail_level: config.detail_level(),
            toxicity_threshold: config.toxicity_threshold(),
        }
    }

    /// Opens a service persisting to `config.data_dir()`, with random identifiers and
    /// strictly increasing creation timestamps.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the data directory cannot be created.
    pub fn open(config: &CoreConfig, analyzer: Arc<dyn Analyzer>) -> StorageResult<Self> {
        let store = rda_files::FileStore::new(config.data_dir())?;
        tracing::info!(data_dir = %store.storage_dir().display(), "opened history storage");
        let assembler = Assembler::new(
            Arc::new(UuidGenerator),
            Arc::new(MonotonicClock::new()),
        );
        Ok(Self::new(config, analyzer, assembler, Arc::new(store)))
    }

    /// Analyzes `conversation` at the configured detail level and stores the result.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for blank or over-long text; nothing is sent or stored.
    /// - `AnalyzerUnavailable` if the analyzer fails.
    /// - `SchemaValidation` if the analyzer's response is malformed; nothing is stored.
    pub async fn analyze(
        &self,
        conversation: &str,
        context: &str,
    ) -> AnalysisResult<AnalysisRecord> {
        self.analyze_with_detail(conversation, context, self.detail_level)
            .await
    }

    /// Like [`analyze`](Self::analyze) with an explicit detail level.
    pub async fn analyze_with_detail(
        &self,
        conversation: &str,
        context: &str,
        detail_level: DetailLevel,
    ) -> AnalysisResult<AnalysisRecord> {
        let conversation = validate_conversation(conversation, self.max_protocol_length)?;
        let request = AnalysisRequest {
            conversation,
            context: context.to_owned(),
            detail_level,
        };

        tracing::info!(
            chars = request.conversation.char_count(),
            detail_level = %detail_level,
            "requesting analysis"
        );
        let raw = self.analyzer.analyze(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "analyzer unavailable");
            e
        })?;

        self.store(&raw, request.conversation.as_str(), context)
    }

    /// Assembles and stores a previously saved analyzer response without contacting the
    /// analyzer.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for blank or over-long text, `SchemaValidation` for a malformed response.
    pub fn import(
        &self,
        raw: &serde_json::Value,
        conversation: &str,
        context: &str,
    ) -> AnalysisResult<AnalysisRecord> {
        let conversation = validate_conversation(conversation, self.max_protocol_length)?;
        self.store(raw, conversation.as_str(), context)
    }

    fn store(
        &self,
        raw: &serde_json::Value,
        source_text: &str,
        context: &str,
    ) -> AnalysisResult<AnalysisRecord> {
        let record = self
            .assembler
            .assemble_with_context(raw, source_text, context)
            .map_err(|e| {
                tracing::warn!(path = %e.path, "analyzer response rejected");
                e
            })?;
        self.history.add(record.clone());
        tracing::info!(id = %record.id(), score = record.score(), "analysis stored");
        Ok(record)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Display segments for a stored record, or `None` if no record has that id.
    pub fn segments(&self, id: Identifier) -> Option<Vec<Segment>> {
        self.history
            .get(id)
            .map(|record| partition(record.source_text(), record.patterns()))
    }

    pub fn toxicity_threshold(&self) -> u8 {
        self.toxicity_threshold
    }

    pub fn detail_level(&self) -> DetailLevel {
        self.detail_level
    }
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("history", &self.history)
            .field("max_protocol_length", &self.max_protocol_length)
            .field("detail_level", &self.detail_level)
            .finish_non_exhaustive()
    }
}
