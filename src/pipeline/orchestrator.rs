//! Query resolution pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::{ChatBackend, ChatOptions, OllamaBackend, ResponseGenerator};
use crate::config::{AssistantConfig, ConfigurationError};
use crate::knowledge::{Category, ContextItem, KnowledgeStore, StoreError};
use crate::web::WebRetriever;

use super::state::{ResolutionStage, ResolutionTracker};

/// Answer to one query, with the context it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub response_text: String,
    /// Local items first, then freshly retrieved web items.
    pub context_used: Vec<ContextItem>,
}

/// Sequences lookup, retrieval, persistence and generation for one query.
///
/// `resolve` takes `&self`, so independent queries may run concurrently on a
/// shared orchestrator; the store serializes their writes.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: KnowledgeStore,
    retriever: WebRetriever,
    generator: ResponseGenerator,
}

impl Orchestrator {
    #[must_use]
    pub fn new(store: KnowledgeStore, retriever: WebRetriever, generator: ResponseGenerator) -> Self {
        Self {
            store,
            retriever,
            generator,
        }
    }

    /// Build every component from configuration.
    ///
    /// The generative backend is probed once here. If it is disabled or
    /// unreachable, the orchestrator answers from the template for its whole
    /// lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the knowledge store cannot be opened or a network
    /// client cannot be built.
    pub async fn from_config(config: &AssistantConfig) -> Result<Self, ConfigurationError> {
        let store = KnowledgeStore::open(&config.store.path)
            .await
            .map_err(|source| ConfigurationError::StoreUnavailable {
                path: config.store.path.clone(),
                source,
            })?;

        let retriever = WebRetriever::from_config(&config.web)?;

        let generation = &config.generation;
        let backend: Option<Arc<dyn ChatBackend>> = if generation.enabled {
            let backend = OllamaBackend::from_config(generation)?;
            if backend
                .probe(generation.probe_attempts, generation.probe_delay())
                .await
            {
                tracing::info!(model = %backend.model(), "Using generative backend");
                Some(Arc::new(backend))
            } else {
                tracing::warn!("Falling back to templated responses");
                None
            }
        } else {
            tracing::info!("Generative backend disabled");
            None
        };

        let generator = ResponseGenerator::new(backend, ChatOptions::from(generation));
        Ok(Self::new(store, retriever, generator))
    }

    #[must_use]
    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    #[must_use]
    pub fn generator(&self) -> &ResponseGenerator {
        &self.generator
    }

    /// Resolve `query` to an answer.
    ///
    /// Web retrieval runs only when `opt_in_web` is set. A failing stage
    /// contributes nothing and the pipeline carries on, so this always
    /// returns an answer.
    pub async fn resolve(&self, query: &str, opt_in_web: bool) -> QueryResult {
        let mut tracker = ResolutionTracker::new();
        tracing::info!(query = %query, opt_in_web, "Resolving query");

        tracker.transition(ResolutionStage::LocalLookup);
        let local = match self.store.query(query).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Local lookup failed, continuing without cached knowledge");
                tracker.record_degraded();
                Vec::new()
            }
        };
        tracker.record_local_hits(local.len());

        let web = if opt_in_web {
            tracker.transition(ResolutionStage::WebLookup);
            self.retriever.retrieve(query).await
        } else {
            Vec::new()
        };
        tracker.record_web_hits(web.len());

        if !web.is_empty() {
            tracker.transition(ResolutionStage::Persist);
            match self.store.store(&web, Category::WebScrape).await {
                Ok(()) => tracker.record_persisted(web.len()),
                Err(StoreError::PartialWrite { stored, failed }) => {
                    tracing::warn!(stored, failed, "Some web knowledge was not persisted");
                    tracker.record_persisted(stored);
                    tracker.record_degraded();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to persist web knowledge");
                    tracker.record_degraded();
                }
            }
        }

        tracker.transition(ResolutionStage::Generate);
        let mut context = local;
        context.extend(web);
        let response_text = self.generator.generate(query, &context).await;

        tracker.transition(ResolutionStage::Deliver);
        let stats = tracker.stats();
        tracing::info!(
            local_hits = stats.local_hits,
            web_hits = stats.web_hits,
            persisted = stats.persisted,
            degraded = ?stats.degraded,
            "Query resolved"
        );

        QueryResult {
            response_text,
            context_used: context,
        }
    }

    /// Add a hand-written fact to the store as a local record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmptyContent` for blank content, or any store error.
    pub async fn learn(&self, source: &str, content: &str) -> Result<(), StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::EmptyContent);
        }
        self.store
            .store(&[ContextItem::new(source, content)], Category::Local)
            .await
    }
}
