use std::sync::Arc;

use crate::analysis::pipeline::AnalysisPipeline;
#[cfg(test)]
use crate::analysis::{feedback::FeedbackBackend, rasterize::Rasterizer};
use crate::config::Config;
use crate::records::RecordStore;
use crate::storage::ContentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub records: RecordStore,
    /// Read side of the content store, used to serve preview images.
    pub content: Arc<dyn ContentStore>,
    pub pipeline: AnalysisPipeline,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    /// State over in-memory stores with a working rasterizer and an AI backend that
    /// always fails. Enough for every route that does not run the pipeline.
    pub fn for_tests(config: Config) -> Self {
        use crate::analysis::fakes::{FakeRasterizer, ScriptedBackend};

        Self::for_tests_with(
            config,
            Arc::new(FakeRasterizer { fail: false }),
            Arc::new(ScriptedBackend::failing()),
        )
    }

    /// State over in-memory stores with the given pipeline collaborators.
    pub fn for_tests_with(
        config: Config,
        rasterizer: Arc<dyn Rasterizer>,
        feedback: Arc<dyn FeedbackBackend>,
    ) -> Self {
        use crate::storage::memory::{InMemoryContentStore, InMemoryKvStore};

        let content: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
        let records = RecordStore::new(Arc::new(InMemoryKvStore::new()));
        let pipeline =
            AnalysisPipeline::new(content.clone(), records.clone(), rasterizer, feedback);
        Self {
            records,
            content,
            pipeline,
            config,
        }
    }
}
