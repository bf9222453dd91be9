// Résumé analysis: upload, rasterize, persist, score, finalize.
// The AI backend and rasterizer sit behind traits so the pipeline can be driven
// with scripted fakes in tests.

#[cfg(test)]
pub mod fakes;
pub mod feedback;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod rasterize;
pub mod stage;

pub use pipeline::AnalysisPipeline;
