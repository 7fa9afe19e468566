// Library interface for oddpress modules
// This allows tests and the binaries to import modules

pub mod ingestion;
pub mod llm;
pub mod models;
pub mod observe;
pub mod pipeline;
pub mod render;
pub mod scoring;
pub mod scraping;
pub mod selection;
