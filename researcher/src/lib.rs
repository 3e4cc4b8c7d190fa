mod config;
mod error;
pub mod llm;
mod report;
pub mod retriever;
mod session;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use config::{EngineConfig, LlmProvider, LlmSpec, ModelTier, RetrieverKind, mask_key};
pub use report::ReportType;
pub use session::{GPTResearcher, ResearchSession, ResearcherBuilder};
