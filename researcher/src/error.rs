use async_openai::error::OpenAIError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Openai error: {0}")]
    OpenaiError(#[from] OpenAIError),

    #[error("Http error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("No response from llm: {0}")]
    LLMResponseError(String),

    #[error("Retriever error ({0}): {1}")]
    RetrieverError(reqwest::StatusCode, String),

    #[error("Missing config: {0}")]
    MissingConfig(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("Unknown llm provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown retriever: {0}")]
    UnknownRetriever(String),

    #[error("Unknown report type: {0}")]
    UnknownReportType(String),
}
