use crate::Result;
use async_trait::async_trait;

mod tavily;
pub use tavily::Tavily;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[async_trait]
pub trait Retriever {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}
