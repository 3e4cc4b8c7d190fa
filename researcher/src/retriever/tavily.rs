use crate::retriever::{Retriever, SearchResult};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

pub struct Tavily {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl From<TavilyResult> for SearchResult {
    fn from(result: TavilyResult) -> Self {
        Self {
            title: result.title,
            url: result.url,
            content: result.content,
        }
    }
}

impl Tavily {
    pub fn new(api_key: &str) -> Result<std::sync::Arc<Self>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(std::sync::Arc::new(Self {
            api_key: api_key.to_string(),
            client,
        }))
    }
}

fn parse_response(body: &str) -> Result<Vec<SearchResult>> {
    let response: TavilySearchResponse = serde_json::from_str(body)?;
    Ok(response.results.into_iter().map(SearchResult::from).collect())
}

#[async_trait]
impl Retriever for Tavily {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let request = TavilySearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: "basic",
            include_raw_content: false,
        };

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::RetrieverError(status, body));
        }

        let results = parse_response(&body)?;
        debug!(query, results = results.len(), "tavily search");
        Ok(results)
    }
}
