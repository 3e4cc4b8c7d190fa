use crate::config::{EngineConfig, RetrieverKind};
use crate::llm::{self, CompletionRequest, LLM, Message};
use crate::report::{ReportType, render};
use crate::retriever::{Retriever, Tavily};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = include_str!("prompts/system.md");
const SUB_QUERIES_PROMPT: &str = include_str!("prompts/sub_queries.md");

/// The three operations a research run is made of. Callers invoke them in
/// order: research, then report, then sources.
#[async_trait]
pub trait ResearchSession {
    async fn conduct_research(&mut self) -> Result<()>;

    async fn write_report(&self) -> Result<String>;

    fn get_source_urls(&self) -> Vec<String>;
}

type SharedLLM = Arc<dyn LLM + Send + Sync>;
type SharedRetriever = Arc<dyn Retriever + Send + Sync>;

pub struct GPTResearcher {
    query: String,
    report_type: ReportType,
    fast_llm: SharedLLM,
    smart_llm: SharedLLM,
    retriever: SharedRetriever,
    max_sub_queries: usize,
    max_results_per_query: usize,
    total_words: usize,
    context: Vec<String>,
    visited_urls: Vec<String>,
    seen: HashSet<String>,
}

impl GPTResearcher {
    /// Builds a session with the providers named in `config`.
    pub fn new(config: &EngineConfig, query: &str, report_type: &str) -> Result<Self> {
        let report_type = report_type.parse()?;

        let fast_llm =
            llm::OpenAI::new(&config.fast_llm, config.api_key(config.fast_llm.provider)?);
        let smart_llm =
            llm::OpenAI::new(&config.smart_llm, config.api_key(config.smart_llm.provider)?);
        debug!(fast = fast_llm.model(), smart = smart_llm.model(), "llm clients ready");

        let retriever: SharedRetriever = match config.retriever {
            RetrieverKind::Tavily => Tavily::new(config.tavily_api_key()?)?,
        };

        ResearcherBuilder::new(query)
            .report_type(report_type)
            .fast_llm(fast_llm)
            .smart_llm(smart_llm)
            .retriever(retriever)
            .limits(config)
            .build()
    }

    async fn plan_sub_queries(&self) -> Result<Vec<String>> {
        let prompt = render(
            SUB_QUERIES_PROMPT,
            &[
                ("query", self.query.as_str()),
                ("max", self.max_sub_queries.to_string().as_str()),
            ],
        );

        let response = self
            .fast_llm
            .completion(CompletionRequest {
                messages: &[
                    Message::System(SYSTEM_PROMPT.to_string()),
                    Message::User(prompt),
                ],
                temperature: Some(0.0),
            })
            .await?;

        let mut queries = parse_sub_queries(&response.content, self.max_sub_queries);
        if queries.is_empty() {
            warn!("could not plan sub-queries, searching the objective only");
        }
        if !queries.contains(&self.query) {
            queries.push(self.query.clone());
        }
        Ok(queries)
    }

    fn add_result(&mut self, result: crate::retriever::SearchResult) {
        if !self.seen.insert(result.url.clone()) {
            return;
        }

        self.context.push(format!(
            "Source: {}\nTitle: {}\nContent: {}\n",
            result.url, result.title, result.content
        ));
        self.visited_urls.push(result.url);
    }
}

/// Pulls a JSON list of strings out of a model reply, tolerating code fences
/// or prose around it. Returns an empty list when there is none.
fn parse_sub_queries(content: &str, max: usize) -> Vec<String> {
    let list = match (content.find('['), content.rfind(']')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => return Vec::new(),
    };

    serde_json::from_str::<Vec<String>>(list)
        .map(|queries| {
            queries
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .take(max)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ResearchSession for GPTResearcher {
    async fn conduct_research(&mut self) -> Result<()> {
        info!(query = %self.query, report_type = %self.report_type, "conducting research");

        let queries = self.plan_sub_queries().await?;
        debug!(?queries, "planned sub-queries");

        for query in &queries {
            let results = self
                .retriever
                .search(query, self.max_results_per_query)
                .await?;

            for result in results {
                self.add_result(result);
            }
        }

        info!(sources = self.visited_urls.len(), "research complete");
        Ok(())
    }

    async fn write_report(&self) -> Result<String> {
        let prompt = self
            .report_type
            .prompt(&self.query, &self.context.join("\n"), self.total_words);

        let response = self
            .smart_llm
            .completion(CompletionRequest {
                messages: &[
                    Message::System(SYSTEM_PROMPT.to_string()),
                    Message::User(prompt),
                ],
                temperature: Some(0.35),
            })
            .await?;

        Ok(response.content)
    }

    fn get_source_urls(&self) -> Vec<String> {
        self.visited_urls.clone()
    }
}

pub struct ResearcherBuilder {
    query: String,
    report_type: ReportType,
    fast_llm: Option<SharedLLM>,
    smart_llm: Option<SharedLLM>,
    retriever: Option<SharedRetriever>,
    max_sub_queries: usize,
    max_results_per_query: usize,
    total_words: usize,
}

impl ResearcherBuilder {
    pub fn new(query: &str) -> Self {
        let defaults = EngineConfig::default();
        Self {
            query: query.to_string(),
            report_type: ReportType::ResearchReport,
            fast_llm: None,
            smart_llm: None,
            retriever: None,
            max_sub_queries: defaults.max_sub_queries,
            max_results_per_query: defaults.max_results_per_query,
            total_words: defaults.total_words,
        }
    }

    pub fn report_type(mut self, report_type: ReportType) -> Self {
        self.report_type = report_type;
        self
    }

    pub fn fast_llm(mut self, llm: SharedLLM) -> Self {
        self.fast_llm = Some(llm);
        self
    }

    pub fn smart_llm(mut self, llm: SharedLLM) -> Self {
        self.smart_llm = Some(llm);
        self
    }

    pub fn retriever(mut self, retriever: SharedRetriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn limits(mut self, config: &EngineConfig) -> Self {
        self.max_sub_queries = config.max_sub_queries;
        self.max_results_per_query = config.max_results_per_query;
        self.total_words = config.total_words;
        self
    }

    pub fn build(self) -> Result<GPTResearcher> {
        if self.query.trim().is_empty() {
            return Err(Error::MissingConfig("query must not be empty".to_string()));
        }

        Ok(GPTResearcher {
            query: self.query,
            report_type: self.report_type,
            fast_llm: self
                .fast_llm
                .ok_or(Error::MissingConfig("fast llm is required".to_string()))?,
            smart_llm: self
                .smart_llm
                .ok_or(Error::MissingConfig("smart llm is required".to_string()))?,
            retriever: self
                .retriever
                .ok_or(Error::MissingConfig("retriever is required".to_string()))?,
            max_sub_queries: self.max_sub_queries,
            max_results_per_query: self.max_results_per_query,
            total_words: self.total_words,
            context: Vec::new(),
            visited_urls: Vec::new(),
            seen: HashSet::new(),
        })
    }
}
