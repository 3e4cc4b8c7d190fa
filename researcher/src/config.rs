use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// OpenAI-compatible endpoint for Gemini models.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetrieverKind {
    Tavily,
}

impl RetrieverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrieverKind::Tavily => "tavily",
        }
    }
}

impl FromStr for RetrieverKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "tavily" => Ok(RetrieverKind::Tavily),
            other => Err(Error::UnknownRetriever(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    GoogleGemini,
}

/// Which of the two model slots a spec fills. The fast model plans queries,
/// the smart model writes the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelTier {
    Fast,
    Smart,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::GoogleGemini => "google_gemini",
        }
    }

    pub fn default_model(&self, tier: ModelTier) -> &'static str {
        match (self, tier) {
            (LlmProvider::OpenAI, ModelTier::Fast) => "gpt-4o-mini",
            (LlmProvider::OpenAI, ModelTier::Smart) => "gpt-4o",
            (LlmProvider::GoogleGemini, _) => "gemini-2.0-flash",
        }
    }

    /// Base url override for the chat completions client, `None` for the
    /// client default.
    pub fn api_base(&self) -> Option<&'static str> {
        match self {
            LlmProvider::OpenAI => None,
            LlmProvider::GoogleGemini => Some(GEMINI_API_BASE),
        }
    }

    pub fn key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::GoogleGemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "openai" => Ok(LlmProvider::OpenAI),
            "google_gemini" => Ok(LlmProvider::GoogleGemini),
            other => Err(Error::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LlmSpec {
    pub provider: LlmProvider,
    pub model: String,
}

impl LlmSpec {
    pub fn default_for(provider: LlmProvider, tier: ModelTier) -> Self {
        Self {
            provider,
            model: provider.default_model(tier).to_string(),
        }
    }

    /// Parses `provider` or `provider:model`.
    pub fn parse(value: &str, tier: ModelTier) -> Result<Self> {
        match value.split_once(':') {
            Some((provider, model)) if !model.trim().is_empty() => Ok(Self {
                provider: provider.parse()?,
                model: model.trim().to_string(),
            }),
            Some((provider, _)) => Ok(Self::default_for(provider.parse()?, tier)),
            None => Ok(Self::default_for(value.parse()?, tier)),
        }
    }
}

impl fmt::Display for LlmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider.as_str(), self.model)
    }
}

#[derive(Clone)]
pub struct EngineConfig {
    pub retriever: RetrieverKind,
    pub fast_llm: LlmSpec,
    pub smart_llm: LlmSpec,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub max_sub_queries: usize,
    pub max_results_per_query: usize,
    pub total_words: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retriever: RetrieverKind::Tavily,
            fast_llm: LlmSpec::default_for(LlmProvider::OpenAI, ModelTier::Fast),
            smart_llm: LlmSpec::default_for(LlmProvider::OpenAI, ModelTier::Smart),
            openai_api_key: None,
            gemini_api_key: None,
            tavily_api_key: None,
            max_sub_queries: 3,
            max_results_per_query: 5,
            total_words: 1200,
        }
    }
}

impl EngineConfig {
    /// Builds a config from any key lookup. Blank settings count as unset;
    /// credentials are kept as given unless empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let credential = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut config = Self::default();

        if let Some(retriever) = var("RETRIEVER") {
            config.retriever = retriever.parse()?;
        }
        if let Some(spec) = var("FAST_LLM") {
            config.fast_llm = LlmSpec::parse(&spec, ModelTier::Fast)?;
        }
        if let Some(spec) = var("SMART_LLM") {
            config.smart_llm = LlmSpec::parse(&spec, ModelTier::Smart)?;
        }

        config.openai_api_key = credential("OPENAI_API_KEY");
        config.gemini_api_key = credential("GEMINI_API_KEY");
        config.tavily_api_key = credential("TAVILY_API_KEY");

        if let Some(value) = var("MAX_SEARCH_RESULTS_PER_QUERY") {
            config.max_results_per_query = parse_count("MAX_SEARCH_RESULTS_PER_QUERY", &value)?;
        }
        if let Some(value) = var("MAX_SUB_QUERIES") {
            config.max_sub_queries = parse_count("MAX_SUB_QUERIES", &value)?;
        }
        if let Some(value) = var("TOTAL_WORDS") {
            config.total_words = parse_count("TOTAL_WORDS", &value)?;
        }

        Ok(config)
    }

    /// Points both model slots at `provider` with its default models.
    pub fn with_llm_provider(mut self, provider: LlmProvider) -> Self {
        self.fast_llm = LlmSpec::default_for(provider, ModelTier::Fast);
        self.smart_llm = LlmSpec::default_for(provider, ModelTier::Smart);
        self
    }

    pub fn with_retriever(mut self, retriever: RetrieverKind) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn api_key(&self, provider: LlmProvider) -> Result<&str> {
        let key = match provider {
            LlmProvider::OpenAI => &self.openai_api_key,
            LlmProvider::GoogleGemini => &self.gemini_api_key,
        };
        key.as_deref()
            .ok_or(Error::MissingConfig(provider.key_var().to_string()))
    }

    pub fn tavily_api_key(&self) -> Result<&str> {
        self.tavily_api_key
            .as_deref()
            .ok_or(Error::MissingConfig("TAVILY_API_KEY".to_string()))
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Keeps the first four characters of a credential.
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", prefix)
    }
}

// Credentials never show up in debug output.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = |key: &Option<String>| key.as_deref().map(mask_key);
        f.debug_struct("EngineConfig")
            .field("retriever", &self.retriever)
            .field("fast_llm", &self.fast_llm)
            .field("smart_llm", &self.smart_llm)
            .field("openai_api_key", &masked(&self.openai_api_key))
            .field("gemini_api_key", &masked(&self.gemini_api_key))
            .field("tavily_api_key", &masked(&self.tavily_api_key))
            .field("max_sub_queries", &self.max_sub_queries)
            .field("max_results_per_query", &self.max_results_per_query)
            .field("total_words", &self.total_words)
            .finish()
    }
}
