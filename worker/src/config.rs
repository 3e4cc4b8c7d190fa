use crate::error::{Error, Phase};
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use researcher::{EngineConfig, LlmProvider, RetrieverKind, mask_key};
use std::path::PathBuf;
use tracing::debug;

/// Deep Research Worker Agent
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "research-worker", version, about, long_about = None)]
pub struct RunConfig {
    /// The research objective
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub query: String,

    /// Output filename
    #[arg(long, default_value = "research_output.md")]
    pub filename: PathBuf,

    /// Type of report
    #[arg(long = "report_type", default_value = "research_report")]
    pub report_type: String,
}

/// Model provider chosen from the credentials present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmSelection {
    /// Both model slots pinned to Gemini.
    Gemini,
    /// Only an OpenAI key: the engine's own model defaults apply.
    OpenAI,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderSelection {
    pub retriever: RetrieverKind,
    pub llm: LlmSelection,
}

impl ProviderSelection {
    /// First match wins: Gemini key, then OpenAI key. Any non-empty value
    /// counts as present; keys are never checked for validity.
    pub fn detect<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let llm = if let Some(key) = credential("GEMINI_API_KEY") {
            debug!(gemini_api_key = %mask_key(&key), "gemini credential found");
            LlmSelection::Gemini
        } else if let Some(key) = credential("OPENAI_API_KEY") {
            debug!(openai_api_key = %mask_key(&key), "openai credential found");
            LlmSelection::OpenAI
        } else {
            return Err(Error::MissingCredentials);
        };

        Ok(Self {
            retriever: RetrieverKind::Tavily,
            llm,
        })
    }

    pub fn notice(&self) -> &'static str {
        match self.llm {
            LlmSelection::Gemini => "✅ Configured: Using Google Gemini (Low Cost Mode)",
            LlmSelection::OpenAI => {
                "⚠️ Warning: GEMINI_API_KEY not found. Using OpenAI (Check your costs)."
            }
        }
    }

    pub fn apply(&self, config: EngineConfig) -> EngineConfig {
        let config = config.with_retriever(self.retriever);
        match self.llm {
            LlmSelection::Gemini => config.with_llm_provider(LlmProvider::GoogleGemini),
            LlmSelection::OpenAI => config,
        }
    }
}

/// Selects providers and builds the engine configuration from one lookup.
pub fn configure<F>(lookup: F) -> Result<EngineConfig, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let selection = ProviderSelection::detect(&lookup)?;
    println!("{}", selection.notice());

    // The retriever comes from the selection, never from the environment.
    let engine_env = |key: &str| (key != "RETRIEVER").then(|| lookup(key)).flatten();
    let config =
        EngineConfig::from_lookup(engine_env).map_err(Error::engine(Phase::Configuration))?;
    let config = selection.apply(config);
    debug!(?config, "engine configured");
    Ok(config)
}
