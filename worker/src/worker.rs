use crate::citations;
use crate::config::{self, RunConfig};
use crate::error::{Error, Phase};
use crate::Result;
use clap::Parser;
use researcher::{EngineConfig, ResearchSession};
use std::ffi::OsString;
use tracing::info;

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchResult {
    pub report_text: String,
    pub source_urls: Vec<String>,
}

/// Configures providers, parses `args`, opens a session and runs it.
///
/// `open` is only called once configuration and argument parsing have both
/// succeeded.
pub async fn execute<L, I, T, F, S>(lookup: L, args: I, open: F) -> Result<ResearchResult>
where
    L: Fn(&str) -> Option<String>,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce(&EngineConfig, &RunConfig) -> researcher::Result<S>,
    S: ResearchSession + Send + Sync,
{
    let engine_config = config::configure(lookup)?;
    let run = RunConfig::try_parse_from(args)?;

    println!("\n🚀 STARTING WORKER: {}", run.query);
    println!("📄 Output Target: {}", run.filename.display());

    let mut session = open(&engine_config, &run).map_err(Error::engine(Phase::Session))?;
    let result = research(&mut session).await?;
    persist(&run, &result)?;

    println!(
        "✅ DONE. Report with citations saved to {}",
        run.filename.display()
    );
    println!("📊 Total Sources Found: {}", result.source_urls.len());
    Ok(result)
}

/// Runs the three session steps once each, in order.
pub async fn research<S>(session: &mut S) -> Result<ResearchResult>
where
    S: ResearchSession + Send + Sync,
{
    println!("🔍 Searching, Scraping & Reading (Please wait)...");
    info!("researching");
    session
        .conduct_research()
        .await
        .map_err(Error::engine(Phase::Research))?;

    println!("✍️ Synthesizing Report...");
    info!("synthesizing");
    let report_text = session
        .write_report()
        .await
        .map_err(Error::engine(Phase::Synthesis))?;

    println!("🔗 Extracting Sources...");
    let source_urls = session.get_source_urls();
    info!(sources = source_urls.len(), "sources extracted");

    Ok(ResearchResult {
        report_text,
        source_urls,
    })
}

/// Writes the report with its citations section, replacing any existing file.
pub fn persist(run: &RunConfig, result: &ResearchResult) -> Result<()> {
    let document = citations::with_sources(&result.report_text, &result.source_urls);
    std::fs::write(&run.filename, document).map_err(|source| Error::Io {
        path: run.filename.clone(),
        source,
    })?;
    info!(path = %run.filename.display(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::execute;
    use crate::error::{Error, Phase};
    use async_trait::async_trait;
    use researcher::{LlmProvider, ResearchSession};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<&'static str>>>;

    struct MockSession {
        calls: Calls,
        report: &'static str,
        urls: Vec<String>,
        fail_research: bool,
        fail_report: bool,
    }

    #[async_trait]
    impl ResearchSession for MockSession {
        async fn conduct_research(&mut self) -> researcher::Result<()> {
            self.calls.lock().unwrap().push("conduct_research");
            if self.fail_research {
                return Err(researcher::Error::LLMResponseError(
                    "rate limited".to_string(),
                ));
            }
            Ok(())
        }

        async fn write_report(&self) -> researcher::Result<String> {
            self.calls.lock().unwrap().push("write_report");
            if self.fail_report {
                return Err(researcher::Error::LLMResponseError(
                    "content is empty".to_string(),
                ));
            }
            Ok(self.report.to_string())
        }

        fn get_source_urls(&self) -> Vec<String> {
            self.calls.lock().unwrap().push("get_source_urls");
            self.urls.clone()
        }
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn session(calls: &Calls, fail_research: bool) -> MockSession {
        MockSession {
            calls: calls.clone(),
            report: "Tariffs have raised costs.",
            urls: vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
            ],
            fail_research,
            fail_report: false,
        }
    }

    fn args(output: &Path) -> Vec<String> {
        vec![
            "research-worker".to_string(),
            "--query".to_string(),
            "impact of tariffs on steel".to_string(),
            "--filename".to_string(),
            output.display().to_string(),
        ]
    }

    #[tokio::test]
    async fn test_gemini_run_writes_report_with_sources() -> crate::Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("steel.md");
        let calls = Calls::default();

        let result = execute(
            env(&[("GEMINI_API_KEY", "gm-123456789")]),
            args(&output),
            |config, run| {
                assert_eq!(config.fast_llm.provider, LlmProvider::GoogleGemini);
                assert_eq!(config.smart_llm.provider, LlmProvider::GoogleGemini);
                assert_eq!(run.query, "impact of tariffs on steel");
                assert_eq!(run.report_type, "research_report");
                Ok(session(&calls, false))
            },
        )
        .await?;

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["conduct_research", "write_report", "get_source_urls"]
        );
        assert_eq!(result.source_urls.len(), 2);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Tariffs have raised costs.\n\n\
             ## 📚 权威参考资料 / Verified Data Sources\n\
             > **Note to Agent:** When rewriting, you MUST verify data against these links.\n\n\
             - https://a.example\n\
             - https://b.example\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_file_is_overwritten() -> crate::Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("steel.md");
        std::fs::write(&output, "stale content that is longer than the new report").unwrap();
        let calls = Calls::default();

        execute(
            env(&[("OPENAI_API_KEY", "sk-123456789")]),
            args(&output),
            |_, _| {
                Ok(MockSession {
                    urls: Vec::new(),
                    ..session(&calls, false)
                })
            },
        )
        .await?;

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("Tariffs have raised costs.\n\n## 📚"));
        assert!(written.ends_with("verify data against these links.\n\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_credentials_stop_before_engine() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("steel.md");
        let calls = Calls::default();
        let mut opened = 0;

        let err = execute(env(&[]), args(&output), |_, _| {
            opened += 1;
            Ok(session(&calls, false))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::MissingCredentials));
        assert_eq!(opened, 0);
        assert!(calls.lock().unwrap().is_empty());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_query_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("steel.md");
        let calls = Calls::default();
        let mut opened = 0;

        let err = execute(
            env(&[("GEMINI_API_KEY", "gm-123456789")]),
            ["research-worker", "--filename", output.to_str().unwrap()],
            |_, _| {
                opened += 1;
                Ok(session(&calls, false))
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Usage(_)));
        assert_eq!(opened, 0);
        assert!(calls.lock().unwrap().is_empty());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_research_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("steel.md");
        let calls = Calls::default();

        let err = execute(
            env(&[("GEMINI_API_KEY", "gm-123456789")]),
            args(&output),
            |_, _| Ok(session(&calls, true)),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Engine {
                phase: Phase::Research,
                ..
            }
        ));
        assert!(err.to_string().contains("rate limited"));
        assert_eq!(*calls.lock().unwrap(), vec!["conduct_research"]);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_synthesis_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("steel.md");
        let calls = Calls::default();

        let err = execute(
            env(&[("GEMINI_API_KEY", "gm-123456789")]),
            args(&output),
            |_, _| {
                Ok(MockSession {
                    fail_report: true,
                    ..session(&calls, false)
                })
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Engine {
                phase: Phase::Synthesis,
                ..
            }
        ));
        assert!(err.to_string().starts_with("synthesis failed:"));
        assert!(err.to_string().contains("content is empty"));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["conduct_research", "write_report"]
        );
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_session_errors_are_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("steel.md");

        let err = execute(
            env(&[("GEMINI_API_KEY", "gm-123456789")]),
            args(&output),
            |_, run| -> researcher::Result<MockSession> {
                Err(researcher::Error::UnknownReportType(run.report_type.clone()))
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "session failed: Unknown report type: research_report"
        );
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_unwritable_path_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("steel.md");
        let calls = Calls::default();

        let err = execute(
            env(&[("GEMINI_API_KEY", "gm-123456789")]),
            args(&output),
            |_, _| Ok(session(&calls, false)),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().starts_with("persistence failed:"));
        assert_eq!(calls.lock().unwrap().len(), 3);
    }
}
