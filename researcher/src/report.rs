use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

const RESEARCH_REPORT_PROMPT: &str = include_str!("prompts/research_report.md");
const RESOURCE_REPORT_PROMPT: &str = include_str!("prompts/resource_report.md");
const OUTLINE_REPORT_PROMPT: &str = include_str!("prompts/outline_report.md");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportType {
    ResearchReport,
    ResourceReport,
    OutlineReport,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::ResearchReport => "research_report",
            ReportType::ResourceReport => "resource_report",
            ReportType::OutlineReport => "outline_report",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            ReportType::ResearchReport => RESEARCH_REPORT_PROMPT,
            ReportType::ResourceReport => RESOURCE_REPORT_PROMPT,
            ReportType::OutlineReport => OUTLINE_REPORT_PROMPT,
        }
    }

    /// Fills the report prompt for this type.
    pub fn prompt(&self, query: &str, context: &str, total_words: usize) -> String {
        render(
            self.template(),
            &[
                ("query", query),
                ("context", context),
                ("total_words", total_words.to_string().as_str()),
            ],
        )
    }
}

impl FromStr for ReportType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "research_report" => Ok(ReportType::ResearchReport),
            "resource_report" => Ok(ReportType::ResourceReport),
            "outline_report" => Ok(ReportType::OutlineReport),
            other => Err(Error::UnknownReportType(other.to_string())),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substitutes `{name}` placeholders in one pass, so braces inside the
/// substituted values are never expanded. Unknown placeholders are kept.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let value = tail.find('}').and_then(|end| {
            vars.iter()
                .find(|(name, _)| *name == &tail[..end])
                .map(|(_, value)| (*value, end))
        });

        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}
