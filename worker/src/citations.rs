const SOURCES_HEADER: &str = "\n\n## 📚 权威参考资料 / Verified Data Sources\n";
const SOURCES_NOTE: &str =
    "> **Note to Agent:** When rewriting, you MUST verify data against these links.\n\n";

/// The citations block appended after a report. Urls are listed as given.
pub fn sources_section(source_urls: &[String]) -> String {
    let mut section = String::from(SOURCES_HEADER);
    section.push_str(SOURCES_NOTE);
    for url in source_urls {
        section.push_str(&format!("- {}\n", url));
    }
    section
}

pub fn with_sources(report: &str, source_urls: &[String]) -> String {
    let mut document = String::from(report);
    document.push_str(&sources_section(source_urls));
    document
}
