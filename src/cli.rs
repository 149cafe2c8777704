use anyhow::Context;
use clap::Parser;
use clap::ValueEnum;
use rusty_step_audit::AuditOptions;

/// Report output format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Top-level CLI parser for the `step-audit` binary.
#[derive(Debug, Parser)]
#[command(name = "step-audit", version, about = "Audit test-execution tables in word documents")]
pub struct Cli {
    /// Document paths, glob patterns or http(s) URLs
    #[arg(required = true)]
    pub documents: Vec<String>,

    /// Output format: text, json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Only list findings that need attention
    #[arg(long)]
    pub failures_only: bool,

    /// Skip HTTP reachability checks of attachment links
    #[arg(long)]
    pub no_probe: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn options(&self) -> AuditOptions {
        AuditOptions {
            probe_links: !self.no_probe,
            failures_only: self.failures_only,
        }
    }

    /// Expands glob patterns. URLs and patterns matching nothing are passed through unchanged
    /// so that opening them reports the real error.
    pub fn expand_documents(&self) -> anyhow::Result<Vec<String>> {
        let mut documents = Vec::new();
        for pattern in &self.documents {
            if pattern.contains("://") || !pattern.contains(['*', '?', '[']) {
                documents.push(pattern.to_owned());
                continue;
            }
            let mut matched = glob::glob(pattern)
                .with_context(|| format!("invalid document pattern '{pattern}'"))?
                .filter_map(Result::ok)
                .map(|path| path.to_string_lossy().into_owned())
                .collect::<Vec<_>>();
            if matched.is_empty() {
                documents.push(pattern.to_owned());
            } else {
                matched.sort();
                documents.append(&mut matched);
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_to_options() {
        let cli = Cli::try_parse_from(["step-audit", "--no-probe", "--failures-only", "-f", "json", "a.docx"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(
            cli.options(),
            AuditOptions {
                probe_links: false,
                failures_only: true,
            }
        );
    }

    #[test]
    fn documents_are_required() {
        assert!(Cli::try_parse_from(["step-audit"]).is_err());
    }

    #[test]
    fn glob_patterns_expand_sorted() {
        let directory = tempfile::tempdir().unwrap();
        for name in ["b.docx", "a.docx", "notes.txt"] {
            std::fs::write(directory.path().join(name), b"").unwrap();
        }
        let pattern = format!("{}/*.docx", directory.path().display());
        let missing = format!("{}/*.docm", directory.path().display());
        let cli = Cli::try_parse_from(["step-audit", pattern.as_str(), missing.as_str(), "https://example.com/x?.docx"]).unwrap();
        let documents = cli.expand_documents().unwrap();
        assert_eq!(documents.len(), 4);
        assert!(documents[0].ends_with("a.docx"));
        assert!(documents[1].ends_with("b.docx"));
        assert_eq!(documents[2], missing);
        assert_eq!(documents[3], "https://example.com/x?.docx");
    }
}
