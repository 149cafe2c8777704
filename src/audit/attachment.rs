use crate::audit::probe::ReachabilityProbe;
use crate::audit::AnalysisError;
use crate::audit::ACTUAL_COLUMN;
use crate::audit::PROCEDURE_COLUMN;
use crate::audit::STEP_COLUMN;
use crate::document::Table;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

static SCREENSHOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)capture screenshot\(s\)").expect("Hardcode regex pattern"));

static ATTACHMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)upload attachment").expect("Hardcode regex pattern"));

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("Hardcode regex pattern"));

/// Anything that looks like a link: URLs, `www.` hosts, `[bracketed]` references and paths.
static HYPERLINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https?://\S+|www\.\S+|\[[^\]]+\]|\S+/[\w./-]+)").expect("Hardcode regex pattern")
});

/// Evidence classification for one step, in order of precedence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStatus {
    /// Attachment claimed and its link answered with HTTP 200
    AccessibleAttachment,
    /// Attachment claimed with a clickable link that could not be reached
    InaccessibleAttachment,
    /// Attachment claimed without a clickable link
    ClaimedNoLink,
    /// No attachment claimed
    NoAttachment,
}

/// What a row says about its screenshot evidence, before any network check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachmentEvidence {
    /// The procedure asks for screenshots
    pub screenshot_required: bool,
    /// The actual result says an attachment was uploaded
    pub attachment_claimed: bool,
    /// First link after the attachment claim
    pub hyperlink: Option<String>,
    /// The link is an absolute http(s) URL
    pub clickable: bool,
}

impl AttachmentEvidence {
    pub fn inspect(procedure: &str, actual: &str) -> AttachmentEvidence {
        let screenshot_required = SCREENSHOT_PATTERN.is_match(procedure);
        let Some(claim) = ATTACHMENT_PATTERN.find(actual) else {
            return AttachmentEvidence {
                screenshot_required,
                ..AttachmentEvidence::default()
            };
        };
        let after = &actual[claim.end()..];
        let hyperlink = URL_PATTERN
            .find(after)
            .map(|matched| trim_link(matched.as_str()).to_owned())
            .or_else(|| HYPERLINK_PATTERN.find(after).map(|matched| matched.as_str().to_owned()));
        let clickable = hyperlink
            .as_deref()
            .and_then(|link| Url::parse(link).ok())
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        AttachmentEvidence {
            screenshot_required,
            attachment_claimed: true,
            hyperlink,
            clickable,
        }
    }

    /// Classifies the evidence. The probe is consulted only for clickable links.
    pub fn classify(&self, probe: &dyn ReachabilityProbe) -> AttachmentStatus {
        match (&self.hyperlink, self.attachment_claimed, self.clickable) {
            (_, false, _) => AttachmentStatus::NoAttachment,
            (Some(link), true, true) => {
                if probe.probe(link) {
                    AttachmentStatus::AccessibleAttachment
                } else {
                    AttachmentStatus::InaccessibleAttachment
                }
            }
            _ => AttachmentStatus::ClaimedNoLink,
        }
    }
}

/// Strips sentence punctuation glued to the end of a URL.
/// A closing parenthesis stays when it balances an opening one inside the URL.
fn trim_link(link: &str) -> &str {
    let mut link = link;
    loop {
        let trimmed = link.trim_end_matches(['.', ',', ';', ':', ']']);
        let trimmed = match trimmed.strip_suffix(')') {
            Some(rest) if trimmed.matches(')').count() > trimmed.matches('(').count() => rest,
            _ => trimmed,
        };
        if trimmed.len() == link.len() {
            return link;
        }
        link = trimmed;
    }
}

/// Attachment finding for one data row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentFinding {
    /// 0-based data row index within the table
    pub row: usize,
    pub step: String,
    pub screenshot_required: bool,
    pub hyperlink: Option<String>,
    pub status: AttachmentStatus,
}

impl AttachmentFinding {
    /// Whether the finding should be reported as a problem.
    pub fn is_failure(&self) -> bool {
        match self.status {
            AttachmentStatus::AccessibleAttachment => false,
            AttachmentStatus::InaccessibleAttachment | AttachmentStatus::ClaimedNoLink => true,
            AttachmentStatus::NoAttachment => self.screenshot_required,
        }
    }
}

/// Checks every row of a table for screenshot evidence. Rows are independent of each other.
pub fn analyze_table(table: &Table, probe: &dyn ReachabilityProbe) -> Result<Vec<AttachmentFinding>, AnalysisError> {
    let [step, procedure, actual] = table.columns([STEP_COLUMN, PROCEDURE_COLUMN, ACTUAL_COLUMN])?;
    let findings = table
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let evidence = AttachmentEvidence::inspect(&cells[procedure], &cells[actual]);
            let status = evidence.classify(probe);
            AttachmentFinding {
                row,
                step: cells[step].to_owned(),
                screenshot_required: evidence.screenshot_required,
                hyperlink: evidence.hyperlink,
                status,
            }
        })
        .collect();
    Ok(findings)
}
