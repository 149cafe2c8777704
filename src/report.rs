//! Audit results and their plain-text rendering.
use crate::audit::attachment::AttachmentFinding;
use crate::audit::attachment::AttachmentStatus;
use crate::audit::delta::DeltaFinding;
use crate::audit::delta::DeltaOutcome;
use crate::audit::delta::THRESHOLD_HOURS;
use crate::audit::results::FailedStep;
use crate::audit::tense::TenseFinding;
use crate::audit::tense::TenseStatus;
use crate::audit::version::VersionToken;
use serde::Serialize;
use std::fmt::Write;

/// Outcome of assigning version tokens to steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reconciliation {
    Renumbered { steps: usize },
    Failed { error: String },
}

/// Everything found in one document.
#[derive(Clone, Debug, Serialize)]
pub struct AuditReport {
    pub document: String,
    pub versions: Vec<VersionToken>,
    pub reconciliation: Reconciliation,
    pub tables: Vec<TableReport>,
}

/// Findings for one table. `errors` lists analyses skipped for missing columns.
/// `tenses` stays empty unless the auditor was given a tense classifier.
#[derive(Clone, Debug, Serialize)]
pub struct TableReport {
    pub index: usize,
    pub steps: Vec<String>,
    pub deltas: Vec<DeltaFinding>,
    pub attachments: Vec<AttachmentFinding>,
    pub failures: Vec<FailedStep>,
    pub tenses: Vec<TenseFinding>,
    pub errors: Vec<String>,
}

/// Formats seconds as `H:MM:SS`, with a leading `-` for negative values.
pub fn format_elapsed(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.unsigned_abs();
    format!("{sign}{}:{:02}:{:02}", seconds / 3600, seconds / 60 % 60, seconds % 60)
}

fn describe_delta(outcome: &DeltaOutcome) -> String {
    match outcome {
        DeltaOutcome::NoPrevious => "No previous timestamp to compare".to_owned(),
        DeltaOutcome::Within { elapsed_seconds, backward: false } => {
            format!("Time difference {}", format_elapsed(*elapsed_seconds))
        }
        DeltaOutcome::Within { elapsed_seconds, backward: true } => {
            format!("Time difference {} (earlier than previous step)", format_elapsed(*elapsed_seconds))
        }
        DeltaOutcome::ExceedsThreshold { .. } => {
            format!("Time difference with previous step exceeds {THRESHOLD_HOURS} hour")
        }
        DeltaOutcome::Invalid { message } => format!("Timestamp format error: {message}"),
    }
}

fn describe_attachment(finding: &AttachmentFinding) -> String {
    let link = finding.hyperlink.as_deref().unwrap_or_default();
    let status = match finding.status {
        AttachmentStatus::AccessibleAttachment => format!("has accessible hyperlink: {link}"),
        AttachmentStatus::InaccessibleAttachment => format!("has inaccessible hyperlink: {link}"),
        AttachmentStatus::ClaimedNoLink if link.is_empty() => "claims an attachment but has no hyperlink".to_owned(),
        AttachmentStatus::ClaimedNoLink => format!("claims an attachment but the link is not clickable: {link}"),
        AttachmentStatus::NoAttachment => "has no attachment".to_owned(),
    };
    if finding.screenshot_required {
        format!("{status} (screenshot required)")
    } else {
        status
    }
}

/// Renders a report as text. With `failures_only` only findings that need attention are listed.
pub fn render_text(report: &AuditReport, failures_only: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Document: {}", report.document);
    match &report.reconciliation {
        Reconciliation::Renumbered { steps } => {
            let _ = writeln!(out, "Step numbers reconciled: {steps} steps");
        }
        Reconciliation::Failed { error } => {
            let _ = writeln!(out, "Step numbers not reconciled: {error}");
        }
    }

    for table in &report.tables {
        let _ = writeln!(out, "\nTable {}:", table.index + 1);
        for error in &table.errors {
            let _ = writeln!(out, "{error}");
        }

        let _ = writeln!(out, "----------------Timestamp Details:-------------");
        for finding in table.deltas.iter().filter(|finding| !failures_only || finding.outcome.is_failure()) {
            let _ = writeln!(out, "{}--{}--{}", finding.step, finding.stamp, describe_delta(&finding.outcome));
        }

        let _ = writeln!(out, "----------------Hyperlink Details:-------------");
        for finding in table.attachments.iter().filter(|finding| !failures_only || finding.is_failure()) {
            let _ = writeln!(out, "{}--{}", finding.step, describe_attachment(finding));
        }

        let _ = writeln!(out, "----------------Failed Steps:-------------");
        if table.failures.is_empty() {
            let _ = writeln!(out, "No Fail on this Table");
        }
        for failure in &table.failures {
            let _ = writeln!(out, "{}--Fail--Expected: {}--Actual: {}", failure.step, failure.expected, failure.actual);
        }

        if !table.tenses.is_empty() {
            let _ = writeln!(out, "----------------Tense Details:-------------");
            for finding in table.tenses.iter().filter(|finding| !failures_only || finding.is_failure()) {
                let status = match finding.status {
                    TenseStatus::PresentTense => "Present Tense",
                    TenseStatus::NotPresentTense => "Not Present Tense",
                    TenseStatus::NoSentence => "No sentence",
                };
                let _ = writeln!(out, "{}-{status}", finding.step);
            }
        }
    }
    out
}
