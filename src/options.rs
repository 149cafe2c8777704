/// Settings for one audit run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditOptions {
    /// Probe attachment links over HTTP; when false every link counts as unreachable.
    pub probe_links: bool,

    /// Report only findings that need attention.
    pub failures_only: bool,
}

impl Default for AuditOptions {
    /// Probes links and reports every finding.
    fn default() -> Self {
        AuditOptions {
            probe_links: true,
            failures_only: false,
        }
    }
}
