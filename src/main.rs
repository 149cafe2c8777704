use anyhow::Context;
use clap::Parser;
use rusty_step_audit::report::render_text;
use rusty_step_audit::Auditor;

mod cli;

fn main() {
    if let Err(error) = run() {
        eprintln!("step-audit error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let options = cli.options();
    let auditor = Auditor::from_options(&options).context("failed to initialize link probe")?;

    let mut reports = Vec::new();
    let mut failed = 0usize;
    for name in cli.expand_documents()? {
        let result = rusty_step_audit::open_document(&name)
            .and_then(|mut document| auditor.audit(document.as_mut()));
        match result {
            Ok(report) => reports.push(report),
            Err(error) => {
                tracing::error!(document = %name, %error, "failed to audit document");
                failed += 1;
            }
        }
    }

    match cli.format {
        cli::OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports).context("failed to serialize audit reports")?;
            println!("{json}");
        }
        cli::OutputFormat::Text => {
            for report in &reports {
                println!("{}", render_text(report, options.failures_only));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} document(s) could not be audited");
    }
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("STEP_AUDIT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
