use c4model::store::{Severity, Warning};
use clap::Parser;
use tracing::instrument;

use super::{Paths, Session, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Check the model for structural problems")]
pub struct Validate {
    /// Validate the level below this element instead of the root
    ///
    /// Only the crowded-view check depends on the level.
    #[arg(long)]
    at: Option<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let mut session = Session::open(paths)?;
        let store = &mut session.store;

        if let Some(id) = &self.at {
            if !store.navigate_to(Some(id.as_str())) {
                anyhow::bail!("element '{id}' not found");
            }
        }
        let warnings = store.validate_model();

        match self.output {
            OutputFormat::Table => self.output_table(warnings),
            OutputFormat::Json => output_json(warnings)?,
            OutputFormat::Summary => output_summary(warnings),
        }

        // Exit with appropriate code
        if warnings
            .iter()
            .any(|warning| warning.severity == Severity::Error)
        {
            std::process::exit(2);
        }
        Ok(())
    }

    fn output_table(&self, warnings: &[Warning]) {
        for warning in warnings {
            let line = warning.to_string();
            match warning.severity {
                Severity::Error => println!("{}", format!("✗ {line}").error()),
                Severity::Warning if !self.quiet => println!("{}", format!("⚠ {line}").warning()),
                Severity::Info if !self.quiet => println!("{}", format!("ℹ {line}").info()),
                Severity::Warning | Severity::Info => {}
            }
        }
        if self.quiet {
            return;
        }

        let (errors, others) = count(warnings);
        if warnings.is_empty() {
            println!("{}", "Model is healthy (0 issues)".success());
        } else {
            println!(
                "\n{}",
                format!("Summary: {errors} error(s), {others} other finding(s)").warning()
            );
        }
    }
}

fn output_json(warnings: &[Warning]) -> anyhow::Result<()> {
    use serde_json::json;

    let (errors, others) = count(warnings);
    let output = json!({
        "status": if warnings.is_empty() { "healthy" } else { "issues_found" },
        "warnings": warnings,
        "summary": {
            "errors": errors,
            "other": others,
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_summary(warnings: &[Warning]) {
    let (errors, others) = count(warnings);
    println!("errors={errors} other={others}");
}

/// The number of errors and of other findings.
fn count(warnings: &[Warning]) -> (usize, usize) {
    let errors = warnings
        .iter()
        .filter(|warning| warning.severity == Severity::Error)
        .count();
    (errors, warnings.len() - errors)
}
