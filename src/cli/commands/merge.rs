use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::commands::source_label;
use crate::cli::display::{self, list_table, CommandOutput};
use crate::cli::Verdict;
use crate::domain::models::Ledger;
use crate::infrastructure::storage::{read_ledger, read_metrics, write_ledger, TableFormat};
use crate::services::merge_metrics;

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Ledger to write (YAML). An existing file is extended, not replaced
    pub output: PathBuf,

    /// Metrics tables (CSV) or ledgers (YAML) to fold in, in order
    #[arg(required = true)]
    pub tables: Vec<PathBuf>,

    /// Ignore the current contents of the output ledger
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Debug, Serialize)]
pub struct MergedTable {
    pub path: PathBuf,
    pub source: String,
    pub changed: usize,
}

#[derive(Debug, Serialize)]
pub struct MergeOutput {
    pub output: PathBuf,
    pub entries: usize,
    pub closed: usize,
    pub tables: Vec<MergedTable>,
}

impl CommandOutput for MergeOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["table", "source", "changed"]);
        for t in &self.tables {
            table.add_row(vec![
                t.path.display().to_string(),
                t.source.clone(),
                t.changed.to_string(),
            ]);
        }
        format!(
            "{}\n\n{}",
            table,
            display::action_success(&format!(
                "{}: {} entries, {} closed",
                self.output.display(),
                self.entries,
                self.closed
            ))
        )
    }
}

/// Fold another ledger into `ledger`, keeping each bound's own provenance.
fn merge_ledger(ledger: &mut Ledger, other: &Ledger) -> usize {
    let mut changed = 0;
    for (instance, entry) in other.iter() {
        if let Some(lb) = &entry.lower_bound {
            changed += usize::from(ledger.merge(instance, Some(lb.value), None, &lb.source).changed());
        }
        if let Some(ub) = &entry.upper_bound {
            changed += usize::from(ledger.merge(instance, None, Some(ub.value), &ub.source).changed());
        }
    }
    changed
}

pub async fn execute(args: MergeArgs, json: bool) -> Result<Verdict> {
    if TableFormat::from_path(&args.output)? != TableFormat::Yaml {
        anyhow::bail!("Output must be a YAML ledger: {}", args.output.display());
    }

    let mut ledger = if args.output.exists() && !args.fresh {
        read_ledger(&args.output)
            .with_context(|| format!("Failed to read ledger {}", args.output.display()))?
    } else {
        Ledger::new()
    };

    let mut merged = Vec::with_capacity(args.tables.len());
    for path in &args.tables {
        let (source, changed) = match TableFormat::from_path(path)? {
            TableFormat::Csv => {
                let metrics = read_metrics(path)
                    .with_context(|| format!("Failed to read metrics table {}", path.display()))?;
                let source = source_label(path);
                let changed = merge_metrics(&mut ledger, &metrics, &source);
                (source, changed)
            }
            TableFormat::Yaml => {
                let other = read_ledger(path)
                    .with_context(|| format!("Failed to read ledger {}", path.display()))?;
                ("(kept)".to_string(), merge_ledger(&mut ledger, &other))
            }
        };
        tracing::info!(table = %path.display(), source = %source, changed, "table merged");
        merged.push(MergedTable {
            path: path.clone(),
            source,
            changed,
        });
    }

    write_ledger(&args.output, &ledger)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    display::output(
        &MergeOutput {
            output: args.output,
            entries: ledger.len(),
            closed: ledger.iter().filter(|(_, e)| e.is_closed()).count(),
            tables: merged,
        },
        json,
    );
    Ok(Verdict::Clean)
}
