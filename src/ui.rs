use anyhow::Result;
use colored::Colorize;
use declarative::{
    Change, ConfirmCallback, Diagnostic, Diagnostics, ExecuteSummary, OperationKind,
    ProgressCallback, ResourceDiff, Severity, group_by_type,
};
use indicatif::{ProgressBar, ProgressStyle};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Diagnostics
// ============================================================================

/// One line naming the diagnostic, optionally prefixed with a resource address
pub fn diagnostic_line(address: Option<&str>, diagnostic: &Diagnostic) -> String {
    let mut line = match address {
        Some(address) => format!("{address}: {}", diagnostic.summary),
        None => diagnostic.summary.clone(),
    };
    if let Some(attribute) = &diagnostic.attribute {
        line.push_str(&format!(" (at {attribute})"));
    }
    line
}

/// Print a diagnostic with its detail underneath
pub fn diagnostic(address: Option<&str>, diagnostic: &Diagnostic) {
    let line = diagnostic_line(address, diagnostic);
    match diagnostic.severity {
        Severity::Error => {
            error(&line.bold().to_string());
            eprintln!("    {}", diagnostic.detail.dimmed());
        }
        Severity::Warning => {
            warn(&line);
            dim(&format!("  {}", diagnostic.detail));
        }
    }
}

/// Print every diagnostic of a set
pub fn diagnostics(address: Option<&str>, diagnostics: &Diagnostics) {
    for d in diagnostics.iter() {
        diagnostic(address, d);
    }
}

// ============================================================================
// Plan Display
// ============================================================================

fn section_title(resource_type: &str) -> &str {
    match resource_type {
        "asset" => "Assets",
        "policy" => "Policies",
        "contract_definition" => "Contract definitions",
        other => other,
    }
}

/// Display planned changes grouped by resource type
pub fn display_plan(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes. Declarations match the recorded state.", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in group_by_type(diffs) {
        println!("│ {}", section_title(&resource_type).bold());

        for diff in type_diffs {
            let (symbol, note) = match diff.change {
                Change::Addition => ("+".green(), "(will create)"),
                Change::Removal => ("-".red(), "(will delete)"),
                Change::Modification => ("~".yellow(), "(drifted, will reconcile)"),
            };
            println!("│   {} {:<40} {}", symbol, diff.address, note.dimmed());

            if let (Change::Modification, Some(current), Some(desired)) =
                (diff.change, &diff.current, &diff.desired)
            {
                for line in text_diff(current, desired) {
                    println!("│       {line}");
                }
            }
        }
        println!("│");
    }

    let additions = diffs.iter().filter(|d| d.is_addition()).count();
    let removals = diffs.iter().filter(|d| d.is_removal()).count();
    let modifications = diffs.iter().filter(|d| d.is_modification()).count();

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to create, {} to reconcile, {} to delete",
        additions.to_string().green(),
        modifications.to_string().yellow(),
        removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Changed lines between two renderings, colored red/green
pub fn text_diff(from: &str, to: &str) -> Vec<String> {
    let diff = similar::TextDiff::from_lines(from, to);
    diff.iter_all_changes()
        .filter_map(|change| {
            let text = change.value().trim_end_matches('\n');
            match change.tag() {
                similar::ChangeTag::Delete => Some(format!("- {text}").red().to_string()),
                similar::ChangeTag::Insert => Some(format!("+ {text}").green().to_string()),
                similar::ChangeTag::Equal => None,
            }
        })
        .collect()
}

/// Print the outcome of an execution
pub fn print_summary(summary: &ExecuteSummary, action: &str) {
    println!();
    if summary.is_success() {
        println!("  {} {} complete!", "✓".green().bold(), action);
    } else {
        println!("  {} {} finished with errors", "⚠".yellow().bold(), action);
    }

    let lines = [
        (summary.created, "created"),
        (summary.read, "refreshed"),
        (summary.updated, "reconciled"),
        (summary.deleted, "deleted"),
        (summary.imported, "imported"),
        (summary.skipped, "skipped"),
    ];
    for (count, label) in lines.into_iter().filter(|(count, _)| *count > 0) {
        println!("    • {count} resources {label}");
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "operations".red());
    }
}

// ============================================================================
// Host Callbacks
// ============================================================================

/// Progress bar over the instances of one resource type
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_batch_start(&mut self, resource_type: &str, count: usize) {
        let bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(count as u64)
        };
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.set_prefix(section_title(resource_type).to_string());
        self.bar = Some(bar);
    }

    fn on_operation_complete(
        &mut self,
        address: &str,
        operation: OperationKind,
        diagnostics: &Diagnostics,
    ) {
        let Some(bar) = &self.bar else {
            return;
        };
        let symbol = if diagnostics.has_error() {
            "✗".red()
        } else {
            "✓".green()
        };
        bar.set_message(format!("{symbol} {operation} {address}"));
        // A reconcile reports its read and its update; count the instance once.
        if operation != OperationKind::Update {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Interactive confirmation through dialoguer
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

// ============================================================================
// Tests
// ============================================================================
