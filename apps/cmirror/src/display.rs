//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use cmirror_ops::{InstallReport, MirrorInfo, OperationResult};
use cmirror_types::{CleanupReport, ColorChoice, SyncReport, SyncStatus};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Mirror(info) => self.render_mirror_info(info),
            OperationResult::SyncReport(report) => self.render_sync_report(report),
            OperationResult::CleanupReport(report) => self.render_cleanup_report(report),
            OperationResult::InstallReport(report) => self.render_install_report(report),
            OperationResult::Success(message) => self.term.write_line(message),
        }
    }

    fn render_mirror_info(&self, info: &MirrorInfo) -> io::Result<()> {
        self.term.write_line(&format!(
            "{} {}",
            self.styled("Mirror ready:", &Style::new().green().bold()),
            info.path.display()
        ))?;
        self.term
            .write_line(&format!("Index:  {} ({})", info.index.display(), info.index_url))?;
        self.term.write_line(&format!(
            "Run `cmirror update {}` to download artifacts.",
            info.path.display()
        ))
    }

    /// Render synchronization report
    fn render_sync_report(&self, report: &SyncReport) -> io::Result<()> {
        let (status, color) = match report.status {
            SyncStatus::Completed if report.stats.has_failures() => {
                ("Completed with failures", Color::Yellow)
            }
            SyncStatus::Completed => ("Completed", Color::Green),
            SyncStatus::Aborted => ("Aborted", Color::Red),
        };

        let mut table = self.table(&["Outcome", "Records"]);
        table.add_row(vec![Cell::new("Up to date"), Cell::new(report.stats.up_to_date)]);
        table.add_row(vec![
            Cell::new("Downloaded"),
            self.count_cell(report.stats.downloaded, Color::Green),
        ]);
        table.add_row(vec![
            Cell::new("Failed"),
            self.count_cell(report.stats.failed, Color::Red),
        ]);
        table.add_row(vec![
            Cell::new("Corrupt"),
            self.count_cell(report.stats.corrupt, Color::Red),
        ]);
        if report.stats.aborted > 0 {
            table.add_row(vec![
                Cell::new("Abandoned"),
                self.count_cell(report.stats.aborted, Color::Yellow),
            ]);
        }

        let status_cell = if self.supports_color() {
            Cell::new(status).fg(color).add_attribute(Attribute::Bold)
        } else {
            Cell::new(status)
        };
        table.add_row(vec![Cell::new("Status"), status_cell]);

        self.term.write_line(&table.to_string())?;
        self.term.write_line(&format!(
            "{} job(s), {}",
            report.jobs,
            format_duration(report.duration_ms)
        ))
    }

    /// Render reconciliation report
    fn render_cleanup_report(&self, report: &CleanupReport) -> io::Result<()> {
        if report.total_removed() == 0 && report.errors == 0 && report.stale_skipped == 0 {
            return self.term.write_line(&format!(
                "Nothing to clean up ({} artifact(s) kept).",
                report.kept
            ));
        }

        let mut table = self.table(&["Entry", "Count"]);
        table.add_row(vec![
            Cell::new("Stale artifacts removed"),
            Cell::new(report.stale_removed),
        ]);
        table.add_row(vec![
            Cell::new("Partial downloads removed"),
            Cell::new(report.partial_removed),
        ]);
        table.add_row(vec![
            Cell::new("Corrupted downloads removed"),
            Cell::new(report.quarantined_removed),
        ]);
        table.add_row(vec![Cell::new("Artifacts kept"), Cell::new(report.kept)]);
        if report.stale_skipped > 0 {
            table.add_row(vec![
                Cell::new("Unreferenced, kept (index incomplete)"),
                self.count_cell(report.stale_skipped, Color::Yellow),
            ]);
        }
        if report.errors > 0 {
            table.add_row(vec![
                Cell::new("Removal errors"),
                self.count_cell(report.errors, Color::Red),
            ]);
        }

        self.term.write_line(&table.to_string())
    }

    /// Render install report
    fn render_install_report(&self, report: &InstallReport) -> io::Result<()> {
        match &report.config_file {
            Some(path) => self.term.write_line(&format!(
                "{} {} in {}",
                self.styled("Registered", &Style::new().green().bold()),
                report.mirror.display(),
                path.display()
            )),
            None => {
                self.term
                    .write_line("Add the following to your cargo configuration:")?;
                self.term.write_line("")?;
                self.term.write_line(report.snippet.trim_end())
            }
        }
    }

    fn table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(
            headers
                .iter()
                .map(|header| Cell::new(header).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        table
    }

    /// Highlight non-zero counts
    fn count_cell(&self, count: usize, color: Color) -> Cell {
        if count > 0 && self.supports_color() {
            Cell::new(count).fg(color)
        } else {
            Cell::new(count)
        }
    }

    fn styled(&self, text: &str, style: &Style) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

/// Format a millisecond duration for humans
fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{ms}ms");
    }
    let secs = ms / 1_000;
    if secs < 60 {
        format!("{secs}.{}s", (ms % 1_000) / 100)
    } else if secs < 3_600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h{:02}m", secs / 3_600, (secs % 3_600) / 60)
    }
}
