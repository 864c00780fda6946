//! Rendering simulation results as text, JSON or CSV.

use crate::domain::{DayStatistic, FinishedStory, Phase, SimulationSummary, TaskCompletionDates};
use crate::engine::Process;
use crate::error::ReportError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs;
use std::io::Write as _;
use std::path::Path;

/// Output format of the `run` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Everything a report shows about one run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub daily_statistics: Vec<DayStatistic>,
    pub finished_stories: Vec<FinishedStory>,
    /// Completed and pending tasks of every story, keyed by story id
    pub task_completion_dates: BTreeMap<String, TaskCompletionDates>,
    pub summary: SimulationSummary,
}

impl SimulationReport {
    /// Collect the report data from a run
    pub fn from_process(process: &Process) -> Self {
        Self {
            daily_statistics: process.statistics().to_vec(),
            finished_stories: process.finished_stories(),
            task_completion_dates: process
                .all_stories()
                .map(|s| (s.id.clone(), s.task_completion_dates()))
                .collect(),
            summary: process.summary(),
        }
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String, ReportError> {
        if self.daily_statistics.is_empty() {
            return Err(ReportError::Empty);
        }
        match format {
            OutputFormat::Text => self.render_text(),
            OutputFormat::Json => self.render_json(),
            OutputFormat::Csv => self.render_csv(),
        }
    }

    /// Day blocks, per-story task completion and the run summary
    pub fn render_text(&self) -> Result<String, ReportError> {
        let mut out = String::new();
        self.write_text(&mut out)?;
        Ok(out)
    }

    fn write_text(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "Simulation Results:")?;
        writeln!(out)?;

        for day in &self.daily_statistics {
            writeln!(out, "Day {}:", day.day)?;
            writeln!(out, "  Backlog: {}", day.backlog_count)?;
            for step in &day.steps {
                let label = step.phase.label();
                writeln!(out, "  {} Input: {}", label, step.input_queue_count)?;
                writeln!(out, "  {} WIP: {}", label, step.active_count)?;
                writeln!(out, "  {} Done: {}", label, step.done_today)?;
            }
            writeln!(out, "  Finished Stories: {}", day.finished_count)?;
            writeln!(out)?;
        }

        writeln!(out, "Task Completion Summary:")?;
        writeln!(out, "{}", "-".repeat(50))?;
        for (id, dates) in &self.task_completion_dates {
            writeln!(out)?;
            writeln!(out, "Story {}:", id)?;
            if !dates.completed.is_empty() {
                writeln!(out, "  Completed Tasks:")?;
                for (phase, day) in &dates.completed {
                    writeln!(out, "    {}: Day {}", phase.label(), day)?;
                }
            }
            if !dates.pending.is_empty() {
                writeln!(out, "  Pending Tasks:")?;
                for phase in &dates.pending {
                    writeln!(out, "    {}: Not completed", phase.label())?;
                }
            }
        }

        let summary = &self.summary;
        writeln!(out)?;
        writeln!(out, "Summary:")?;
        writeln!(out, "{}", "-".repeat(50))?;
        writeln!(out, "  Simulated days     : {}", summary.simulated_days)?;
        writeln!(
            out,
            "  Finished stories   : {}/{}",
            summary.finished_stories, summary.total_stories
        )?;
        writeln!(out, "  Tasks completed    : {}", summary.tasks_completed)?;
        match summary.mean_lead_time {
            Some(mean) => writeln!(out, "  Mean lead time     : {:.2} days", mean)?,
            None => writeln!(out, "  Mean lead time     : n/a")?,
        }
        if let Some(max) = summary.max_lead_time {
            writeln!(out, "  Max lead time      : {} days", max)?;
        }
        writeln!(
            out,
            "  Throughput         : {:.2} stories/day",
            summary.throughput_per_day
        )?;
        writeln!(out, "  Mean WIP           : {:.2}", summary.mean_work_in_process)?;
        for phase in &summary.phases {
            let utilization = phase
                .utilization
                .map(|u| format!("{:.0}%", u * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            writeln!(
                out,
                "  {:<8} tasks {:>4}  mean queue {:>6.2}  utilization {}",
                phase.phase.label(),
                phase.tasks_completed,
                phase.mean_queue,
                utilization
            )?;
        }
        Ok(())
    }

    /// Pretty-printed JSON of the whole report
    pub fn render_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Queue statistics, task completion history and finished stories as
    /// three CSV sections separated by a blank line
    pub fn render_csv(&self) -> Result<String, ReportError> {
        let sections = [
            self.queue_statistics_csv()?,
            self.completion_history_csv()?,
            self.finished_stories_csv()?,
        ];
        Ok(sections.join("\n"))
    }

    fn queue_statistics_csv(&self) -> Result<String, ReportError> {
        let mut header = vec!["day".to_string(), "backlog".to_string()];
        for phase in Phase::ALL {
            for column in ["input", "wip", "done"] {
                header.push(format!("{}_{}", phase.as_str(), column));
            }
        }
        header.push("finished".to_string());

        let rows = self.daily_statistics.iter().map(|day| {
            let mut row = vec![day.day.to_string(), day.backlog_count.to_string()];
            for step in &day.steps {
                row.push(step.input_queue_count.to_string());
                row.push(step.active_count.to_string());
                row.push(step.done_today.to_string());
            }
            row.push(day.finished_count.to_string());
            row
        });
        csv_section("Queue Statistics", header, rows)
    }

    fn completion_history_csv(&self) -> Result<String, ReportError> {
        let mut header = vec!["day".to_string()];
        header.extend(Phase::ALL.iter().map(|p| p.as_str().to_string()));
        header.push("total".to_string());
        header.push("cumulative".to_string());

        let rows = self.daily_statistics.iter().map(|day| {
            let mut row = vec![day.day.to_string()];
            row.extend(
                day.steps
                    .iter()
                    .map(|s| s.tasks_completed_today.to_string()),
            );
            row.push(day.tasks_completed_today.to_string());
            row.push(day.tasks_completed_total.to_string());
            row
        });
        csv_section("Task Completion History", header, rows)
    }

    fn finished_stories_csv(&self) -> Result<String, ReportError> {
        let header = [
            "id",
            "feature",
            "arrival_day",
            "completion_day",
            "lead_time",
            "tasks",
            "rework",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let rows = self.finished_stories.iter().map(|story| {
            vec![
                story.id.clone(),
                story.feature_id.clone(),
                story.arrival_day.to_string(),
                story.completion_day.to_string(),
                story.lead_time.to_string(),
                story.total_tasks.to_string(),
                story.rework_count.to_string(),
            ]
        });
        csv_section("Finished Stories", header, rows)
    }
}

fn csv_section(
    title: &str,
    header: Vec<String>,
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<String, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record([title])?;
    writer.write_record(&header)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write rendered output to a file, or to stdout when no path is given
pub fn write_output(content: &str, path: Option<&Path>) -> Result<(), ReportError> {
    match path {
        Some(path) => {
            let write_err = |source: std::io::Error| ReportError::Write {
                path: path.to_path_buf(),
                source,
            };
            ensure_parent(path).map_err(write_err)?;
            fs::write(path, content).map_err(write_err)?;
            tracing::info!(path = %path.display(), bytes = content.len(), "report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", content).map_err(|source| ReportError::Write {
                path: "<stdout>".into(),
                source,
            })?;
        }
    }
    Ok(())
}
