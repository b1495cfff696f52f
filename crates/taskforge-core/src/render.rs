use std::collections::HashSet;
use std::io::{self, IsTerminal, Write};

use taskforge_shared::TaskDto;
use tracing::warn;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::dashboard::{DashboardState, TaskStats};
use crate::error::format_error;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);
        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_dashboard<W: Write>(
        &self,
        mut out: W,
        state: &DashboardState,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint("Task Forge", "1"))?;
        self.print_stats(&mut out, state.stats())?;
        writeln!(out)?;

        writeln!(out, "{}", self.paint("Create task", "1"))?;
        let title = if state.form.title.is_empty() {
            "-".to_string()
        } else {
            state.form.title.clone()
        };
        writeln!(out, "  title       {title}")?;
        writeln!(
            out,
            "  done        {}",
            if state.form.completed { "yes" } else { "no" }
        )?;
        if state.saving {
            writeln!(out, "  Saving...")?;
        }
        let form_error = format_error(state.form_error.as_ref());
        if !form_error.is_empty() {
            writeln!(out, "  {}", self.paint(&form_error, "31"))?;
        }
        writeln!(out)?;

        writeln!(out, "{}", self.paint("Latest tasks", "1"))?;
        if state.loading {
            writeln!(out, "Loading tasks...")?;
        } else if state.tasks.is_empty() {
            writeln!(out, "No tasks yet. Create the first one.")?;
        } else {
            self.print_task_table(&mut out, &state.tasks)?;
        }
        let load_error = format_error(state.load_error.as_ref());
        if !load_error.is_empty() {
            writeln!(out, "{}", self.paint(&load_error, "31"))?;
        }

        Ok(())
    }

    pub fn print_stats<W: Write>(&self, mut out: W, stats: TaskStats) -> anyhow::Result<()> {
        writeln!(out, "Total tasks  {}", self.paint(&stats.total.to_string(), "33"))?;
        writeln!(out, "Completed    {}", self.paint(&stats.done.to_string(), "32"))?;
        Ok(())
    }

    pub fn print_task_table<W: Write>(&self, out: W, tasks: &[TaskDto]) -> anyhow::Result<()> {
        let headers = vec!["ID".to_string(), "Title".to_string(), "Status".to_string()];

        let mut seen = HashSet::with_capacity(tasks.len());
        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !seen.insert(task.id) {
                warn!(id = task.id, "duplicate task id in list");
            }

            let id = self.paint(&format!("#{}", task.id), "33");
            let status = if task.completed {
                self.paint("Completed", "32")
            } else {
                "In progress".to_string()
            };
            rows.push(vec![id, task.title.clone(), status]);
        }

        write_table(out, headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let last = column_count.saturating_sub(1);
    for (idx, header) in headers.iter().enumerate() {
        write_cell(&mut writer, header, widths[idx], idx == last)?;
    }
    writeln!(writer)?;

    for (idx, width) in widths.iter().enumerate() {
        let sep = if idx == last { "" } else { " " };
        write!(writer, "{:-<width$}{sep}", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            write_cell(&mut writer, cell, widths[idx], idx == last)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn write_cell<W: Write>(writer: &mut W, cell: &str, width: usize, last: bool) -> io::Result<()> {
    if last {
        return write!(writer, "{cell}");
    }
    let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
    let padding = width.saturating_sub(visible_width);
    write!(writer, "{}{} ", cell, " ".repeat(padding))
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
