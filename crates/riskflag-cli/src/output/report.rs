// SPDX-License-Identifier: Apache-2.0

//! Run report rendering.

use std::io::{self, Write};

use console::style;
use riskflag_core::{Category, RunReport, RunStatus};

use crate::cli::OutputContext;
use crate::output::Renderable;

fn styled_category(category: Category) -> String {
    match category {
        Category::Blue => style(category.as_str()).blue().bold().to_string(),
        Category::Red => style(category.as_str()).red().bold().to_string(),
        Category::Black => style(category.as_str())
            .black()
            .on_white()
            .bold()
            .to_string(),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

impl Renderable for RunReport {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        writeln!(
            w,
            "{} {} ({})",
            style("riskflag").bold(),
            self.target,
            self.variant
        )?;

        let category = self
            .category
            .map_or_else(|| style("none").dim().to_string(), styled_category);
        writeln!(w, "  {}  {}", style("category:").dim(), category)?;
        writeln!(
            w,
            "  {}  {}",
            style("label attached:").dim(),
            yes_no(self.label_attached)
        )?;

        let posted = if self.dry_run {
            style("dry run").yellow().to_string()
        } else {
            yes_no(self.comment_posted).to_string()
        };
        writeln!(w, "  {}  {}", style("comment posted:").dim(), posted)?;
        if let Some(url) = &self.comment_url {
            writeln!(w, "  {}  {}", style("comment url:").dim(), url)?;
        }

        if !self.comment.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", style("Comment").cyan().bold())?;
            writeln!(w, "{}", self.comment)?;
        }

        if let Some(diagnostic) = &self.completion_failure {
            writeln!(w)?;
            writeln!(
                w,
                "{} {}",
                style("Completion failed:").red().bold(),
                diagnostic
            )?;
        }

        let failures = self.fetch_failures.len() + self.write_failures.len();
        if failures > 0 {
            writeln!(w)?;
            writeln!(w, "{}", style(format!("{failures} step(s) failed")).yellow())?;
            if ctx.verbose {
                for failure in &self.fetch_failures {
                    writeln!(w, "  - {}: {}", failure.operation, failure.diagnostic)?;
                }
                for failure in &self.write_failures {
                    writeln!(w, "  - {failure}")?;
                }
            }
        }

        if self.status() == RunStatus::UpstreamFetchFailure {
            writeln!(w)?;
            writeln!(
                w,
                "{}",
                style("Primary input could not be fetched; result is unreliable.").red()
            )?;
        }
        Ok(())
    }
}
