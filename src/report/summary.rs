//! Pipeline summary table

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{PreparedData, PreprocessingStrategy};

/// Summary of one pipeline run, printed at the end of the CLI
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub input_rows: usize,
    pub initial_predictors: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub output_train_rows: usize,
    pub output_test_rows: usize,
    pub rejected: Vec<String>,
    pub below_thresholds: Vec<String>,
    pub pruned: Vec<String>,
    pub retained_predictors: usize,
    pub output_columns: usize,
    pub strategy: PreprocessingStrategy,
    load_time: Option<Duration>,
    save_time: Option<Duration>,
    stage_times: Vec<(&'static str, Duration)>,
}

impl PipelineSummary {
    pub fn new(input_rows: usize, initial_predictors: usize) -> Self {
        Self {
            input_rows,
            initial_predictors,
            ..Default::default()
        }
    }

    /// Pull counts and timings out of a finished run
    pub fn record(&mut self, prepared: &PreparedData) {
        self.strategy = prepared.strategy;
        self.train_rows = prepared.train_rows;
        self.test_rows = prepared.test_rows;
        self.output_train_rows = prepared.train.height();
        self.output_test_rows = prepared.test.height();
        self.output_columns = prepared.train.width();
        self.rejected = prepared
            .binning
            .rejected()
            .iter()
            .map(|r| r.name.clone())
            .collect();
        self.below_thresholds = prepared
            .binning
            .features()
            .iter()
            .filter(|f| !f.retained)
            .map(|f| f.feature_name.clone())
            .collect();
        self.retained_predictors = prepared.binning.retained().count();
        self.pruned = prepared
            .filter
            .as_ref()
            .map(|f| f.dropped().iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default();

        let t = prepared.timings;
        self.stage_times = vec![
            ("Split", t.split),
            ("Binning", t.binning),
            ("Transform", t.transform),
            ("Pruning", t.pruning),
        ];
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = Some(elapsed);
    }

    pub fn set_save_time(&mut self, elapsed: Duration) {
        self.save_time = Some(elapsed);
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("PREPROCESSING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("Strategy"), Cell::new(self.strategy)]);
        table.add_row(vec![Cell::new("📁 Input Rows"), Cell::new(self.input_rows)]);
        table.add_row(vec![
            Cell::new("✂️  Train / Test"),
            Cell::new(format!("{} / {}", self.train_rows, self.test_rows)),
        ]);
        if self.output_train_rows != self.train_rows || self.output_test_rows != self.test_rows {
            table.add_row(vec![
                Cell::new("🧹 Complete Rows Kept"),
                Cell::new(format!("{} / {}", self.output_train_rows, self.output_test_rows)).fg(Color::Yellow),
            ]);
        }
        table.add_row(vec![
            Cell::new("🔢 Initial Predictors"),
            Cell::new(self.initial_predictors),
        ]);
        table.add_row(vec![
            Cell::new("🚫 Rejected (Unbinnable)"),
            count_cell(self.rejected.len()),
        ]);
        table.add_row(vec![
            Cell::new("📉 Below Thresholds"),
            count_cell(self.below_thresholds.len()),
        ]);
        table.add_row(vec![
            Cell::new("🔗 Pruned (Correlation)"),
            count_cell(self.pruned.len()),
        ]);
        table.add_row(vec![
            Cell::new("✅ Retained Predictors"),
            Cell::new(self.retained_predictors)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("📐 Output Columns"),
            Cell::new(self.output_columns),
        ]);

        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        self.display_timings();
        self.display_dropped();
    }

    fn display_timings(&self) {
        let mut rows: Vec<(&str, Duration)> = Vec::new();
        if let Some(load) = self.load_time {
            rows.push(("Load", load));
        }
        rows.extend(self.stage_times.iter().copied());
        if let Some(save) = self.save_time {
            rows.push(("Save", save));
        }
        if rows.is_empty() {
            return;
        }

        let total: Duration = rows.iter().map(|(_, d)| *d).sum();
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
        ]);
        for (stage, elapsed) in rows {
            table.add_row(vec![Cell::new(stage), Cell::new(format_duration(elapsed))]);
        }
        table.add_row(vec![
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new(format_duration(total)).add_attribute(Attribute::Bold),
        ]);

        println!();
        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }

    fn display_dropped(&self) {
        let groups = [
            ("Rejected", &self.rejected),
            ("Below Selection Thresholds", &self.below_thresholds),
            ("High Correlation", &self.pruned),
        ];
        if groups.iter().all(|(_, names)| names.is_empty()) {
            return;
        }

        println!();
        println!(
            "    {} {}",
            style("📝").cyan(),
            style("DROPPED PREDICTORS").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());

        for (title, names) in groups {
            if names.is_empty() {
                continue;
            }
            println!();
            println!(
                "      {} {}:",
                style(title).yellow(),
                style(format!("({})", names.len())).dim()
            );
            for name in names {
                println!("        {} {}", style("•").dim(), name);
            }
        }
    }
}

fn count_cell(count: usize) -> Cell {
    Cell::new(count).fg(if count == 0 { Color::White } else { Color::Red })
}

/// `1.23s` above a second, `45ms` below
pub fn format_duration(elapsed: Duration) -> String {
    if elapsed.as_secs_f64() >= 1.0 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}
