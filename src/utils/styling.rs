//! Terminal styling for the CLI

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::pipeline::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "");
pub static DICE: Emoji<'_, '_> = Emoji("🎲 ", "");

const CARD_WIDTH: usize = 56;

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!("    {}", style("riskprep").cyan().bold());
    println!(
        "    {}",
        style("Train/test split, WoE binning and correlation pruning").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the configuration card
pub fn print_config(input: &Path, output_dir: &Path, config: &PipelineConfig) {
    let line = "─".repeat(CARD_WIDTH - 2);
    let b = &config.binning;

    println!("    ┌{}┐", line);
    println!("    │ {:<w$}│", style("Configuration").cyan().bold(), w = CARD_WIDTH - 3);
    println!("    ├{}┤", line);
    card_row(FOLDER, "Input", &truncate_path(input, 34));
    card_row(TARGET, "Target", &truncate_string(&config.target_label_column, 34));
    card_row(SAVE, "Output", &truncate_path(output_dir, 34));
    println!("    ├{}┤", line);
    card_row(DICE, "Split", &format!("seed {}, test {:.0}%", config.seed, config.test_fraction * 100.0));
    card_row(
        CHART,
        "Binning",
        &format!("{} {}..{} bins, {}", b.strategy, b.min_bins, b.max_bins, b.optimizer),
    );
    card_row(
        CHART,
        "Select",
        &format!(
            "IV>={} Gini>={} Q>={}",
            b.thresholds.iv_min, b.thresholds.gini_min, b.thresholds.quality_min
        ),
    );
    card_row(
        LINK,
        "Prune",
        &format!(
            "|r|>{:.2}, missing {}",
            config.pruning.correlation_threshold, config.pruning.missing_policy
        ),
    );
    card_row(
        ROCKET,
        "Encode",
        &format!("{} strategy, {}", config.strategy, config.encoding_metric),
    );
    println!("    └{}┘", line);
    println!();
}

fn card_row(icon: Emoji<'_, '_>, key: &str, value: &str) {
    println!("{}", card_line(icon, key, value));
}

fn card_line(icon: Emoji<'_, '_>, key: &str, value: &str) -> String {
    let text = format!("{:<8}{}", format!("{}:", key), value);
    format!("    │  {}{:<w$}│", icon, truncate_string(&text, CARD_WIDTH - 8), w = CARD_WIDTH - 8)
}

/// Print a step header
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print the time a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {}", crate::report::format_duration(elapsed))).dim()
    );
}

pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("riskprep preprocessing complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(detail) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(detail).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

/// Keep the tail of `s`, which holds the file name, when it is too long
fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
