//! Interactive prompts using dialoguer

use std::path::Path;

use anyhow::Result;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Prompt before writing the output files, flagging any that already exist
pub fn confirm_write_outputs(paths: &[&Path]) -> Result<bool> {
    let existing = paths.iter().filter(|p| p.exists()).count();
    let message = if existing > 0 {
        format!("Overwrite {} existing output file(s)?", existing)
    } else {
        format!("Write {} output file(s)?", paths.len())
    };
    confirm_step(&message)
}
