//! Backup export and import.

use anyhow::{Context, Result};
use colored::Colorize;
use ps_proof::{export_store, import_into, ProofStore};
use std::fs;
use std::path::Path;

/// Handle `proofstamp export`.
pub fn cmd_export<S: ProofStore>(store: &S, output: &Path) -> Result<()> {
    let document = export_store(store).context("failed to read proofs")?;
    let json = document.to_json()?;
    fs::write(output, json)
        .with_context(|| format!("failed to write export to {}", output.display()))?;
    println!(
        "{} {} proofs exported to {}",
        "✓".green().bold(),
        document.proofs.len(),
        output.display()
    );
    Ok(())
}

/// Handle `proofstamp import`. Nothing is written unless the whole file is valid.
pub fn cmd_import<S: ProofStore>(store: &mut S, input: &Path) -> Result<()> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let count = import_into(store, &json).context("import rejected")?;
    println!("{} {} proofs imported", "✓".green().bold(), count);
    Ok(())
}
