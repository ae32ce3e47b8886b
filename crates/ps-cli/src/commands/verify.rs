//! Verification commands.

use anyhow::{Context, Result};
use colored::Colorize;
use ps_proof::{audit_record, verify_file, ProofStore};
use std::fs;
use std::path::Path;

/// Handle `proofstamp verify`. Returns whether the file matched.
pub fn cmd_verify<S: ProofStore>(store: &S, id: &str, index: usize, file: &Path) -> Result<bool> {
    let proof = store.require(id)?;
    let candidate =
        fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let outcome = verify_file(&proof, index, &candidate)?;

    let name = &proof.files[index].name;
    println!("{}: {} / {} ({})", "Proof".bold(), proof.title, index, name);
    println!("{}: {}", "Expected".bold(), outcome.expected);
    println!("{}: {}", "Computed".bold(), outcome.computed);
    println!();
    if outcome.matched {
        println!("{} {}", "✓".green().bold(), "MATCH".green().bold());
    } else {
        println!("{} {}", "✗".red().bold(), "NO MATCH".red().bold());
    }
    Ok(outcome.matched)
}

/// Handle `proofstamp audit`. Returns whether the stored proof re-derives exactly.
pub fn cmd_audit<S: ProofStore>(store: &S, id: &str) -> Result<bool> {
    let proof = store.require(id)?;
    let report = audit_record(&proof)?;

    println!("{}", proof.title.bold().underline());
    for file in &report.files {
        let mark = if file.is_intact() {
            "✓".green().bold()
        } else {
            "✗".red().bold()
        };
        println!("{} {} {}", mark, file.index, file.name);
        if !file.is_intact() {
            println!("    {}: {}", "stored".bold(), file.stored);
            println!("    {}: {}", "recomputed".bold(), file.recomputed);
        }
    }
    if report.combined_intact() {
        println!("{} combined hash", "✓".green().bold());
    } else {
        println!("{} combined hash", "✗".red().bold());
        println!("    {}: {}", "stored".bold(), report.stored_combined);
        println!("    {}: {}", "recomputed".bold(), report.recomputed_combined);
    }

    println!();
    println!("{}", "Summary:".bold().underline());
    println!("  {}: {}", "Files".bold(), report.files.len());
    if report.is_intact() {
        println!("  {}: {}", "Status".bold(), "INTACT".green().bold());
    } else {
        println!("  {}: {}", "Status".bold(), "TAMPERED".red().bold());
    }
    Ok(report.is_intact())
}
