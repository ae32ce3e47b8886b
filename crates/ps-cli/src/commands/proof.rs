//! Proof CRUD commands.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use ps_proof::{
    capture_files, create_proof, dashboard_stats, edit_proof, filter_proofs, Category, Location,
    ProofDraft, ProofFilter, ProofRecord, ProofStore,
};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Short title for the proof
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// One of: apartment, vehicle, purchase, communication, contract, workplace, other
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
    /// Evidence files, in the order they are committed
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Id of the proof to edit
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
    /// Drop the stored location
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub clear_location: bool,
    /// Replacement evidence files (the existing set is kept when omitted)
    pub files: Vec<PathBuf>,
}

fn parse_location(lat: Option<f64>, lng: Option<f64>) -> Result<Option<Location>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => match Location::new(lat, lng) {
            Some(location) => Ok(Some(location)),
            None => bail!("invalid location: lat {lat}, lng {lng}"),
        },
        _ => Ok(None),
    }
}

/// Handle `proofstamp create`.
pub fn cmd_create<S: ProofStore>(store: &mut S, config: &Config, args: CreateArgs) -> Result<()> {
    let files = capture_files(&args.files).context("failed to read evidence files")?;
    let draft = ProofDraft {
        title: args.title,
        description: args.description,
        category: config.category_or_default(args.category),
        files,
        location: parse_location(args.lat, args.lng)?,
    };

    let record = create_proof(draft).context("failed to create proof")?;
    store.put(record.clone()).context("failed to save proof")?;

    println!("{} Proof created", "✓".green().bold());
    print_summary(&record);
    Ok(())
}

/// Handle `proofstamp edit`.
pub fn cmd_edit<S: ProofStore>(store: &mut S, args: EditArgs) -> Result<()> {
    let existing = store.require(&args.id)?;
    let mut draft = ProofDraft::from_record(&existing);

    if let Some(title) = args.title {
        draft.title = title;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if let Some(category) = args.category {
        draft.category = category;
    }
    if args.clear_location {
        draft.location = None;
    } else if let Some(location) = parse_location(args.lat, args.lng)? {
        draft.location = Some(location);
    }
    if !args.files.is_empty() {
        draft.files = capture_files(&args.files).context("failed to read evidence files")?;
    }

    let record = edit_proof(&existing, draft).context("failed to edit proof")?;
    store.put(record.clone()).context("failed to save proof")?;

    println!("{} Proof updated", "✓".green().bold());
    print_summary(&record);
    Ok(())
}

fn print_summary(record: &ProofRecord) {
    println!("  {}: {}", "ID".bold(), record.id);
    println!("  {}: {}", "Title".bold(), record.title);
    println!("  {}: {}", "Files".bold(), record.files.len());
    println!("  {}: {}", "Timestamp".bold(), record.timestamp);
    println!("  {}: {}", "Combined Hash".bold(), record.combined_hash);
}

/// Handle `proofstamp list`.
pub fn cmd_list<S: ProofStore>(
    store: &S,
    category: Option<Category>,
    search: Option<String>,
) -> Result<()> {
    let proofs = store.get_all()?;
    if proofs.is_empty() {
        println!("{}", "No proofs yet".yellow());
        return Ok(());
    }

    let filter = ProofFilter { category, search };
    let shown = filter_proofs(&proofs, &filter);
    if shown.is_empty() {
        println!("{}", "No matching proofs".yellow());
        return Ok(());
    }

    for proof in shown {
        let date = proof
            .created_at_time()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| proof.created_at.clone());
        println!(
            "{}  {}  {} {}  ({} file{})",
            proof.id.cyan(),
            date,
            proof.category.emoji(),
            proof.title,
            proof.files.len(),
            if proof.files.len() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

/// Handle `proofstamp show`.
pub fn cmd_show<S: ProofStore>(store: &S, id: &str) -> Result<()> {
    let proof = store.require(id)?;

    println!("{}", proof.title.bold().underline());
    println!("{}: {}", "ID".bold(), proof.id);
    println!(
        "{}: {} {}",
        "Category".bold(),
        proof.category.emoji(),
        proof.category
    );
    if !proof.description.is_empty() {
        println!("{}: {}", "Description".bold(), proof.description);
    }
    println!("{}: {}", "Created".bold(), proof.created_at);
    println!("{}: {}", "Timestamp".bold(), proof.timestamp);
    match &proof.location {
        Some(loc) => println!("{}: {:.6}, {:.6}", "Location".bold(), loc.lat, loc.lng),
        None => println!("{}: {}", "Location".bold(), "none".yellow()),
    }
    println!("{}: {}", "Combined Hash".bold(), proof.combined_hash);
    println!("{}: {}", "Salt".bold(), proof.salt);
    println!();

    for (idx, file) in proof.files.iter().enumerate() {
        let kind = if file.is_image() { "image" } else { "document" };
        println!(
            "{} {} {} ({}, {})",
            "File".bold().cyan(),
            idx.to_string().cyan(),
            file.name,
            file.content_type,
            kind
        );
        println!("  {}: {}", "SHA-256".bold(), file.digest);
    }
    Ok(())
}

/// Handle `proofstamp delete`.
pub fn cmd_delete<S: ProofStore>(store: &mut S, id: &str) -> Result<()> {
    store.delete(id)?;
    println!("{} Proof {} deleted", "✓".green().bold(), id);
    Ok(())
}

/// Handle `proofstamp clear`.
pub fn cmd_clear<S: ProofStore>(store: &mut S, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("refusing to delete all proofs without --yes");
    }
    let count = store.get_all()?.len();
    store.clear()?;
    println!("{} {} proofs deleted", "✓".green().bold(), count);
    Ok(())
}

/// Handle `proofstamp stats`.
pub fn cmd_stats<S: ProofStore>(store: &S) -> Result<()> {
    let proofs = store.get_all()?;
    let stats = dashboard_stats(&proofs, Utc::now());
    println!("{}", "Dashboard".bold().underline());
    println!("  {}: {}", "Total".bold(), stats.total);
    println!("  {}: {}", "This Month".bold(), stats.this_month);
    println!("  {}: {}", "Categories".bold(), stats.categories);
    Ok(())
}
