//! Show the pending changes for a commit

use super::Session;
use crate::output;
use anyhow::{Context, Result};
use gtf_checkin::{CheckinPlan, RenameMode};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(repo: &Path, from: Option<&str>, to: &str, renames: Option<RenameMode>, json: bool) -> Result<()> {
    let session = Session::open(repo, renames)?;
    let plan = session.plan(from, to)?;

    if json {
        let value = output::plan_json(&plan);
        println!("{}", serde_json::to_string_pretty(&value).context("Failed to serialize plan")?);
        return Ok(());
    }

    print_plan(&plan, &session);
    Ok(())
}

fn print_plan(plan: &CheckinPlan, session: &Session) {
    let config = &session.config;
    let analysis = plan.analysis();

    println!("{}", "Checkin Plan".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    match plan.source() {
        Some(source) => println!("From:          {}", source.short().yellow()),
        None => println!("From:          {}", "(initial import)".dimmed()),
    }
    println!("To:            {}", plan.target().short().yellow());
    println!("Server path:   {}", config.server_path.cyan());
    println!("Renames:       {}", config.rename_mode);
    println!();

    if plan.is_empty() {
        println!("{}", "Nothing to check in".dimmed());
        return;
    }

    for edit in analysis.edits() {
        println!("  {}    {}", "edit".yellow(), config.server_path_for(&edit.path));
    }
    for add in analysis.adds() {
        println!("  {}     {}", "add".green(), config.server_path_for(&add.path));
    }
    for (depth, batch) in plan.renames().batches().iter().enumerate() {
        for rename in batch {
            println!("  {}  {}", "rename".cyan(), output::describe_rename(rename, config));
            println!("          {}", format!("(batch {})", depth).dimmed());
        }
    }
    for delete in analysis.deletes() {
        println!(
            "  {}  {} {}",
            "delete".red(),
            config.server_path_for(&delete.path),
            output::kind_suffix(delete.kind).dimmed()
        );
    }

    println!();
    println!(
        "{} changes ({} adds, {} edits, {} renames, {} deletes)",
        plan.size().to_string().bold(),
        analysis.adds().len(),
        analysis.edits().len(),
        plan.renames().len(),
        analysis.deletes().len()
    );
}
