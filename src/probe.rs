//! Standalone environment diagnostic.
//!
//! Performs no site interaction. Every check reports independently and the
//! probe always terminates normally, so it can be run on a broken host to
//! see exactly which piece is missing.

use colored::Colorize;
use playwright::Playwright;
use std::path::Path;

use crate::booking::credentials::{PASSWORD_VAR, USERNAME_VAR};
use crate::browser::stealth::StealthProfile;
use crate::utils::browser_finder::BROWSER_PATH_VAR;

pub const MARKER_FILE: &str = "gymslot-probe.txt";
const MARKER_CONTENT: &str = "gymslot environment probe marker";

pub struct EnvironmentProbe;

impl EnvironmentProbe {
    /// Run every check. Never signals failure via exit code.
    pub async fn run() {
        println!("{}", "=== environment probe starting ===".bold());

        report_working_directory();
        report_marker_write(Path::new("."));
        report_automation_stack().await;
        report_environment();

        println!("{}", "=== environment probe completed ===".bold());
    }
}

fn report_working_directory() {
    match std::env::current_dir() {
        Ok(cwd) => {
            println!("Current working directory: {}", cwd.display());
            match list_entries(&cwd) {
                Ok(entries) => println!("Files in current directory: {:?}", entries),
                Err(e) => println!("{} Could not list directory: {}", "⚠".yellow(), e),
            }
        }
        Err(e) => println!(
            "{} Could not determine working directory: {}",
            "⚠".yellow(),
            e
        ),
    }
}

fn list_entries(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Write the marker file and read it back. Failure is reported, not fatal.
fn report_marker_write(dir: &Path) -> bool {
    let path = dir.join(MARKER_FILE);
    match write_and_verify_marker(&path) {
        Ok(()) => {
            println!("{} Successfully wrote {}", "✓".green(), path.display());
            true
        }
        Err(e) => {
            println!("{} Failed to write marker file: {}", "⚠".yellow(), e);
            false
        }
    }
}

fn write_and_verify_marker(path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, MARKER_CONTENT)?;
    let read_back = std::fs::read_to_string(path)?;
    anyhow::ensure!(
        read_back == MARKER_CONTENT,
        "marker file content did not round-trip"
    );
    Ok(())
}

async fn report_automation_stack() {
    println!("Checking Playwright runtime...");
    match Playwright::initialize().await {
        Ok(_) => println!("{} Playwright runtime loaded", "✓".green()),
        Err(e) => println!("{} Playwright check failed: {}", "⚠".yellow(), e),
    }

    // Constructing the profile is the stealth-side counterpart of the
    // runtime check above.
    let profile = StealthProfile::default();
    println!(
        "{} Stealth profile ready (user agent: {})",
        "✓".green(),
        profile.user_agent
    );
}

fn report_environment() {
    println!("Environment variables:");
    println!("- {} set: {}", USERNAME_VAR, is_set(USERNAME_VAR));
    println!("- {} set: {}", PASSWORD_VAR, is_set(PASSWORD_VAR));
    match std::env::var(BROWSER_PATH_VAR) {
        Ok(v) if !v.trim().is_empty() => println!("- {}: {}", BROWSER_PATH_VAR, v),
        _ => println!("- {}: Not set", BROWSER_PATH_VAR),
    }
}

fn is_set(var: &str) -> bool {
    std::env::var(var)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}
