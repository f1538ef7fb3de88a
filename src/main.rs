use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use gymslot::booking::{Artifacts, BookingRunner, Credentials, SitePlan};
use gymslot::browser::{BrowserSession, LaunchOptions, StealthProfile};
use gymslot::probe::EnvironmentProbe;

#[derive(Parser)]
#[command(name = "gymslot")]
#[command(version = "0.1.0")]
#[command(about = "Automated gym class slot booking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and book the configured class slot
    Book {
        /// Visible text of the class to book
        #[arg(short, long)]
        class: Option<String>,

        /// Run the browser headless (headed by default, visible browsers
        /// fare better against bot checks)
        #[arg(long, default_value = "false")]
        headless: bool,

        /// Directory for result/error screenshots
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print environment diagnostics without touching the booking site
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Book {
            class,
            headless,
            output,
        } => {
            // Credentials gate everything: no browser, no traffic without them.
            let credentials = Credentials::from_env()?;

            let mut site = SitePlan::default();
            if let Some(class) = class {
                site.target_class = class;
            }

            println!(
                "{} Booking session: {}",
                "▶".green().bold(),
                site.target_class.cyan()
            );

            let stealth = StealthProfile::default();
            let session = BrowserSession::launch(&LaunchOptions { headless }, &stealth).await?;
            println!("{} Browser launched", "✓".green());

            let runner = BookingRunner::new(
                Box::new(session),
                site,
                stealth,
                credentials,
                Artifacts::in_dir(&output),
            );

            let outcome = runner.run().await?;
            println!(
                "{} Script completed: {}",
                "✓".green().bold(),
                outcome.describe()
            );
        }

        Commands::Doctor => {
            EnvironmentProbe::run().await;
        }
    }

    Ok(())
}
