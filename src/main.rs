//! `catto` command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use catto::connectivity::DEFAULT_PROBE_TIMEOUT;
use catto::output;
use catto::{
    Category, Controller, DialoguerPrompter, DownloadObserver, DownloadReport, Downloader, Error,
    SavedImage, Settings, check_endpoints, check_internet_connection,
};

#[derive(Parser)]
#[command(name = "catto")]
#[command(
    about = "Download random cute animal images of your choice from the internet",
    version,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (JSON); defaults to the platform config directory
    #[arg(long, global = true, env = "CATTO_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Download images of one category
    Download {
        /// One of: pandas, dogs, cats, birds, foxes, redpandas, kangaroo, koala, raccoon
        #[arg(long)]
        category: Option<Category>,

        /// Number of images to download
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=100))]
        amount: u16,

        /// Directory to save the images in
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Answer a few questions and download
    Interactive,

    /// Print version information
    Version,

    /// Check the status of every animal endpoint
    Status,

    /// List the available animal categories
    ShowAllCategories,

    /// Print the catto logo
    Logo {
        /// Print one character at a time
        #[arg(long)]
        typewriter: bool,
    },

    /// Print a random fact about an animal
    Fact {
        #[arg(long)]
        category: Option<Category>,
    },
}

impl Commands {
    fn needs_network(&self) -> bool {
        !matches!(
            self,
            Commands::Version | Commands::Logo { .. } | Commands::ShowAllCategories
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    catto::observability::init_tracing(cli.verbose)?;

    let settings = Settings::load_from_env_and_file(cli.config.as_deref())
        .await
        .context("Failed to load settings")?;

    if cli.command.needs_network() && settings.check_connectivity {
        let address = settings.connectivity_address.as_str();
        if !check_internet_connection(address, DEFAULT_PROBE_TIMEOUT).await {
            println!(
                "{}",
                output::failure("Can't connect to the internet, please check your connection.")
            );
            return Err(Error::Offline {
                address: address.to_string(),
            }
            .into());
        }
    }

    match cli.command {
        Commands::Download {
            category,
            amount,
            path,
        } => {
            let category = category.unwrap_or(settings.default_category);
            download(&settings, category, usize::from(amount), path).await
        }
        Commands::Interactive => interactive(&settings).await,
        Commands::Version => {
            println!("{}", output::version_table(&output::version_entries()));
            Ok(())
        }
        Commands::Status => status(&settings).await,
        Commands::ShowAllCategories => {
            println!("{}", output::categories_table(Category::all()));
            Ok(())
        }
        Commands::Logo { typewriter } => {
            if typewriter {
                output::typewriter(output::LOGO, output::TYPEWRITER_DELAY)?;
            } else {
                output::print_logo()?;
            }
            Ok(())
        }
        Commands::Fact { category } => {
            let category = category.unwrap_or(settings.default_category);
            let client = settings.client().await?;
            let fact = client.fetch_fact(category).await?;
            println!("{}", output::highlight(&format!("A fun fact about {}!:", category)));
            println!("{}", fact);
            Ok(())
        }
    }
}

async fn downloader(settings: &Settings) -> Result<Downloader> {
    let client = settings.client().await?;
    Ok(Downloader::new(client).with_pacing(settings.pacing.clone()))
}

async fn download(
    settings: &Settings,
    category: Category,
    amount: usize,
    path: PathBuf,
) -> Result<()> {
    let directory = std::path::absolute(&path).unwrap_or(path);
    println!("{}", output::download_table(category, amount, &directory));

    let downloader = downloader(settings).await?;
    let progress = Progress::new();
    let report = match downloader
        .download(category, amount, &directory, &progress)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            progress.bar.abandon();
            return Err(e.into());
        }
    };

    if report.names.is_empty() {
        println!("{}", output::failure("No images were downloaded."));
        return Ok(());
    }
    println!(
        "{}",
        output::success(&format!(
            "Downloaded {} images of {} in {} successfully!",
            report.names.len(),
            category,
            report.directory.display()
        ))
    );
    Ok(())
}

async fn interactive(settings: &Settings) -> Result<()> {
    let downloader = downloader(settings).await?;
    let mut controller =
        Controller::new(DialoguerPrompter::new()).default_category(settings.default_category);

    match controller.run(&downloader, &Progress::new()).await {
        Ok(_) => Ok(()),
        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
            println!(
                "{}",
                output::failure("[*] User has interrupted the program. Exiting gracefully.")
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn status(settings: &Settings) -> Result<()> {
    let client = settings.client().await?;
    let statuses = check_endpoints(&client, Category::all(), &settings.pacing).await?;
    println!("{}", output::status_table(&statuses));
    Ok(())
}

/// Download progress on stderr.
struct Progress {
    bar: ProgressBar,
}

impl Progress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        bar.set_style(style);
        Self { bar }
    }
}

impl DownloadObserver for Progress {
    fn started(&self, _category: Category, amount: usize) {
        self.bar.set_length(amount as u64);
        self.bar
            .enable_steady_tick(std::time::Duration::from_millis(100));
    }

    fn fetching(&self, index: usize, url: &str) {
        self.bar
            .set_message(format!("Downloading {}. {}", index + 1, url));
    }

    fn saved(&self, _image: &SavedImage) {
        self.bar.inc(1);
    }

    fn skipped(&self, index: usize, error: &Error) {
        self.bar
            .println(output::failure(&format!("Skipped image {}: {}", index + 1, error)));
        self.bar.inc(1);
    }

    fn finished(&self, _report: &DownloadReport) {
        self.bar.finish_and_clear();
    }
}
