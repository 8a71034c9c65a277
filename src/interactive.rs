//! Question-driven download flow.
//!
//! [`Controller`] owns the order of questions and the validation rules;
//! a [`Prompter`] does the actual terminal I/O so the flow can be driven by
//! a script in tests.

use std::path::{Path, PathBuf};

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::category::Category;
use crate::download::{DownloadObserver, DownloadReport, Downloader};
use crate::output;
use crate::{Error, Result};

/// Terminal I/O used by the [`Controller`].
pub trait Prompter {
    /// Free text; an empty answer means "take the default".
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Index into `items`.
    fn select(&mut self, prompt: &str, items: &[&str], default: usize) -> Result<usize>;

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    fn say(&mut self, message: &str);

    fn complain(&mut self, message: &str);

    /// Shown once before the first question.
    fn banner(&mut self) {}
}

/// Answers collected by the question flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub name: String,
    pub category: Category,
    pub amount: usize,
    pub directory: PathBuf,
}

pub struct Controller<P> {
    prompter: P,
    default_category: Category,
    default_directory: Option<PathBuf>,
}

impl<P: Prompter> Controller<P> {
    pub fn new(prompter: P) -> Self {
        Self {
            prompter,
            default_category: Category::Cats,
            default_directory: None,
        }
    }

    pub fn default_category(mut self, category: Category) -> Self {
        self.default_category = category;
        self
    }

    /// Directory offered first; the working directory when unset.
    pub fn default_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.default_directory = Some(directory.into());
        self
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    /// Run the whole flow. `Ok(None)` when the user declines the download.
    pub async fn run(
        &mut self,
        downloader: &Downloader,
        observer: &dyn DownloadObserver,
    ) -> Result<Option<DownloadReport>> {
        self.prompter.banner();

        let Some(request) = self.collect_request()? else {
            self.prompter
                .complain("Download has been cancelled by user. Exiting.");
            return Ok(None);
        };

        let report = downloader
            .download(request.category, request.amount, &request.directory, observer)
            .await?;
        self.prompter.say(&format!(
            "Downloaded {} images of {} to directory {} successfully!",
            report.names.len(),
            request.category,
            display_name(&report.directory),
        ));

        match downloader.client().fetch_fact(request.category).await {
            Ok(fact) => self
                .prompter
                .say(&format!("A fun fact about {}!:\n{}", request.category, fact)),
            Err(Error::FactNotFound { .. }) => {}
            Err(e) => tracing::warn!(category = %request.category, error = %e, "Could not fetch a fact"),
        }

        Ok(Some(report))
    }

    /// Ask every question. `Ok(None)` when the final confirmation is declined.
    pub fn collect_request(&mut self) -> Result<Option<DownloadRequest>> {
        let name = self.ask_name()?;
        self.prompter.say(&format!("Hello, {}.", name));
        self.prompter.say(
            "This is a small program that downloads random cute animal images \
             of your choice from the internet.",
        );

        let category = self.ask_category()?;
        let amount = self.ask_amount()?;
        let directory = self.ask_directory()?;

        let question = format!(
            "Are you sure you want to download '{}' images of '{}' to '{}'?",
            amount,
            category,
            display_name(&directory),
        );
        if !self.prompter.confirm(&question, true)? {
            return Ok(None);
        }

        Ok(Some(DownloadRequest {
            name,
            category,
            amount,
            directory,
        }))
    }

    fn ask_name(&mut self) -> Result<String> {
        let fallback = whoami::username();
        let answer = self
            .prompter
            .input("What is your name?", Some(&fallback))?;
        let answer = answer.trim();
        Ok(if answer.is_empty() {
            fallback
        } else {
            answer.to_string()
        })
    }

    fn ask_category(&mut self) -> Result<Category> {
        let categories = Category::all();
        let names = Category::names();
        let default = categories
            .iter()
            .position(|&c| c == self.default_category)
            .unwrap_or(0);

        let index = self.prompter.select(
            "Select the category of animal to download:",
            &names,
            default,
        )?;
        categories
            .get(index)
            .copied()
            .ok_or_else(|| Error::Config(format!("no category at position {}", index)))
    }

    fn ask_amount(&mut self) -> Result<usize> {
        loop {
            let answer = self
                .prompter
                .input("The amount of images you want to download?", Some("1"))?;
            let answer = answer.trim();
            let answer = if answer.is_empty() { "1" } else { answer };

            match parse_amount(answer) {
                Some(amount) => return Ok(amount),
                None => self.prompter.complain("Please provide a valid integer."),
            }
        }
    }

    fn ask_directory(&mut self) -> Result<PathBuf> {
        let fallback = match &self.default_directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let fallback_text = fallback.display().to_string();

        loop {
            let answer = self.prompter.input(
                "The path to the directory to save the images?",
                Some(&fallback_text),
            )?;
            let answer = answer.trim();
            let candidate = if answer.is_empty() {
                fallback.clone()
            } else {
                PathBuf::from(answer)
            };

            if !candidate.is_dir() {
                self.prompter.complain("Please provide a valid directory.");
                continue;
            }
            let candidate = std::path::absolute(&candidate)?;
            if !is_writable(&candidate) {
                self.prompter.complain(&format!(
                    "I cannot download the images in directory {} due to insufficient permissions.",
                    candidate.display()
                ));
                continue;
            }
            return Ok(candidate);
        }
    }
}

fn parse_amount(answer: &str) -> Option<usize> {
    answer.parse::<usize>().ok().filter(|&n| n > 0)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Create and remove a probe file.
fn is_writable(directory: &Path) -> bool {
    let probe = directory.join(format!(".catto-write-check-{}", std::process::id()));
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(e) => {
            tracing::debug!(directory = %directory.display(), error = %e, "Directory is not writable");
            false
        }
    }
}

/// [`Prompter`] on the real terminal.
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
    typewriter: bool,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            typewriter: true,
        }
    }

    /// Print the banner at once instead of character by character.
    pub fn without_typewriter(mut self) -> Self {
        self.typewriter = false;
        self
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_error(e: dialoguer::Error) -> Error {
    match e {
        dialoguer::Error::IO(e) => Error::Io(e),
    }
}

impl Prompter for DialoguerPrompter {
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(prompt_error)
    }

    fn select(&mut self, prompt: &str, items: &[&str], default: usize) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn say(&mut self, message: &str) {
        println!("{}", output::highlight(message));
    }

    fn complain(&mut self, message: &str) {
        println!("{}", output::failure(message));
    }

    fn banner(&mut self) {
        let shown = if self.typewriter {
            output::typewriter(output::LOGO, output::TYPEWRITER_DELAY)
        } else {
            output::print_logo()
        };
        if let Err(e) = shown {
            tracing::debug!(error = %e, "Could not print logo");
        }
    }
}
