//! Terminal rendering: logo, tables, colored one-liners.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use console::{Term, style};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::category::Category;
use crate::status::EndpointStatus;

pub const LOGO: &str = r"   ______      __  __
  / ____/___ _/ /_/ /_____
 / /   / __ `/ __/ __/ __ \
/ /___/ /_/ / /_/ /_/ /_/ /
\____/\__,_/\__/\__/\____/
";

pub const TYPEWRITER_DELAY: Duration = Duration::from_millis(30);

pub fn print_logo() -> io::Result<()> {
    let term = Term::stdout();
    term.write_line(&style(LOGO).yellow().bold().to_string())
}

/// Print `text` one character at a time.
pub fn typewriter(text: &str, delay: Duration) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for ch in text.chars() {
        write!(out, "{}", style(ch).yellow())?;
        out.flush()?;
        std::thread::sleep(delay);
    }
    writeln!(out)
}

pub fn highlight(message: &str) -> String {
    style(message).cyan().bold().to_string()
}

pub fn success(message: &str) -> String {
    style(message).green().bold().to_string()
}

pub fn failure(message: &str) -> String {
    style(message).red().bold().to_string()
}

fn render(builder: Builder) -> String {
    builder.build().with(Style::rounded()).to_string()
}

pub fn categories_table(categories: &[Category]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["No.", "Category", "Endpoint"]);
    for (i, category) in categories.iter().enumerate() {
        builder.push_record([
            format!("{}.)", i + 1),
            category.name().to_string(),
            format!("/{}", category.spec().path),
        ]);
    }
    render(builder)
}

pub fn status_table(statuses: &[EndpointStatus]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["No.", "Category", "Endpoint", "Status", "Reason"]);
    for (i, status) in statuses.iter().enumerate() {
        let code = if status.is_ok() {
            style(status.status_code).green()
        } else {
            style(status.status_code).red()
        };
        builder.push_record([
            format!("{}.)", i + 1),
            status.category.name().to_string(),
            status.endpoint.to_string(),
            code.to_string(),
            status.reason.clone(),
        ]);
    }
    render(builder)
}

/// Name/version pairs shown by `catto version`.
pub fn version_entries() -> Vec<(&'static str, String)> {
    vec![
        ("Catto", format!("v{}", env!("CARGO_PKG_VERSION"))),
        (
            "Platform",
            format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        ),
    ]
}

pub fn version_table(entries: &[(&str, String)]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["No.", "Package", "Version"]);
    for (i, (name, version)) in entries.iter().enumerate() {
        builder.push_record([format!("{}.)", i + 1), name.to_string(), version.clone()]);
    }
    render(builder)
}

/// Summary shown before a download starts.
pub fn download_table(category: Category, amount: usize, directory: &Path) -> String {
    let name = directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut builder = Builder::default();
    builder.push_record(["Category", "Amount", "Directory", "Path"]);
    builder.push_record([
        category.name().to_string(),
        amount.to_string(),
        name,
        directory.display().to_string(),
    ]);
    render(builder)
}
