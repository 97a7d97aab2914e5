//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use console::{Style, Term};
use ipakit_types::{App, ColorChoice};
use std::io;

use crate::commands::{AccountSummary, CommandOutput, DownloadReport, PurchaseOutcome};

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandOutput) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_text(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &CommandOutput) -> io::Result<()> {
        let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    /// Render as formatted text
    fn render_text(&self, result: &CommandOutput) -> io::Result<()> {
        match result {
            CommandOutput::Account(account) => self.render_account(account),
            CommandOutput::Revoked { name } => {
                println!("Revoked credentials for '{name}'.");
                Ok(())
            }
            CommandOutput::App(app) => self.render_app(app),
            CommandOutput::AppList(apps) => self.render_app_list(apps),
            CommandOutput::Purchase(outcome) => self.render_purchase(outcome),
            CommandOutput::Download(report) => self.render_download(report),
        }
    }

    fn render_account(&self, account: &AccountSummary) -> io::Result<()> {
        println!(
            "Signed in as {} ({})",
            self.style_name(&account.name),
            account.email
        );
        if let Some(country) = &account.country {
            println!("Store front: {} ({country})", account.store_front);
        } else {
            println!("Store front: {}", account.store_front);
        }
        Ok(())
    }

    fn render_app(&self, app: &App) -> io::Result<()> {
        println!("{}", self.style_name(&app.name));
        println!();
        println!("Bundle ID: {}", app.bundle_id);
        println!("App ID:    {}", app.id);
        if !app.version.is_empty() {
            println!("Version:   {}", app.version);
        }
        println!("Price:     {}", format_price(app.price));
        Ok(())
    }

    fn render_app_list(&self, apps: &[App]) -> io::Result<()> {
        if apps.is_empty() {
            println!("No apps found.");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Bundle ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Price").add_attribute(Attribute::Bold),
        ]);

        for app in apps {
            table.add_row(vec![
                Cell::new(&app.bundle_id),
                Cell::new(&app.name),
                Cell::new(&app.version),
                Cell::new(format_price(app.price)),
            ]);
        }

        println!("{table}");
        Ok(())
    }

    fn render_purchase(&self, outcome: &PurchaseOutcome) -> io::Result<()> {
        if outcome.already_licensed {
            println!(
                "A license for {} already exists on this account.",
                self.style_name(&outcome.name)
            );
        } else {
            println!("Obtained a license for {}.", self.style_name(&outcome.name));
        }
        Ok(())
    }

    fn render_download(&self, report: &DownloadReport) -> io::Result<()> {
        println!(
            "Saved {} {} to {}",
            self.style_name(&report.name),
            report.version,
            report.output.display()
        );
        println!("Size: {}", format_size(report.size));
        println!("MD5:  {}", report.md5);
        Ok(())
    }

    /// Style an app or account name
    fn style_name(&self, name: &str) -> String {
        if self.supports_color() {
            Style::new().cyan().bold().apply_to(name).to_string()
        } else {
            name.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

/// Format byte size in human readable format
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}

/// Catalog prices are free or a plain decimal amount
fn format_price(price: f64) -> String {
    if price == 0.0 {
        "free".to_string()
    } else {
        format!("{price:.2}")
    }
}
