use chaddi_console::{ConsoleApi, HttpApi, Settings};
use clap::Parser;
use colored::Colorize;
use eyre::Result;

#[derive(Debug, Parser)]
pub struct SetRokdaArgs {
    /// Telegram id of the bakchod
    #[arg(long)]
    pub id: String,

    /// New balance
    #[arg(long)]
    pub rokda: String,
}

impl SetRokdaArgs {
    pub fn run(&self, settings: &Settings) -> Result<()> {
        if self.rokda.trim().parse::<f64>().is_err() {
            return Err(eyre::eyre!("rokda must be a number, got '{}'", self.rokda));
        }
        let api = HttpApi::new(&settings.base_url, settings.timeout);
        let body = api.update_rokda(&self.id, self.rokda.trim())?;
        report_success(&format!("rokda of {} set to {}", self.id, self.rokda.trim()), &body);
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct SetMetadataArgs {
    /// Telegram id of the bakchod
    #[arg(long)]
    pub id: String,

    /// Metadata document, as JSON
    #[arg(long)]
    pub metadata: String,
}

impl SetMetadataArgs {
    pub fn run(&self, settings: &Settings) -> Result<()> {
        serde_json::from_str::<serde_json::Value>(&self.metadata)
            .map_err(|e| eyre::eyre!("metadata is not valid JSON: {}", e))?;
        let api = HttpApi::new(&settings.base_url, settings.timeout);
        let body = api.update_metadata(&self.id, &self.metadata)?;
        report_success(&format!("metadata of {} updated", self.id), &body);
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct SendArgs {
    /// Chat to post into
    #[arg(long, allow_hyphen_values = true)]
    pub chat_id: String,

    /// Message text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

impl SendArgs {
    pub fn run(&self, settings: &Settings) -> Result<()> {
        let text = self.text.join(" ");
        let api = HttpApi::new(&settings.base_url, settings.timeout);
        let body = api.send_message(&self.chat_id, &text)?;
        report_success(&format!("sent to {}", self.chat_id), &body);
        Ok(())
    }
}

fn report_success(what: &str, body: &str) {
    println!("{} {}", "✔".green().bold(), what);
    let body = body.trim();
    if !body.is_empty() {
        println!("{}", body.dimmed());
    }
}
