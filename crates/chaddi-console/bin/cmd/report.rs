use chaddi_console::report::{render_dashboard, render_messages, DashboardReport, Format};
use chaddi_console::worker::execute;
use chaddi_console::{ConsoleApi, Dashboard, HttpApi, Settings};
use clap::Parser;
use eyre::Result;

#[derive(Debug, Parser)]
pub struct DashboardArgs {
    /// Output format: table, json, json-pretty or html
    #[arg(long, default_value = "table")]
    pub format: Format,
}

impl DashboardArgs {
    pub fn run(&self, settings: &Settings) -> Result<()> {
        let api = HttpApi::new(&settings.base_url, settings.timeout);
        let mut dashboard = Dashboard::new();
        for request in dashboard.refresh() {
            dashboard.apply(execute(&api, request));
        }

        let report = DashboardReport::from_dashboard(&dashboard);
        if report.metrics.is_none()
            && report.activity.is_none()
            && report.version.is_none()
            && report.health.is_none()
        {
            let reasons: Vec<String> = report
                .errors
                .iter()
                .map(|(card, error)| format!("{}: {}", card, error))
                .collect();
            return Err(eyre::eyre!(
                "Could not load the dashboard from {} ({})",
                settings.base_url,
                reasons.join("; ")
            ));
        }

        println!("{}", render_dashboard(&report, self.format)?.trim_end());
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct MessagesArgs {
    /// Group to read
    #[arg(long, allow_hyphen_values = true)]
    pub group_id: String,

    /// History page, 1 being the newest
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Output format: table, json, json-pretty or html
    #[arg(long, default_value = "table")]
    pub format: Format,
}

impl MessagesArgs {
    pub fn run(&self, settings: &Settings) -> Result<()> {
        let api = HttpApi::new(&settings.base_url, settings.timeout);
        let page = api.group_messages(&self.group_id, self.page.max(1))?;
        let mut messages = page.messages;
        // newest first on the wire
        messages.reverse();

        let out = render_messages(&messages, self.format, chrono::Utc::now())?;
        println!("{}", out.trim_end());
        if self.format == Format::Table {
            println!("page {} of {}", self.page.max(1), page.total_pages);
        }
        Ok(())
    }
}
