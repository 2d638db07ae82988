use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use session::{CartConfigPatch, EventTarget};

#[derive(Debug, Parser)]
#[command(name = "cart-cli", version, about = "Automatic ticket carting")]
pub struct Cli {
    /// Emit JSON log lines instead of the pretty format.
    #[arg(long, env = "LOG_JSON", global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cart one event against a scripted page fixture and print the outcome.
    Run(RunArgs),

    /// Show or edit the saved carting preferences.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long)]
    pub event_id: String,

    #[arg(long)]
    pub event_url: String,

    /// Display name; defaults to the event id.
    #[arg(long)]
    pub event_name: Option<String>,

    /// JSON page fixture: one page, or a list with one page per attempt.
    #[arg(long)]
    pub fixture: PathBuf,

    /// Stop waiting for an outcome after this many seconds.
    #[arg(long, default_value_t = 900)]
    pub wait_secs: u64,
}

impl RunArgs {
    pub fn target(&self) -> EventTarget {
        let name = self.event_name.as_deref().unwrap_or(&self.event_id);
        EventTarget::new(&self.event_id, &self.event_url, name)
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the active preferences as JSON.
    Show,

    /// Change preferences; omitted flags keep their saved value.
    Set(SetArgs),
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Tickets per attempt (1-8).
    #[arg(long)]
    pub quantity: Option<u8>,

    /// Highest acceptable price per ticket.
    #[arg(long)]
    pub max_price: Option<Decimal>,

    /// Preferred section name fragments, highest priority first.
    #[arg(long = "sections", value_delimiter = ',')]
    pub sections: Option<Vec<String>>,

    /// Take the first affordable section when no preferred one qualifies.
    #[arg(long)]
    pub fallback: Option<bool>,

    /// Automatic retries after a failed attempt.
    #[arg(long)]
    pub retries: Option<u32>,

    #[arg(long)]
    pub notifications: Option<bool>,
}

impl SetArgs {
    pub fn into_patch(self) -> CartConfigPatch {
        CartConfigPatch {
            enabled: self.enabled,
            ticket_quantity: self.quantity,
            max_price: self.max_price,
            preferred_sections: self.sections,
            fallback_to_any_section: self.fallback,
            auto_retry_attempts: self.retries,
            notifications: self.notifications,
        }
    }
}
