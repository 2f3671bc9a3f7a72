use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::models::{Gender, Language, LocationType, MessageRole, MessageType, VisitStatus};
use crate::query::dates::{parse_date, parse_month};
use crate::query::filter::{DateWindow, HostSort, SpeakerSort, StatusFilter};

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}': expected YYYY-MM-DD", s))
}

fn parse_month_arg(s: &str) -> Result<NaiveDate, String> {
    parse_month(s).ok_or_else(|| format!("invalid month '{}': expected YYYY-MM", s))
}

fn parse_gender(s: &str) -> Result<Gender, String> {
    Gender::parse(s).ok_or_else(|| format!("invalid gender '{}': expected 'male' or 'female'", s))
}

fn parse_status(s: &str) -> Result<VisitStatus, String> {
    VisitStatus::parse(s)
        .ok_or_else(|| format!("invalid status '{}': expected confirmed, pending, cancelled or completed", s))
}

fn parse_location(s: &str) -> Result<LocationType, String> {
    LocationType::parse(s).ok_or_else(|| format!("invalid location '{}': expected physical, zoom or streaming", s))
}

fn parse_language(s: &str) -> Result<Language, String> {
    Language::parse(s).ok_or_else(|| format!("invalid language '{}': expected 'fr' or 'cv'", s))
}

fn parse_message_type(s: &str) -> Result<MessageType, String> {
    MessageType::parse(s).ok_or_else(|| {
        let names: Vec<&str> = MessageType::ALL.iter().map(|m| m.as_str()).collect();
        format!("invalid message type '{}': expected one of {}", s, names.join(", "))
    })
}

fn parse_role(s: &str) -> Result<MessageRole, String> {
    MessageRole::parse(s).ok_or_else(|| format!("invalid role '{}': expected 'speaker' or 'host'", s))
}

#[derive(Parser, Debug)]
#[command(name = "kbv", version = env!("KBV_VERSION"), about = "Schedule visiting speakers and their hosts")]
pub struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output (uses human-readable format without ANSI codes)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use a specific database file instead of the default
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Treat this date as today for upcoming, calendar and dashboard views [YYYY-MM-DD]
    #[arg(long, global = true, value_parser = parse_date_arg)]
    pub as_of: Option<NaiveDate>,

    /// Enable verbose output for debugging storage, migrations and spreadsheet sync
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Records ===
    /// Manage visiting speakers
    #[command(visible_alias = "sp")]
    Speakers {
        #[command(subcommand)]
        action: SpeakerAction,
    },

    /// Manage hosts and their availability
    Hosts {
        #[command(subcommand)]
        action: HostAction,
    },

    /// Manage scheduled visits
    #[command(visible_alias = "v")]
    Visits {
        #[command(subcommand)]
        action: VisitAction,
    },

    /// Completed visits
    Archive {
        #[command(subcommand)]
        action: ArchiveAction,
    },

    // === Views ===
    /// Visits from today on
    #[command(visible_alias = "up")]
    Upcoming,

    /// One month of visits and past talks
    Calendar {
        /// Month to show [YYYY-MM], defaults to the current month
        #[arg(long, value_parser = parse_month_arg)]
        month: Option<NaiveDate>,
    },

    /// Counts, next visits and most frequent speakers and hosts
    Dashboard,

    /// Upcoming in-person visits without a host
    NeedsHost {
        /// How many months ahead to look (defaults to the config value)
        #[arg(long)]
        months: Option<u32>,
    },

    /// Search speakers, visits and hosts
    #[command(visible_alias = "s")]
    Search {
        /// Search term
        term: String,
    },

    // === Settings and data ===
    /// Custom message templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Spreadsheet sync settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Pull the schedule from the configured Google spreadsheet
    Sync {
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a JSON backup of every collection
    Export {
        /// Output file (defaults to stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Replace all data with a JSON backup
    Import {
        /// Backup file
        file: PathBuf,
    },

    /// Delete all data
    Reset {
        /// Confirm deleting every record
        #[arg(long)]
        yes: bool,
    },

    /// Show database statistics
    Info,
}

// === Speaker Subcommands ===

#[derive(Subcommand, Debug)]
pub enum SpeakerAction {
    /// List speakers
    #[command(visible_alias = "ls")]
    List {
        /// Filter by name or congregation fragment
        #[arg(long)]
        search: Option<String>,

        /// Only speakers from this congregation
        #[arg(long)]
        congregation: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value_t)]
        sort: SpeakerSort,
    },

    /// Show a speaker with talk history and scheduled visits
    Show {
        /// Speaker ID or name fragment
        speaker: String,
    },

    /// Add a speaker
    Add {
        /// Full name
        name: String,

        /// Congregation
        #[arg(long)]
        congregation: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Edit a speaker
    Edit {
        /// Speaker ID or name fragment
        speaker: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        congregation: Option<String>,

        /// Phone number (empty string clears it)
        #[arg(long)]
        phone: Option<String>,

        /// Notes (empty string clears them)
        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a speaker and their scheduled visits
    #[command(visible_alias = "rm")]
    Remove {
        /// Speaker ID or name fragment
        speaker: String,
    },
}

// === Host Subcommands ===

#[derive(Subcommand, Debug)]
pub enum HostAction {
    /// List hosts
    #[command(visible_alias = "ls")]
    List {
        /// Filter by name or phone fragment
        #[arg(long)]
        search: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value_t)]
        sort: HostSort,
    },

    /// Show a host with address and unavailability periods
    Show {
        /// Host name
        host: String,
    },

    /// Add a host
    Add {
        /// Name (must be unique)
        name: String,

        #[arg(long)]
        phone: String,

        /// male or female
        #[arg(long, value_parser = parse_gender, default_value = "male")]
        gender: Gender,

        #[arg(long)]
        address: Option<String>,
    },

    /// Edit a host
    Edit {
        /// Host name
        host: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long, value_parser = parse_gender)]
        gender: Option<Gender>,

        /// Address (empty string clears it)
        #[arg(long)]
        address: Option<String>,
    },

    /// Remove a host; their visits go back to unassigned
    #[command(visible_alias = "rm")]
    Remove {
        /// Host name
        host: String,
    },

    /// Mark a host unavailable for a date range
    Block {
        /// Host name
        host: String,

        /// First unavailable day [YYYY-MM-DD]
        #[arg(long, value_parser = parse_date_arg)]
        from: NaiveDate,

        /// Last unavailable day [YYYY-MM-DD]
        #[arg(long, value_parser = parse_date_arg)]
        to: NaiveDate,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Remove an unavailability period
    Unblock {
        /// Host name
        host: String,

        /// Period ID or prefix
        period: String,
    },

    /// Hosts free and busy on a date
    Available {
        /// Date [YYYY-MM-DD]
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,
    },
}

// === Visit Subcommands ===

#[derive(Subcommand, Debug)]
pub enum VisitAction {
    /// List scheduled visits
    #[command(visible_alias = "ls")]
    List {
        #[arg(long, value_enum, default_value_t)]
        status: StatusFilter,

        #[arg(long, value_enum, default_value_t)]
        window: DateWindow,
    },

    /// Show a visit
    Show {
        /// Visit ID or prefix
        visit: String,
    },

    /// Schedule a visit for a speaker
    Schedule {
        /// Speaker ID or name fragment
        speaker: String,

        /// Visit date [YYYY-MM-DD]
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Time (defaults to the config value)
        #[arg(long)]
        time: Option<String>,

        /// Host name, or Zoom / Streaming / PAS BESOIN
        #[arg(long)]
        host: Option<String>,

        /// physical, zoom or streaming
        #[arg(long, value_parser = parse_location, default_value = "physical")]
        location: LocationType,

        #[arg(long, value_parser = parse_status, default_value = "pending")]
        status: VisitStatus,

        /// Talk number or type
        #[arg(long)]
        talk: Option<String>,

        #[arg(long)]
        theme: Option<String>,
    },

    /// Edit a visit
    Edit {
        /// Visit ID or prefix
        visit: String,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        #[arg(long)]
        time: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long, value_parser = parse_location)]
        location: Option<LocationType>,

        #[arg(long, value_parser = parse_status)]
        status: Option<VisitStatus>,

        #[arg(long)]
        talk: Option<String>,

        #[arg(long)]
        theme: Option<String>,

        #[arg(long)]
        accommodation: Option<String>,

        #[arg(long)]
        meals: Option<String>,

        /// Notes (empty string clears them)
        #[arg(long)]
        notes: Option<String>,
    },

    /// Attach a file (up to 2 MiB) to a visit
    Attach {
        /// Visit ID or prefix
        visit: String,

        file: PathBuf,
    },

    /// Move a visit to the archive and record it in the speaker's history
    Complete {
        /// Visit ID or prefix
        visit: String,
    },

    /// Delete a scheduled visit
    #[command(visible_alias = "rm")]
    Remove {
        /// Visit ID or prefix
        visit: String,
    },

    /// Record that a message was sent
    Log {
        /// Visit ID or prefix
        visit: String,

        /// preparation, reminder-7, reminder-2, thanks or needs
        #[arg(value_parser = parse_message_type)]
        message: MessageType,

        /// speaker or host
        #[arg(value_parser = parse_role)]
        role: MessageRole,
    },
}

// === Archive Subcommands ===

#[derive(Subcommand, Debug)]
pub enum ArchiveAction {
    /// List completed visits, most recent first
    #[command(visible_alias = "ls")]
    List,

    /// Delete an archived visit
    #[command(visible_alias = "rm")]
    Remove {
        /// Visit ID or prefix
        visit: String,
    },
}

// === Template Subcommands ===

#[derive(Subcommand, Debug)]
pub enum TemplateAction {
    /// List custom templates
    #[command(visible_alias = "ls")]
    List,

    /// Override a message template
    Set {
        #[arg(value_parser = parse_language)]
        language: Language,

        #[arg(value_parser = parse_message_type)]
        message: MessageType,

        #[arg(value_parser = parse_role)]
        role: MessageRole,

        text: String,
    },

    /// Remove a message template override
    Reset {
        #[arg(value_parser = parse_language)]
        language: Language,

        #[arg(value_parser = parse_message_type)]
        message: MessageType,

        #[arg(value_parser = parse_role)]
        role: MessageRole,
    },

    /// Override the host-request message
    HostRequestSet {
        #[arg(value_parser = parse_language)]
        language: Language,

        text: String,
    },

    /// Remove the host-request override
    HostRequestReset {
        #[arg(value_parser = parse_language)]
        language: Language,
    },
}

// === Settings Subcommands ===

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show the sync settings
    Show,

    /// Set the Google spreadsheet ID
    SetSheet { id: String },

    /// Set the Google API key
    SetKey { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_of_is_parsed_as_a_date() {
        let cli = Cli::try_parse_from(["kbv", "--as-of", "2025-06-01", "upcoming"]).unwrap();
        assert_eq!(cli.as_of, NaiveDate::from_ymd_opt(2025, 6, 1));
    }

    #[test]
    fn invalid_as_of_is_rejected() {
        assert!(Cli::try_parse_from(["kbv", "--as-of", "01/06/2025", "upcoming"]).is_err());
    }

    #[test]
    fn visit_list_filters_default_to_active_all() {
        let cli = Cli::try_parse_from(["kbv", "visits", "list"]).unwrap();
        match cli.command {
            Commands::Visits {
                action: VisitAction::List { status, window },
            } => {
                assert_eq!(status, StatusFilter::Active);
                assert_eq!(window, DateWindow::All);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn log_parses_message_and_role() {
        let cli = Cli::try_parse_from(["kbv", "visits", "log", "abc", "reminder-7", "host"]).unwrap();
        match cli.command {
            Commands::Visits {
                action: VisitAction::Log { message, role, .. },
            } => {
                assert_eq!(message, MessageType::Reminder7);
                assert_eq!(role, MessageRole::Host);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn calendar_month_requires_year_and_month() {
        let cli = Cli::try_parse_from(["kbv", "calendar", "--month", "2025-07"]).unwrap();
        match cli.command {
            Commands::Calendar { month } => assert_eq!(month, NaiveDate::from_ymd_opt(2025, 7, 1)),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["kbv", "calendar", "--month", "July"]).is_err());
    }
}
