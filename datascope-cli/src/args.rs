use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use datascope::{PricingTemplate, ReferenceTemplate, ReportTemplateType};

/// DataScope Select extractions from the command line.
///
/// Credentials come from flags or the environment (a `.env` file in the
/// working directory is read first).
#[derive(Debug, Parser)]
#[command(name = "dss", version, about)]
pub struct Cli {
    /// Account name.
    #[arg(long, env = "DSS_USERNAME", global = true)]
    pub username: Option<String>,

    /// Account password.
    #[arg(long, env = "DSS_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// API root, e.g. a proxy in front of the hosted API.
    #[arg(long, env = "DSS_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Seconds between polls of a running extraction.
    #[arg(long, global = true, default_value_t = 30)]
    pub poll_interval_secs: u64,

    /// Give up after this many polls.
    #[arg(long, global = true)]
    pub max_polls: Option<u32>,

    /// Answer from built-in fixtures instead of the vendor.
    #[arg(long, env = "DATASCOPE_USE_MOCK", global = true)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Valid field names of a report template family.
    Fields {
        /// Template family, e.g. `EndOfDayPricing`.
        template: ReportTemplateType,
    },
    /// Identifier types accepted in instrument files.
    IdentifierTypes,
    /// Validate instruments and print the vendor's summary.
    Validate {
        #[command(flatten)]
        input: InstrumentArgs,
        /// Also write the summary and every validated row here.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Stored preferences of the account.
    Preferences,
    /// Content rights of the account.
    Rights,
    /// Bond schedule type codes.
    BondScheduleTypes,
    /// End of day or premium pricing.
    Price {
        /// `eod`, `peod` or `prem`.
        #[arg(long, default_value = "eod")]
        template: PricingTemplate,
        /// Only report today's prices.
        #[arg(long)]
        today_only: bool,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Price history over a date range.
    PriceHistory {
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Price on one past day.
    HistoricalPrice {
        /// Pricing date (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Intraday pricing snapshot.
    Intraday {
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Composite report.
    Composite {
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Reference data.
    Reference {
        /// `tnc`, `bs`, `rg`, `mbf`, `trf`, `fa`, `own` or `sym`.
        #[arg(long, default_value = "tnc")]
        template: ReferenceTemplate,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Bond schedules of the given types.
    BondSchedule {
        /// Schedule type codes, see `bond-schedule-types`.
        #[arg(long, value_delimiter = ',', required = true)]
        types: Vec<String>,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Historical reference data over a date range.
    HistoricalReference {
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Lipper fund holdings.
    Holdings {
        /// Allocation types; currency and full holdings when omitted.
        #[arg(long, value_delimiter = ',')]
        allocation_types: Vec<String>,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Corporate actions for one event class, or the all-events delta.
    Corax(CoraxArgs),
    /// Submit a request body from a JSON file.
    Raw {
        /// Request body file with an `ExtractionRequest` object.
        request: PathBuf,
        #[command(flatten)]
        extract: ExtractArgs,
    },
}

/// Instruments to load.
#[derive(Debug, Args)]
pub struct InstrumentArgs {
    /// Header-less CSV of `type,identifier[,source]` rows.
    #[arg(long, conflicts_with = "identifier")]
    pub instruments: Option<PathBuf>,

    /// A single identifier instead of a file.
    #[arg(long)]
    pub identifier: Option<String>,

    /// Type of `--identifier`.
    #[arg(long, default_value = "Ric")]
    pub identifier_type: String,

    /// Source of `--identifier`.
    #[arg(long, requires = "identifier")]
    pub source: Option<String>,

    /// Send instruments without validating them first.
    #[arg(long)]
    pub no_validate: bool,
}

/// Inputs and outputs shared by the extraction commands.
#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub input: InstrumentArgs,

    /// Comma separated content field names.
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Contents CSV; standard output when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Extraction notes text file.
    #[arg(long)]
    pub notes: Option<PathBuf>,

    /// RIC maintenance text file.
    #[arg(long)]
    pub ric_maintenance: Option<PathBuf>,

    /// Submit to `Extractions/Extract`, which returns no notes.
    #[arg(long)]
    pub plain: bool,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    /// First day (YYYY-MM-DD).
    #[arg(long)]
    pub start: NaiveDate,
    /// Last day (YYYY-MM-DD).
    #[arg(long)]
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoraxEvent {
    CapitalChange,
    Dividends,
    Earnings,
    MergersAcquisitions,
    NominalValue,
    EquityOfferings,
    SharesOutstanding,
    VotingRights,
    /// All event classes, changes since the previous run.
    Delta,
}

#[derive(Debug, Args)]
pub struct CoraxArgs {
    /// Event class.
    #[arg(value_enum)]
    pub event: CoraxEvent,

    /// Date the events are selected by, as a short code (`ann`, `exd`, ...).
    #[arg(long)]
    pub date_type: Option<String>,

    /// Share amount types for `shares-outstanding`.
    #[arg(long, value_delimiter = ',')]
    pub share_types: Vec<String>,

    /// Instrument filter for `delta`.
    #[arg(long, default_value = "All")]
    pub filter: String,

    /// Identifier type reported back by `delta`.
    #[arg(long, default_value = "Ric")]
    pub preferred_type: String,

    /// First day (YYYY-MM-DD); required except for `delta`.
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD).
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    #[command(flatten)]
    pub extract: ExtractArgs,
}
