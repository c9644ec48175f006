use crate::credentials::{CredentialSource, DEFAULT_KEY_FILE, DEFAULT_SECRET_VAR};
use crate::sheets::LocalSheet;
use crate::theme::ThemeName;
use clap::{Parser, ValueEnum};
use ledger_quiz_core::DEFAULT_TOP;
use std::path::PathBuf;

/// Spreadsheet that collects the scores
pub const DEFAULT_SHEET_NAME: &str = "StudentScores";
/// Question bank shipped next to the binary
pub const DEFAULT_QUESTIONS_FILE: &str = "questions.json";

/// Which worksheet backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    /// Local development - file-based rows
    Local,
    /// Testing - in-memory rows
    Test,
    /// Production - Google Sheets
    Production,
}

impl Environment {
    /// `QUIZ_ENV` wins; otherwise production whenever a credential is present
    pub fn detect(credentials: &CredentialSource) -> Self {
        match std::env::var("QUIZ_ENV").ok().as_deref().and_then(Self::parse) {
            Some(env) => env,
            None if credentials.is_available() => Environment::Production,
            None => Environment::Local,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "production" | "prod" => Some(Environment::Production),
            "test" | "testing" => Some(Environment::Test),
            "local" | "dev" => Some(Environment::Local),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Environment::Local => "Local",
            Environment::Test => "Test",
            Environment::Production => "Google Sheets",
        }
    }
}

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "ledger-quiz", version, about = "Debit or Credit Challenge")]
pub struct Args {
    /// Question bank (JSON array)
    #[arg(long, default_value = DEFAULT_QUESTIONS_FILE)]
    pub questions: PathBuf,

    /// Spreadsheet that stores the scores
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    pub sheet: String,

    /// Local service-account key used when the secret is not set
    #[arg(long, default_value = DEFAULT_KEY_FILE)]
    pub credentials_file: PathBuf,

    /// Environment variable holding the Base64 service-account key
    #[arg(long, default_value = DEFAULT_SECRET_VAR)]
    pub secret_var: String,

    /// Score backend; detected from QUIZ_ENV and available credentials when omitted
    #[arg(long, value_enum)]
    pub env: Option<Environment>,

    /// Number of leaderboard entries to show
    #[arg(long, default_value_t = DEFAULT_TOP)]
    pub leaderboard_size: usize,

    /// Link shown to players for inviting classmates
    #[arg(long, env = "QUIZ_INVITE_URL")]
    pub invite_url: Option<String>,

    /// Log file (the terminal is used by the game)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "dark")]
    pub theme: ThemeName,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub questions_path: PathBuf,
    pub sheet_name: String,
    pub credentials: CredentialSource,
    pub environment: Environment,
    pub leaderboard_size: usize,
    pub invite_url: Option<String>,
    pub log_file: PathBuf,
    pub local_sheet_path: PathBuf,
    pub theme: ThemeName,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        let credentials = CredentialSource {
            secret_var: args.secret_var,
            key_file: args.credentials_file,
        };
        let environment = args
            .env
            .unwrap_or_else(|| Environment::detect(&credentials));
        let data_dir = data_dir();

        Self {
            questions_path: args.questions,
            local_sheet_path: LocalSheet::default_path(&data_dir, &args.sheet),
            sheet_name: args.sheet,
            credentials,
            environment,
            leaderboard_size: args.leaderboard_size.max(1),
            invite_url: args.invite_url.filter(|u| !u.trim().is_empty()),
            log_file: args
                .log_file
                .unwrap_or_else(|| data_dir.join("ledger-quiz.log")),
            theme: args.theme,
        }
    }
}

/// Per-user data directory for logs and local scores
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ledger-quiz")
}
