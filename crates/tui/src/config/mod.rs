use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/moneyflow.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub email: String,
    pub state_path: String,
    pub log_file: String,
    pub log_level: String,
    pub debounce_ms: u64,
    pub enforce_positive_amount: bool,
    /// Type names shown as income; matched case-insensitively.
    pub income_type_names: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            email: String::new(),
            state_path: crate::local_state::default_state_path().to_string(),
            log_file: "moneyflow.log".to_string(),
            log_level: "info".to_string(),
            debounce_ms: 100,
            enforce_positive_amount: true,
            income_type_names: vec!["Доход".to_string(), "Income".to_string()],
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "moneyflow", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8000/).
    #[arg(long)]
    base_url: Option<String>,
    /// Prefill the login email (password is never read from CLI).
    #[arg(long)]
    email: Option<String>,
    /// Override the session state file.
    #[arg(long)]
    state: Option<String>,
    /// Override the log file.
    #[arg(long)]
    log_file: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(
        config::Environment::with_prefix("MONEYFLOW")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("income_type_names"),
    );
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(email) = args.email {
        settings.email = email;
    }
    if let Some(state) = args.state {
        settings.state_path = state;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }

    Ok(settings)
}
