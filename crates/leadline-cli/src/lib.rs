#![forbid(unsafe_code)]
//! `leadline` operator CLI.

mod payload_commands;
mod smoke;

use clap::{error::ErrorKind, Parser, Subcommand};
use leadline_api::API_VERSION;
use leadline_core::{ExitCode, MachineError};
use leadline_model::ProductLine;
use leadline_server::{validate_startup_config_contract, ServerConfig};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use std::time::Duration;

pub const CRATE_NAME: &str = "leadline-cli";

#[derive(Parser)]
#[command(name = "leadline")]
#[command(about = "Lead intake operations CLI")]
#[command(
    after_help = "Environment:\n  LEADLINE_*   server configuration read by `config check`"
)]
struct Cli {
    /// Compact JSON on stdout and machine errors on stderr.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a quote (or contact message) payload file.
    Validate {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, value_parser = parse_product, conflicts_with = "contact")]
        product: Option<ProductLine>,
        #[arg(long, default_value_t = false)]
        contact: bool,
    },
    /// Print the CRM record the server would send for a payload file.
    CrmRecord {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, value_parser = parse_product, conflicts_with = "contact")]
        product: Option<ProductLine>,
        #[arg(long, default_value_t = false)]
        contact: bool,
    },
    /// Print a payload that passes validation.
    Sample {
        #[arg(long, value_parser = parse_product, conflicts_with = "contact")]
        product: Option<ProductLine>,
        #[arg(long, default_value_t = false)]
        contact: bool,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Exercise a running server end to end.
    Smoke {
        #[arg(long)]
        base_url: String,
        #[arg(long, value_delimiter = ',', value_parser = parse_product)]
        products: Vec<ProductLine>,
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
    Version,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Load LEADLINE_* settings, check the startup contract, print the
    /// redacted result.
    Check,
}

fn parse_product(raw: &str) -> Result<ProductLine, String> {
    ProductLine::parse(raw).ok_or_else(|| {
        let supported: Vec<&str> = ProductLine::ALL.iter().map(|p| p.as_str()).collect();
        format!("unknown product `{raw}` (expected one of {})", supported.join(", "))
    })
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OutputMode {
    pub(crate) json: bool,
}

impl OutputMode {
    pub(crate) fn emit(self, value: &Value) -> Result<(), CliError> {
        let text = if self.json {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        }
        .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{text}");
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct CliError {
    pub(crate) exit_code: ExitCode,
    pub(crate) machine: MachineError,
}

impl CliError {
    pub(crate) fn usage(message: &str) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            machine: MachineError::new("usage_error", message),
        }
    }

    pub(crate) fn validation(code: &str, message: &str) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new(code, message),
        }
    }

    pub(crate) fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new("internal_error", &message),
        }
    }

    pub(crate) fn dependency(message: String) -> Self {
        Self {
            exit_code: ExitCode::DependencyFailure,
            machine: MachineError::new("dependency_failure", &message),
        }
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine.message);
    }
}

#[must_use]
pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                let mut usage = CliError::usage("invalid command line arguments");
                usage.machine = usage.machine.with_detail("error", &err.to_string());
                return Err(usage);
            }
        },
    };
    let out = OutputMode { json: cli.json };
    let command = cli
        .command
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;

    match command {
        Commands::Validate {
            file,
            product,
            contact,
        } => payload_commands::run_validate(&file, product, contact, out),
        Commands::CrmRecord {
            file,
            product,
            contact,
        } => payload_commands::run_crm_record(&file, product, contact, out),
        Commands::Sample { product, contact } => {
            payload_commands::run_sample(product, contact, out)
        }
        Commands::Config {
            command: ConfigCommand::Check,
        } => run_config_check(out),
        Commands::Smoke {
            base_url,
            products,
            timeout_ms,
        } => {
            let products = if products.is_empty() {
                ProductLine::ALL.to_vec()
            } else {
                products
            };
            smoke::run_smoke(&base_url, &products, Duration::from_millis(timeout_ms), out)
        }
        Commands::Version => out.emit(&json!({
            "name": "leadline",
            "version": env!("CARGO_PKG_VERSION"),
            "api_version": API_VERSION,
        })),
    }
}

fn run_config_check(out: OutputMode) -> Result<(), CliError> {
    let cfg = ServerConfig::from_env()
        .map_err(|e| CliError::validation("config_invalid", &e.to_string()))?;
    validate_startup_config_contract(&cfg)
        .map_err(|e| CliError::validation("config_invalid", &e.to_string()))?;
    out.emit(&json!({
        "status": "ok",
        "effective_crm_mode": cfg.crm.effective_mode().as_str(),
        "config": cfg.redacted_summary(),
    }))
}
