mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::backups::BackupsArgs;
use commands::diagnosis::DiagnoseArgs;
use commands::investment::{InvestArgs, LoanScheduleArgs};
use commands::submit::{SubmitConsultationArgs, SubmitDiagnosisArgs, UpdateResultArgs};
use commands::tax::{CorporateTaxArgs, IncomeTaxArgs, VatArgs};
use commands::ClientOpts;

/// Policy-fund, self-diagnosis and tax calculators for small businesses
#[derive(Parser)]
#[command(
    name = "mcenter",
    version,
    about = "Policy-fund, self-diagnosis and tax calculators for small businesses",
    long_about = "A CLI for the M-Center consulting toolkit: policy-fund investment \
                  analysis (NPV, IRR, payback, DSCR), loan schedules, the 20-question \
                  management self-diagnosis, Korean income/corporate/VAT estimates, \
                  and submission of diagnosis and consultation forms to the Apps \
                  Script backend with local backup on failure."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    #[command(flatten)]
    client: ClientOpts,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a policy-fund investment for one scenario
    Invest(InvestArgs),
    /// Compare pessimistic, base and optimistic scenarios
    Scenarios(InvestArgs),
    /// Year-by-year repayment schedule for a loan
    LoanSchedule(LoanScheduleArgs),
    /// Score the 20-question management self-diagnosis
    Diagnose(DiagnoseArgs),
    /// Comprehensive income tax for a sole proprietor
    IncomeTax(IncomeTaxArgs),
    /// Corporate income tax
    CorporateTax(CorporateTaxArgs),
    /// VAT payable for a filing period
    Vat(VatArgs),
    /// Score and submit a diagnosis form
    SubmitDiagnosis(SubmitDiagnosisArgs),
    /// Submit a consultation request
    SubmitConsultation(SubmitConsultationArgs),
    /// Write a scored diagnosis result back to the sheet
    UpdateResult(UpdateResultArgs),
    /// Inspect or re-send locally backed-up submissions
    Backups(BackupsArgs),
    /// Show the effective configuration
    Config,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Invest(args) => commands::investment::run_invest(args),
        Commands::Scenarios(args) => commands::investment::run_scenarios(args),
        Commands::LoanSchedule(args) => commands::investment::run_loan_schedule(args),
        Commands::Diagnose(args) => commands::diagnosis::run_diagnose(args),
        Commands::IncomeTax(args) => commands::tax::run_income_tax(args),
        Commands::CorporateTax(args) => commands::tax::run_corporate_tax(args),
        Commands::Vat(args) => commands::tax::run_vat(args),
        Commands::SubmitDiagnosis(args) => {
            commands::submit::run_submit_diagnosis(args, &cli.client)
        }
        Commands::SubmitConsultation(args) => {
            commands::submit::run_submit_consultation(args, &cli.client)
        }
        Commands::UpdateResult(args) => commands::submit::run_update_result(args, &cli.client),
        Commands::Backups(args) => commands::backups::run_backups(args, &cli.client),
        Commands::Config => commands::run_config(&cli.client),
        Commands::Version => {
            println!("mcenter {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
