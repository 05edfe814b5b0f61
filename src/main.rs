// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fundef_registry::config::AppConfig;
use fundef_registry::{
    apportion_records, export_apportionment_csv, export_apportionment_xlsx, export_csv,
    export_xlsx, list_drafts, list_teachers, parse_date, setup_database,
    teachers_for_apportionment, telemetry, EligibilityWindow, Money, ServantStatus, SortOrder,
};
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "fundef-registry",
    about = "Teacher registry and rateio for the FUNDEF back-pay",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse teachers, drafts and the rateio in the terminal (default command)
    Ui(UiArgs),
    /// Print the registered teachers
    List(ListArgs),
    /// Compute months worked for a date pair
    Months(MonthsArgs),
    /// Apportion a total across all registered teachers
    Rateio(RateioArgs),
    /// Export the registry to CSV or Excel
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
struct UiArgs {
    /// Pre-compute the rateio for this total (e.g. "1.000.000,00")
    #[arg(long)]
    total: Option<Money>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only show teachers with this status (ativo, aposentado, falecido, sem_vinculo)
    #[arg(long, value_parser = parse_status)]
    status: Option<ServantStatus>,
    /// Oldest registrations first
    #[arg(long)]
    oldest_first: bool,
}

#[derive(Args, Debug)]
struct MonthsArgs {
    /// First day worked (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long, value_parser = parse_date_arg)]
    start: NaiveDate,
    /// Last day worked (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long, value_parser = parse_date_arg)]
    end: NaiveDate,
    /// Ignore the FUNDEF eligibility window
    #[arg(long)]
    unrestricted: bool,
}

#[derive(Args, Debug)]
struct RateioArgs {
    /// Amount to distribute (e.g. 1000000.00 or "R$ 1.000.000,00")
    #[arg(long)]
    total: Money,
    /// Write the rateio to this file instead of printing it
    #[arg(long)]
    output: Option<PathBuf>,
    /// File format when --output is given
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,
    /// Destination file (defaults to professores.csv / professores.xlsx)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err:#}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let command = cli.command.unwrap_or_else(|| Command::Ui(UiArgs::default()));

    // The TUI owns the terminal
    if !matches!(command, Command::Ui(_)) {
        telemetry::init(&config.telemetry)?;
    }

    match command {
        Command::Ui(args) => run_ui_mode(&config, args),
        Command::List(args) => run_list(&config, args),
        Command::Months(args) => run_months(&config, args),
        Command::Rateio(args) => run_rateio(&config, args),
        Command::Export(args) => run_export(&config, args),
    }
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("'{raw}' is not a date (YYYY-MM-DD or DD/MM/YYYY)"))
}

fn parse_status(raw: &str) -> Result<ServantStatus, String> {
    ServantStatus::parse(raw).ok_or_else(|| format!("unknown status '{raw}'"))
}

fn check_total(total: Option<Money>) -> Result<()> {
    if total.is_some_and(|t| t.is_negative()) {
        bail!("total must not be negative");
    }
    Ok(())
}

fn open_database(config: &AppConfig) -> Result<Connection> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data directory {:?}", config.data_dir))?;

    let db_path = config.database_path();
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database at {:?}", db_path))?;
    setup_database(&conn).context("failed to set up database schema")?;
    Ok(conn)
}

fn run_list(config: &AppConfig, args: ListArgs) -> Result<()> {
    let conn = open_database(config)?;
    let order = if args.oldest_first {
        SortOrder::OldestFirst
    } else {
        SortOrder::NewestFirst
    };

    let teachers: Vec<_> = list_teachers(&conn, order)?
        .into_iter()
        .filter(|t| args.status.map_or(true, |s| t.status == s))
        .collect();

    println!("{:<6} {:<32} {:<15} {:<28} {:<12} {:>5}", "ID", "Nome", "CPF", "Escola", "Situação", "Meses");
    for t in &teachers {
        println!(
            "{:<6} {:<32} {:<15} {:<28} {:<12} {:>5}",
            t.id.unwrap_or_default(),
            t.name,
            t.cpf.formatted(),
            t.school,
            t.status.label(),
            t.months_worked
        );
    }
    println!("\n{} teacher(s)", teachers.len());
    Ok(())
}

fn run_months(config: &AppConfig, args: MonthsArgs) -> Result<()> {
    let window = if args.unrestricted {
        EligibilityWindow::unrestricted()
    } else {
        config.window
    };

    let months = window
        .months_worked(args.start, args.end)
        .with_context(|| format!("window {} to {}", window.start, window.end))?;

    println!("{months}");
    Ok(())
}

fn run_rateio(config: &AppConfig, args: RateioArgs) -> Result<()> {
    check_total(Some(args.total))?;

    let conn = open_database(config)?;
    let teachers = teachers_for_apportionment(&conn)?;
    let report = apportion_records(args.total, &teachers)?;
    info!(summary = %report.summary(), "rateio computed");

    if let Some(path) = args.output {
        let bytes = match args.format {
            ExportFormat::Csv => export_apportionment_csv(&report)?,
            ExportFormat::Xlsx => export_apportionment_xlsx(&report)?,
        };
        std::fs::write(&path, bytes).with_context(|| format!("failed to write {:?}", path))?;
        println!("Rateio written to {}", path.display());
        return Ok(());
    }

    println!("{:<32} {:<15} {:>5} {:>20}", "Nome", "CPF", "Meses", "Valor");
    for row in &report.rows {
        println!(
            "{:<32} {:<15} {:>5} {:>20}",
            row.name,
            row.cpf,
            row.months_worked,
            row.share.to_brl()
        );
    }
    println!("\n{}", report.summary());
    Ok(())
}

fn run_export(config: &AppConfig, args: ExportArgs) -> Result<()> {
    let conn = open_database(config)?;
    let teachers = list_teachers(&conn, SortOrder::NewestFirst)?;

    let bytes = match args.format {
        ExportFormat::Csv => export_csv(&teachers)?,
        ExportFormat::Xlsx => export_xlsx(&teachers)?,
    };
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("professores.{}", args.format.extension())));

    std::fs::write(&path, bytes).with_context(|| format!("failed to write {:?}", path))?;
    info!(path = %path.display(), teachers = teachers.len(), "registry exported");
    println!("{} teacher(s) exported to {}", teachers.len(), path.display());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig, args: UiArgs) -> Result<()> {
    check_total(args.total)?;
    let conn = open_database(config)?;

    let teachers = list_teachers(&conn, SortOrder::NewestFirst)?;
    let drafts = list_drafts(&conn)?;
    let report = match args.total {
        Some(total) if !teachers.is_empty() => {
            let ordered = teachers_for_apportionment(&conn)?;
            Some(apportion_records(total, &ordered)?)
        }
        _ => None,
    };

    let mut app = ui::App::new(teachers, drafts, report);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig, _args: UiArgs) -> Result<()> {
    bail!("TUI mode not available; rebuild with --features tui or run fundef-server")
}
