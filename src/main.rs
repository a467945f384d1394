use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

mod config;
mod error;
mod export;
mod filters;
mod models;
mod report;
mod stats;
mod store;
mod telemetry;

use config::AppConfig;
use export::{PrintLayout, PrintOptions};
use filters::{RawFilters, ReportFilters};
use models::{Company, Input, InputType, Offer, OfferStatus, Student};
use report::{Report, ReportKind};
use store::{JsonStore, PlacementStore};

#[derive(Parser)]
#[command(name = "placement-reports")]
#[command(about = "Placement tracking and reporting for the SVIT placement cell", long_about = None)]
struct Cli {
    /// Directory holding the JSON collections (overrides PLACEMENT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the sample students, offers and companies
    Seed,
    /// Import students from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show dashboard placement statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Generate a custom (filtered) or predefined report
    Report(ReportArgs),
    /// Manage students
    Student {
        #[command(subcommand)]
        command: StudentCommand,
    },
    /// Manage offers
    Offer {
        #[command(subcommand)]
        command: OfferCommand,
    },
    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommand,
    },
    /// Record or review feedback from students, companies and staff
    Input {
        #[command(subcommand)]
        command: InputCommand,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// highPackage, branchWise, companyWise, batchWise, studentPerformance or all;
    /// omit for a custom report shaped by the filter flags
    #[arg(value_parser = parse_kind)]
    kind: Option<ReportKind>,
    #[command(flatten)]
    filters: RawFilters,
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,
    /// Output file, or a directory to receive a dated export file
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Csv,
    Json,
    Html,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }
}

#[derive(Subcommand)]
enum StudentCommand {
    /// List students, optionally only those matching a search term
    List {
        /// Case-insensitive match on name, roll number, branch or email
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one student with their offers and related inputs
    Show { id: String },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        roll_number: String,
        #[arg(long)]
        branch: String,
        #[arg(long)]
        batch: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Change the given fields of a student
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        batch: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Delete a student together with their offers
    Delete { id: String },
}

#[derive(Subcommand)]
enum OfferCommand {
    /// List offers, optionally only those matching a search term
    List {
        /// Case-insensitive match on student name, roll number, company or role
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        student_id: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        role: String,
        /// Package in LPA
        #[arg(long)]
        package: f64,
        /// Offer date (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_date)]
        offer_date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_status, default_value = "Pending")]
        status: OfferStatus,
        /// Register the company with this industry if it is not known yet
        #[arg(long)]
        industry: Option<String>,
    },
    /// Change the given fields of an offer
    Update {
        id: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        role: Option<String>,
        /// Package in LPA
        #[arg(long)]
        package: Option<f64>,
        /// Offer date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        offer_date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_status)]
        status: Option<OfferStatus>,
    },
    /// Change the status of an offer
    Status {
        id: String,
        #[arg(value_parser = parse_status)]
        status: OfferStatus,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
enum CompanyCommand {
    /// List every company
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        industry: String,
        #[arg(long, default_value = "")]
        contact: String,
    },
    /// Change the given fields of a company
    Update {
        id: String,
        /// Offers keep referring to the previous name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
enum InputCommand {
    /// List every submitted input
    List,
    Add(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// student, company, placement or general
    #[arg(long = "type", value_parser = parse_input_type, default_value = "general")]
    kind: InputType,
    #[arg(long)]
    title: String,
    #[arg(long)]
    message: String,
    #[arg(long)]
    student_id: Option<String>,
    #[arg(long)]
    company_id: Option<String>,
    #[arg(long, default_value = "Admin")]
    submitted_by: String,
    #[arg(long, default_value = "admin")]
    role: String,
}

fn parse_kind(value: &str) -> Result<ReportKind, String> {
    value.parse()
}

fn parse_status(value: &str) -> Result<OfferStatus, String> {
    value.parse()
}

fn parse_input_type(value: &str) -> Result<InputType, String> {
    value.parse()
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{value}': {err}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    telemetry::init(&config).context("failed to initialise logging")?;

    let store = JsonStore::open(config.data_dir.clone()).with_context(|| {
        format!("failed to open data directory {}", config.data_dir.display())
    })?;

    match cli.command {
        Commands::Seed => {
            store.seed()?;
            println!("Seed data written to {}.", store.dir().display());
        }
        Commands::Import { csv } => {
            let inserted = store
                .import_students_csv(&csv)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!("Inserted {inserted} students from {}.", csv.display());
        }
        Commands::Stats { json } => {
            let snapshot = store.snapshot()?;
            let stats = stats::compute_stats(&snapshot.students, &snapshot.offers);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            println!("Total students: {}", stats.total_students);
            println!("Placed students: {}", stats.placed_students);
            println!("Placement rate: {:.2}%", stats.placement_rate.unwrap_or_default());
            println!("Average package: {:.2} LPA", stats.avg_package.unwrap_or_default());
            println!("Highest package: {} LPA", stats.highest_package);
            println!(
                "Top company: {} ({} offers)",
                stats.top_company.name, stats.top_company.count
            );
            if !stats.branch_stats.is_empty() {
                println!("Branches:");
                for branch in &stats.branch_stats {
                    println!(
                        "- {}: {} of {} placed ({:.2}%), avg {:.2} LPA",
                        branch.branch,
                        branch.placed_students,
                        branch.total_students,
                        branch.placement_rate.unwrap_or_default(),
                        branch.avg_package.unwrap_or_default()
                    );
                }
            }
        }
        Commands::Report(args) => run_report(&store, &config, args)?,
        Commands::Student { command } => run_student(&store, command)?,
        Commands::Offer { command } => run_offer(&store, command)?,
        Commands::Company { command } => run_company(&store, command)?,
        Commands::Input { command } => run_input(&store, command)?,
    }

    Ok(())
}

fn run_report(store: &JsonStore, config: &AppConfig, args: ReportArgs) -> anyhow::Result<()> {
    let snapshot = store.snapshot()?;

    let (report, layout, filters) = match args.kind {
        Some(kind) => {
            if !args.filters.normalize().is_empty() {
                warn!(report = %kind, "filters only apply to the custom report; ignoring them");
            }
            let branches = report::unique_branches(&snapshot.students);
            let batches = report::unique_batches(&snapshot.students);
            let report = report::build_predefined_report(
                kind,
                &snapshot.students,
                &snapshot.offers,
                &snapshot.companies,
                &branches,
                &batches,
            );
            (report, PrintLayout::Predefined, ReportFilters::default())
        }
        None => {
            let filters = args.filters.normalize();
            let rows = report::build_placement_report(
                &snapshot.students,
                &snapshot.offers,
                &snapshot.companies,
                &filters,
            );
            (Report::custom(rows), PrintLayout::Custom, filters)
        }
    };

    if report.rows.is_empty() {
        println!("No data found for {}.", report.title);
        return Ok(());
    }

    let rendered = match args.format {
        OutputFormat::Markdown => export::to_markdown(&report),
        OutputFormat::Csv => export::to_csv(&report)?,
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Html => export::render_print(
            &report,
            layout,
            &filters,
            &PrintOptions {
                academic_year: config.academic_year.clone(),
                generated_at: Local::now(),
            },
        )?,
    };

    match args.out {
        Some(out) => {
            let path = export_path(&out, &report.title, args.format);
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = report.rows.len(), "report exported");
            println!("Report written to {}.", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn export_path(out: &Path, title: &str, format: OutputFormat) -> PathBuf {
    if !out.is_dir() {
        return out.to_path_buf();
    }
    let file_name = export::csv_file_name(title, Local::now().date_naive());
    out.join(Path::new(&file_name).with_extension(format.extension()))
}

fn run_student(store: &JsonStore, command: StudentCommand) -> anyhow::Result<()> {
    match command {
        StudentCommand::List { search } => {
            let students = match search {
                Some(query) => store.search_students(&query)?,
                None => store.students()?,
            };
            for student in students {
                println!(
                    "- {} {} ({}, {}, {})",
                    student.id, student.name, student.roll_number, student.branch, student.batch
                );
            }
        }
        StudentCommand::Show { id } => {
            let student = store
                .get_student(&id)?
                .with_context(|| format!("no student with id '{id}'"))?;
            println!(
                "{} ({}), {} {}, {} {}",
                student.name,
                student.roll_number,
                student.branch,
                student.batch,
                student.email,
                student.phone
            );
            for offer in store.offers()?.iter().filter(|offer| offer.student_id == id) {
                println!(
                    "- {} as {}: {} LPA on {} ({})",
                    offer.company_name, offer.role, offer.package, offer.offer_date, offer.status
                );
            }
            let inputs = store.inputs_for_student(&id)?;
            if !inputs.is_empty() {
                println!("Inputs:");
                for input in inputs {
                    println!("- {} by {}: {}", input.title, input.submitted_by, input.message);
                }
            }
        }
        StudentCommand::Add {
            name,
            roll_number,
            branch,
            batch,
            email,
            phone,
        } => {
            let student = store.add_student(Student {
                id: String::new(),
                name,
                roll_number,
                branch,
                batch,
                email,
                phone,
            })?;
            println!("Added student {} ({}).", student.name, student.id);
        }
        StudentCommand::Update {
            id,
            name,
            branch,
            batch,
            email,
            phone,
        } => {
            let student = store.update_student(&id, |student| {
                if let Some(name) = name {
                    student.name = name;
                }
                if let Some(branch) = branch {
                    student.branch = branch;
                }
                if let Some(batch) = batch {
                    student.batch = batch;
                }
                if let Some(email) = email {
                    student.email = email;
                }
                if let Some(phone) = phone {
                    student.phone = phone;
                }
            })?;
            println!("Updated student {} ({}).", student.name, student.id);
        }
        StudentCommand::Delete { id } => {
            let removed = store.delete_student(&id)?;
            println!("Deleted student {id} and {removed} offers.");
        }
    }
    Ok(())
}

fn run_offer(store: &JsonStore, command: OfferCommand) -> anyhow::Result<()> {
    match command {
        OfferCommand::List { search } => {
            let offers = match search {
                Some(query) => store.search_offers(&query)?,
                None => store.offers()?,
            };
            for offer in offers {
                println!(
                    "- {} student {} at {} as {}: {} LPA ({})",
                    offer.id, offer.student_id, offer.company_name, offer.role, offer.package, offer.status
                );
            }
        }
        OfferCommand::Add {
            student_id,
            company,
            role,
            package,
            offer_date,
            status,
            industry,
        } => {
            if let Some(industry) = industry {
                let known = store.companies()?.iter().any(|c| c.name == company);
                if !known {
                    let created = store.add_company(Company {
                        name: company.clone(),
                        industry,
                        ..Company::default()
                    })?;
                    println!("Registered company {} ({}).", created.name, created.id);
                }
            }

            let offer_date = offer_date.unwrap_or_else(|| Local::now().date_naive());
            let offer = store.add_offer(Offer {
                student_id,
                company_name: company,
                role,
                package,
                offer_date: offer_date.format("%Y-%m-%d").to_string(),
                status,
                ..Offer::default()
            })?;
            println!("Added offer {} from {}.", offer.id, offer.company_name);
        }
        OfferCommand::Update {
            id,
            company,
            role,
            package,
            offer_date,
            status,
        } => {
            let offer = store.update_offer(&id, |offer| {
                if let Some(company) = company {
                    offer.company_name = company;
                }
                if let Some(role) = role {
                    offer.role = role;
                }
                if let Some(package) = package {
                    offer.package = package;
                }
                if let Some(offer_date) = offer_date {
                    offer.offer_date = offer_date.format("%Y-%m-%d").to_string();
                }
                if let Some(status) = status {
                    offer.status = status;
                }
            })?;
            println!("Updated offer {} from {}.", offer.id, offer.company_name);
        }
        OfferCommand::Status { id, status } => {
            let offer = store.update_offer(&id, |offer| offer.status = status)?;
            println!("Offer {} is now {}.", offer.id, offer.status);
        }
        OfferCommand::Delete { id } => {
            store.delete_offer(&id)?;
            println!("Deleted offer {id}.");
        }
    }
    Ok(())
}

fn run_company(store: &JsonStore, command: CompanyCommand) -> anyhow::Result<()> {
    match command {
        CompanyCommand::List => {
            for company in store.companies()? {
                println!(
                    "- {} {} ({}, {})",
                    company.id, company.name, company.industry, company.contact
                );
            }
        }
        CompanyCommand::Add {
            name,
            industry,
            contact,
        } => {
            let company = store.add_company(Company {
                id: String::new(),
                name,
                industry,
                contact,
            })?;
            println!("Added company {} ({}).", company.name, company.id);
        }
        CompanyCommand::Update {
            id,
            name,
            industry,
            contact,
        } => {
            let previous = store
                .companies()?
                .into_iter()
                .find(|company| company.id == id)
                .map(|company| company.name);
            let company = store.update_company(&id, |company| {
                if let Some(name) = name {
                    company.name = name;
                }
                if let Some(industry) = industry {
                    company.industry = industry;
                }
                if let Some(contact) = contact {
                    company.contact = contact;
                }
            })?;
            if let Some(previous) = previous.filter(|previous| *previous != company.name) {
                let stranded = store
                    .offers()?
                    .iter()
                    .filter(|offer| offer.company_name == previous)
                    .count();
                if stranded > 0 {
                    warn!(
                        company = %company.name,
                        previous = %previous,
                        offers = stranded,
                        "renamed company still has offers under its previous name"
                    );
                }
            }
            println!("Updated company {} ({}).", company.name, company.id);
        }
        CompanyCommand::Delete { id } => {
            store.delete_company(&id)?;
            println!("Deleted company {id}.");
        }
    }
    Ok(())
}

fn run_input(store: &JsonStore, command: InputCommand) -> anyhow::Result<()> {
    match command {
        InputCommand::List => {
            for input in store.snapshot()?.inputs {
                let submitted = input
                    .timestamp
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                println!(
                    "- [{:?}] {} by {} ({}) on {}: {}",
                    input.kind,
                    input.title,
                    input.submitted_by,
                    input.submitted_by_role,
                    submitted,
                    input.message
                );
            }
        }
        InputCommand::Add(args) => {
            let input = store.add_input(Input {
                kind: args.kind,
                title: args.title,
                message: args.message,
                student_id: args.student_id,
                company_id: args.company_id,
                submitted_by: args.submitted_by,
                submitted_by_role: args.role,
                ..Input::default()
            })?;
            println!("Recorded input {}.", input.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cli_parses_custom_report_filters() {
        let cli = Cli::try_parse_from([
            "placement-reports",
            "report",
            "--branch",
            "Computer Science",
            "--package-above",
            "5",
            "--format",
            "csv",
        ])
        .expect("cli parses");
        let Commands::Report(args) = cli.command else {
            panic!("expected report command");
        };
        assert!(args.kind.is_none());
        let filters = args.filters.normalize();
        assert_eq!(filters.branch.as_deref(), Some("Computer Science"));
        assert_eq!(filters.package_above, Some(5.0));
    }

    #[test]
    fn cli_parses_predefined_report_kind() {
        let cli = Cli::try_parse_from(["placement-reports", "report", "companyWise"])
            .expect("cli parses");
        let Commands::Report(args) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.kind, Some(ReportKind::CompanyWise));
        assert!(Cli::try_parse_from(["placement-reports", "report", "weekly"]).is_err());
    }

    fn parse_command(args: &[&str]) -> Commands {
        let mut argv = vec!["placement-reports"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("cli parses").command
    }

    fn seeded_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempdir().expect("temp dir");
        let store = JsonStore::open(dir.path()).expect("store opens");
        store.seed().expect("seed");
        (dir, store)
    }

    #[test]
    fn list_commands_accept_a_search_term() {
        let Commands::Student {
            command: StudentCommand::List { search },
        } = parse_command(&["student", "list", "--search", "rahul"])
        else {
            panic!("expected student list");
        };
        assert_eq!(search.as_deref(), Some("rahul"));

        let Commands::Offer {
            command: OfferCommand::List { search },
        } = parse_command(&["offer", "list"])
        else {
            panic!("expected offer list");
        };
        assert!(search.is_none());
    }

    #[test]
    fn offer_update_changes_only_given_fields() {
        let (_dir, store) = seeded_store();
        let Commands::Offer { command } = parse_command(&[
            "offer",
            "update",
            "2",
            "--package",
            "8.25",
            "--offer-date",
            "2024-01-05",
            "--status",
            "accepted",
        ]) else {
            panic!("expected offer command");
        };
        run_offer(&store, command).expect("offer updated");

        let offers = store.offers().expect("offers load");
        let offer = offers.iter().find(|offer| offer.id == "2").expect("offer kept");
        assert_eq!(offer.package, 8.25);
        assert_eq!(offer.offer_date, "2024-01-05");
        assert_eq!(offer.status, OfferStatus::Accepted);
        assert_eq!(offer.company_name, "Infosys");
        assert_eq!(offer.role, "Systems Engineer");
    }

    #[test]
    fn offer_update_rejects_invalid_changes() {
        let (_dir, store) = seeded_store();
        let Commands::Offer { command } =
            parse_command(&["offer", "update", "1", "--package=-3"])
        else {
            panic!("expected offer command");
        };
        assert!(run_offer(&store, command).is_err());
        let offers = store.offers().expect("offers load");
        assert_eq!(offers[0].package, 7.5);
    }

    #[test]
    fn company_update_can_rename() {
        let (_dir, store) = seeded_store();
        let Commands::Company { command } =
            parse_command(&["company", "update", "3", "--name", "Wipro Ltd"])
        else {
            panic!("expected company command");
        };
        run_company(&store, command).expect("company updated");

        let companies = store.companies().expect("companies load");
        let wipro = companies.iter().find(|company| company.id == "3").expect("company kept");
        assert_eq!(wipro.name, "Wipro Ltd");
        assert_eq!(wipro.industry, "IT Services");
    }

    #[test]
    fn student_show_reads_related_inputs() {
        let (_dir, store) = seeded_store();
        let Commands::Input {
            command: InputCommand::Add(args),
        } = parse_command(&[
            "input", "add", "--title", "Mock interview", "--message", "Strong DSA",
            "--student-id", "1",
        ])
        else {
            panic!("expected input add");
        };
        run_input(&store, InputCommand::Add(args)).expect("input recorded");

        let Commands::Student { command } = parse_command(&["student", "show", "1"]) else {
            panic!("expected student command");
        };
        run_student(&store, command).expect("student shown");
        assert_eq!(store.inputs_for_student("1").expect("inputs load").len(), 1);
        assert!(store.inputs_for_student("2").expect("inputs load").is_empty());
    }

    #[test]
    fn export_path_uses_dated_name_inside_directories() {
        let dir = tempdir().expect("temp dir");
        let path = export_path(dir.path(), "Student Performance Report", OutputFormat::Html);
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("file name");
        assert!(name.starts_with("student_performance_report_"));
        assert!(name.ends_with(".html"));

        let file = dir.path().join("out.csv");
        assert_eq!(export_path(&file, "ignored", OutputFormat::Csv), file);
    }
}
