use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use sitebooks_categorize::{Categorizer, OpenAiClient, categorize_pending, classify_by_rules};
use sitebooks_core::{BudgetStatus, Category, Ledger, Project, TransactionInput};
use sitebooks_ingest::parse_bank_csv;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

mod config;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "sitebooks", version, about = "Construction bookkeeping: import, categorize, report")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Categorize a single transaction and print the prediction as JSON
    Classify {
        #[arg(long)]
        name: String,

        /// Signed amount: negative = money out
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,

        #[arg(long)]
        merchant: Option<String>,

        /// ISO-8601 date (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Skip the model and use the keyword rules only
        #[arg(long)]
        rules_only: bool,
    },

    /// Import a bank CSV export into the ledger (existing ids are skipped)
    Import {
        #[arg(long)]
        csv: PathBuf,

        /// Account label (default: Checking)
        #[arg(long, default_value = "Checking")]
        account: String,
    },

    /// List the next batch of uncategorized transactions
    Pending,

    /// Categorize the next batch of uncategorized transactions
    Categorize,

    /// Set a transaction's category by hand
    SetCategory {
        #[arg(long)]
        id: String,

        #[arg(long)]
        category: Category,

        #[arg(long)]
        subcategory: Option<String>,
    },

    /// Expense totals by category
    Report,

    /// Project budgets
    Projects {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Charge a transaction to a project (omit --project to clear it)
    SetProject {
        #[arg(long)]
        id: String,

        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config.toml if none exists
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    /// Register a project with its budget
    Add {
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: String,

        /// Planned spend in dollars
        #[arg(long)]
        budget: f64,

        #[arg(long)]
        client: Option<String>,
    },
    /// Spent, remaining and utilization per project
    Report,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SITEBOOKS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Classify {
            name,
            amount,
            merchant,
            date,
            rules_only,
        } => {
            let cfg = config::load_config()?;
            let date = date.unwrap_or_else(|| Local::now().date_naive().to_string());
            let mut input = TransactionInput::new(name, amount, date);
            input.merchant_name = merchant;

            let prediction = if rules_only {
                classify_by_rules(&input)
            } else {
                build_categorizer(&cfg)?.classify(&input).await
            };
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }

        Command::Import { csv, account } => {
            if !csv.exists() {
                bail!("CSV not found: {} (pass --csv <path>)", csv.display());
            }
            let cfg = config::load_config()?;
            let (path, mut ledger) = open_ledger(&cfg)?;
            let records = parse_bank_csv(&csv, &account)?;
            let parsed = records.len();
            let added = ledger.insert_new(records);
            ledger.save(&path)?;

            info!(parsed, added, ledger = %path.display(), "import complete");
            println!("Parsed {} transactions from {}", parsed, csv.display());
            println!("Added {} new ({} already present)", added, parsed - added);
            println!("Uncategorized: {}", ledger.uncategorized_count());
        }

        Command::Pending => {
            let cfg = config::load_config()?;
            let (_, ledger) = open_ledger(&cfg)?;
            let pending = ledger.uncategorized(cfg.ledger.batch_size);
            if pending.is_empty() {
                println!("No uncategorized transactions.");
            }
            for t in &pending {
                println!("{} | {} | {:>12.2} | {}", t.id, t.date, t.amount, t.name);
            }
            println!("\n{} uncategorized in total", ledger.uncategorized_count());
        }

        Command::Categorize => {
            let cfg = config::load_config()?;
            let (path, mut ledger) = open_ledger(&cfg)?;
            if ledger.uncategorized_count() == 0 {
                println!("No uncategorized transactions found.");
                return Ok(());
            }

            let categorizer = build_categorizer(&cfg)?;
            let report = categorize_pending(&mut ledger, &categorizer, cfg.ledger.batch_size).await;
            ledger.save(&path)?;

            for (id, p) in &report.predictions {
                let hint = p
                    .suggested_project
                    .as_deref()
                    .map(|s| format!(" [looks like: {s}]"))
                    .unwrap_or_default();
                println!(
                    "{} -> {} / {} ({:.0}% confidence){}",
                    id,
                    p.category,
                    p.subcategory,
                    p.confidence * 100.0,
                    hint
                );
            }
            println!(
                "\nSuccessfully categorized {} transactions. {} failed.",
                report.succeeded, report.failed
            );
        }

        Command::SetCategory {
            id,
            category,
            subcategory,
        } => {
            let cfg = config::load_config()?;
            let (path, mut ledger) = open_ledger(&cfg)?;
            ledger.set_category(&id, category, subcategory)?;
            ledger.save(&path)?;
            println!("{id} -> {category}");
        }

        Command::Report => {
            let cfg = config::load_config()?;
            let (_, ledger) = open_ledger(&cfg)?;
            print_spend_report(&ledger);
        }

        Command::Projects { command } => {
            let cfg = config::load_config()?;
            let (path, mut ledger) = open_ledger(&cfg)?;
            match command {
                ProjectCommand::Add {
                    id,
                    name,
                    budget,
                    client,
                } => {
                    let mut project = Project::new(id.clone(), name, budget);
                    project.client = client;
                    ledger.add_project(project)?;
                    ledger.save(&path)?;
                    println!("Added project {id} (budget ${budget:.2})");
                }
                ProjectCommand::Report => print_project_report(&ledger),
            }
        }

        Command::SetProject { id, project } => {
            let cfg = config::load_config()?;
            let (path, mut ledger) = open_ledger(&cfg)?;
            ledger.assign_project(&id, project.as_deref())?;
            ledger.save(&path)?;
            match project {
                Some(pid) => println!("{id} -> project {pid}"),
                None => println!("{id} -> no project"),
            }
        }
    }

    Ok(())
}

fn open_ledger(cfg: &Config) -> Result<(PathBuf, Ledger)> {
    let home = state::ensure_sitebooks_home()?;
    open_ledger_in(cfg, &home)
}

fn open_ledger_in(cfg: &Config, home: &Path) -> Result<(PathBuf, Ledger)> {
    let path = cfg.ledger.resolve(home);
    let ledger = Ledger::load(&path)?;
    Ok((path, ledger))
}

fn build_categorizer(cfg: &Config) -> Result<Categorizer<OpenAiClient>> {
    let api_key = std::env::var("OPENAI_API_KEY").ok();
    if api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
        warn!("OPENAI_API_KEY is not set; keyword rules will be used");
    }
    let client = OpenAiClient::new(&cfg.llm.base_url, api_key, cfg.llm.timeout())
        .context("build HTTP client")?;
    Ok(Categorizer::new(client, cfg.llm.completion_settings()))
}

fn print_spend_report(ledger: &Ledger) {
    let spend = ledger.spend_by_category();
    let total: f64 = spend.iter().map(|s| s.total).sum();
    if spend.is_empty() || total <= 0.0 {
        println!("No expenses recorded.");
        return;
    }

    println!("{:<16} {:>12} {:>7} {:>6}", "Category", "Total", "Share", "Txns");
    for s in &spend {
        let label = s.category.map(|c| c.as_str()).unwrap_or("Uncategorized");
        println!(
            "{:<16} {:>12.2} {:>6.1}% {:>6}",
            label,
            s.total,
            s.total / total * 100.0,
            s.count
        );
    }
    println!("{:<16} {:>12.2}", "Total", total);
}

fn print_project_report(ledger: &Ledger) {
    let report = ledger.project_report();
    if report.is_empty() {
        println!("No projects. Add one with `sitebooks projects add`.");
        return;
    }

    println!(
        "{:<12} {:<24} {:>12} {:>12} {:>12} {:>7}  {}",
        "Id", "Project", "Budget", "Spent", "Remaining", "Used", "Status"
    );
    for p in &report {
        let status = match p.status {
            BudgetStatus::OverBudget => format!("over budget by ${:.2}", p.over_by()),
            BudgetStatus::NearBudget => "approaching budget limit".to_string(),
            BudgetStatus::OnTrack => p.status.to_string(),
        };
        println!(
            "{:<12} {:<24} {:>12.2} {:>12.2} {:>12.2} {:>6.1}%  {}",
            p.project_id, p.name, p.budget, p.spent, p.remaining, p.utilization, status
        );
    }

    let budget: f64 = report.iter().map(|p| p.budget).sum();
    let spent: f64 = report.iter().map(|p| p.spent).sum();
    println!("{:<37} {:>12.2} {:>12.2} {:>12.2}", "Total", budget, spent, budget - spent);
}
