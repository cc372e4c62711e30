//! # TaskHub CLI
//!
//! Operator tool for the TaskHub service: inspects balances, tasks and
//! payments, and quotes ledger operations locally.
//!
//! ## Usage
//!
//! ```bash
//! taskhub packages
//! taskhub quote-cost --pay 5 --workers 4
//! taskhub quote-withdraw --coins 300
//! TASKHUB_API_URL=http://localhost:5000 taskhub balance --email w@example.com
//! ```

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use taskhub_client::api::{HttpTaskHubApi, SubmissionFilter, TaskHubApi};
use taskhub_client::config::ClientConfig;
use taskhub_client::dashboard::{self, BuyerSummary, TaskFilter, TaskQuery, TaskSort, WorkerStats};
use taskhub_client::logging;
use taskhub_shared::ledger;
use taskhub_shared::models::CoinPackage;
use taskhub_shared::Coins;

#[derive(Parser)]
#[command(name = "taskhub", version, about = "TaskHub marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List purchasable coin packages
    Packages,

    /// Escrow needed to fund a task
    QuoteCost {
        #[arg(long)]
        pay: Coins,
        #[arg(long)]
        workers: u32,
        /// Check against this balance
        #[arg(long)]
        balance: Option<Coins>,
    },

    /// Dollar payout for a withdrawal
    QuoteWithdraw {
        #[arg(long)]
        coins: Coins,
        /// Check against this balance
        #[arg(long)]
        balance: Option<Coins>,
    },

    /// Show a user's balance
    Balance {
        #[arg(long)]
        email: String,
    },

    /// List tasks
    Tasks {
        /// Only tasks created by this buyer
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        /// newest, oldest, payable-asc, payable-desc or deadline
        #[arg(long, default_value = "newest")]
        sort: TaskSort,
    },

    /// Worker submission statistics
    Stats {
        #[arg(long)]
        email: String,
    },

    /// Payment history for a user
    History {
        #[arg(long)]
        email: String,
    },

    /// Highest-balance workers
    TopWorkers,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Active,
    Completed,
}

impl From<FilterArg> for TaskFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => TaskFilter::All,
            FilterArg::Active => TaskFilter::Active,
            FilterArg::Completed => TaskFilter::Completed,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Packages => {
            for package in CoinPackage::catalogue() {
                println!("{:<14} {:>6} coins  {}", package.label, package.coins, package.price);
            }
        }
        Command::QuoteCost {
            pay,
            workers,
            balance,
        } => {
            let total = ledger::compute_task_cost(pay, workers);
            println!("Total cost: {} coins", total);
            if let Some(balance) = balance {
                match ledger::apply_task_creation(balance, total) {
                    Ok(remaining) => println!("Balance after funding: {}", remaining),
                    Err(e) => println!("Cannot fund: {}", e),
                }
            }
        }
        Command::QuoteWithdraw { coins, balance } => {
            let ledger_config = taskhub_client::config::LedgerConfig::default();
            let amount = ledger::compute_withdrawal_amount(coins, ledger_config.coins_per_dollar);
            println!("{} coins pay out {}", coins, amount);
            if let Some(balance) = balance {
                if let Err(e) =
                    ledger::validate_withdrawal(balance, coins, ledger_config.min_withdrawal)
                {
                    println!("Not allowed: {}", e);
                }
            }
        }
        command => run_remote(command).await?,
    }

    Ok(())
}

async fn run_remote(command: Command) -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("failed to load configuration")?;
    logging::init(config.logging.format);

    tracing::info!(
        base_url = %config.api.base_url,
        "TaskHub CLI v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let api = HttpTaskHubApi::new(config.api.clone())?;

    match command {
        Command::Balance { email } => {
            let user = api.fetch_user(&email).await?;
            println!("{} ({}): {} coins", user.email, user.role, user.balance);
        }
        Command::Tasks {
            email,
            search,
            filter,
            sort,
        } => {
            let now = Utc::now();
            let records = api.list_tasks(email.as_deref()).await?;
            let mut query = TaskQuery::default().filter(filter.into()).sort(sort);
            if let Some(term) = search {
                query = query.search(term);
            }
            let visible = query.apply(records, now);

            for record in &visible {
                println!(
                    "{}  {:<30} {:>8} x{:<3} due {}",
                    record.id,
                    record.task.title(),
                    record.task.payable_amount(),
                    record.task.draft.required_workers,
                    record.task.draft.completion_date.format("%Y-%m-%d")
                );
            }

            if email.is_some() {
                let summary = BuyerSummary::from_tasks(&visible, now);
                println!(
                    "{} tasks, {} active, {} coins escrowed",
                    summary.total_tasks, summary.active_tasks, summary.total_spend
                );
            }
        }
        Command::Stats { email } => {
            let records = api
                .list_submissions(&SubmissionFilter::by_worker(email))
                .await?;
            let stats = WorkerStats::from_submissions(&records);
            println!(
                "{} submissions, {} pending, {} approved, {} coins earned",
                stats.total_submissions,
                stats.pending_submissions,
                stats.approved_submissions,
                stats.total_earnings
            );
        }
        Command::History { email } => {
            for payment in api.payment_history(&email).await? {
                println!(
                    "{}  {:>8} {}  {}",
                    payment.created_at.format("%Y-%m-%d %H:%M"),
                    payment.price,
                    payment.currency,
                    payment.id.as_deref().unwrap_or("-")
                );
            }
        }
        Command::TopWorkers => {
            let workers = dashboard::top_workers(api.list_users().await?, dashboard::TOP_WORKERS);
            for (rank, worker) in workers.iter().enumerate() {
                println!("{}. {:<24} {} coins", rank + 1, worker.name, worker.balance);
            }
        }
        Command::Packages | Command::QuoteCost { .. } | Command::QuoteWithdraw { .. } => {}
    }

    Ok(())
}
