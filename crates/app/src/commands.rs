//! Command line surface and the handlers behind each subcommand.

use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use client::{
    SyncController,
    types::{Decimal, Transaction, TransactionId, TransactionType},
};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
};

#[derive(Debug, Parser)]
#[command(name = "spendsmart", about = "Track expenses against a SpendSmart backend")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:5000/api/).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override email (password is never read from CLI).
    #[arg(long, global = true)]
    pub email: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account with the configured email and password.
    Register {
        #[arg(long)]
        name: String,
        /// Date of birth, YYYY-MM-DD.
        #[arg(long)]
        dob: String,
    },
    /// Show totals, budget and transactions.
    Summary,
    /// Record an expense.
    Add {
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        category: i32,
        #[arg(long, default_value = "")]
        description: String,
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Replace an existing transaction.
    Edit {
        #[arg(long)]
        id: TransactionId,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        category: i32,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        date: NaiveDate,
        /// Record as income instead of expense.
        #[arg(long)]
        income: bool,
    },
    Delete {
        #[arg(long)]
        id: TransactionId,
    },
    /// Set the budget for a period.
    Budget {
        #[arg(long)]
        amount: Decimal,
        /// Defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Defaults to the last day of the start month.
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Run the in-memory backend locally.
    Serve {
        #[arg(long, default_value_t = 5000)]
        port: u16,
        /// Path the routes are mounted under; matches the default base URL.
        #[arg(long, default_value = "/api")]
        prefix: String,
    },
}

pub async fn run(command: Command, config: &AppConfig) -> Result<()> {
    if let Command::Serve { port, prefix } = command {
        return serve(port, &prefix).await;
    }

    let sync = SyncController::builder()
        .base_url(&config.base_url)
        .timeout(config.timeout())
        .add_mode(config.add_mode)
        .build()?;
    let (email, password) = config.credentials()?;

    if let Command::Register { name, dob } = command {
        sync.register(&name, email, password, &dob).await?;
        println!("Registered {email}. You can now log in.");
        return Ok(());
    }

    let user_id = sync.login(email, password).await?;
    tracing::debug!("logged in as {user_id}");

    match command {
        Command::Summary => {}
        Command::Add {
            amount,
            category,
            description,
            date,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let created = sync
                .add_transaction(amount, category, &description, &date.to_string())
                .await?;
            println!("Added transaction #{}", created.id);
        }
        Command::Edit {
            id,
            amount,
            category,
            description,
            date,
            income,
        } => {
            let kind = if income {
                TransactionType::Income
            } else {
                TransactionType::Expense
            };
            let updated = sync
                .edit_transaction(Transaction {
                    id,
                    user_id,
                    category_id: category,
                    amount,
                    date: date.to_string(),
                    description,
                    kind,
                })
                .await?;
            println!("Updated transaction #{}", updated.id);
        }
        Command::Delete { id } => {
            sync.delete_transaction(id).await?;
            println!("Deleted transaction #{id}");
        }
        Command::Budget { amount, start, end } => {
            let start = start.unwrap_or_else(|| Local::now().date_naive());
            let end = match end {
                Some(end) => end,
                None => end_of_month(start)
                    .ok_or_else(|| AppError::Input(format!("no month end for {start}")))?,
            };
            if end < start {
                return Err(AppError::Input("budget ends before it starts".to_string()));
            }
            sync.set_budget(amount, &start.to_string(), &end.to_string())
                .await?;
            println!("Budget set to {amount} from {start} to {end}");
        }
        Command::Register { .. } | Command::Serve { .. } => {}
    }

    print_summary(&sync).await;
    Ok(())
}

async fn serve(port: u16, prefix: &str) -> Result<()> {
    if !prefix.is_empty() && !prefix.starts_with('/') {
        return Err(AppError::Input(format!("prefix must start with '/': {prefix}")));
    }
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    stub_server::run_with_listener(stub_server::StubState::new(), listener, prefix).await?;
    Ok(())
}

async fn print_summary(sync: &SyncController) {
    let snapshot = sync.snapshot().await;
    let summary = snapshot.summary;

    println!();
    println!("Total income:   {}", money(summary.total_income));
    println!("Total spending: {}", money(summary.total_spending));
    match &snapshot.budget {
        Some(budget) => println!(
            "Budget:         {} ({} to {})",
            money(budget.amount),
            budget.start_date,
            budget.end_date
        ),
        None => println!("Budget:         not set"),
    }
    if summary.budget_exceeded {
        println!("Budget exceeded by {}", money(-summary.remaining_budget()));
    }

    println!();
    if snapshot.transactions.is_empty() {
        println!("No transactions.");
        return;
    }
    for tx in &snapshot.transactions {
        println!(
            "#{:<5} {} {:<7} {:>10} cat {:<3} {}",
            tx.id,
            tx.date,
            tx.kind.as_str(),
            money(tx.amount),
            tx.category_id,
            tx.description
        );
    }
}

fn money(amount: Decimal) -> String {
    format!("${}", amount.round_dp(2))
}

fn end_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn end_of_month_handles_lengths_and_year_end() {
        assert_eq!(end_of_month(date(2024, 2, 10)), Some(date(2024, 2, 29)));
        assert_eq!(end_of_month(date(2023, 2, 1)), Some(date(2023, 2, 28)));
        assert_eq!(end_of_month(date(2024, 12, 31)), Some(date(2024, 12, 31)));
        assert_eq!(end_of_month(date(2024, 4, 30)), Some(date(2024, 4, 30)));
    }

    #[test]
    fn money_rounds_to_cents() {
        assert_eq!(money(Decimal::new(12346, 3)), "$12.35");
        assert_eq!(money(Decimal::from(50)), "$50");
    }

    #[test]
    fn cli_parses_add_with_default_date() {
        let cli = Cli::try_parse_from([
            "spendsmart",
            "--email",
            "jane@x.com",
            "add",
            "--amount",
            "50.0",
            "--category",
            "2",
            "--description",
            "lunch",
        ])
        .unwrap();

        assert_eq!(cli.email.as_deref(), Some("jane@x.com"));
        match cli.command {
            Command::Add {
                amount,
                category,
                description,
                date,
            } => {
                assert_eq!(amount, Decimal::from(50));
                assert_eq!(category, 2);
                assert_eq!(description, "lunch");
                assert!(date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serve_defaults_match_the_default_base_url() {
        let cli = Cli::try_parse_from(["spendsmart", "serve"]).unwrap();
        match cli.command {
            Command::Serve { port, prefix } => {
                let expected = format!("http://127.0.0.1:{port}{prefix}/");
                assert_eq!(expected, AppConfig::default().base_url);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn serve_rejects_relative_prefix() {
        let err = serve(0, "api").await.unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }
}
