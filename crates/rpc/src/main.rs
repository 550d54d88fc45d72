//! RPBank CLI - Main entry point

use clap::{Parser, Subcommand};
use rpbank_approval::Decision;
use rpbank_core::{AccountType, UserRef};
use rpbank_requests::RequestKind;
use rpbank_rpc::commands::{self, LoanArgs};
use rpbank_rpc::AppContext;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rpbank")]
#[command(about = "RPBank - roleplay bank staff console", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user
    Register {
        /// Display name
        name: String,
        /// Discord handle
        #[arg(long)]
        discord: Option<String>,
    },

    /// Request a new sub-account
    OpenAccount {
        /// User (discord:<handle> or bank:<id>)
        user: UserRef,
        account_type: AccountType,
        #[arg(long, default_value = "0")]
        initial_deposit: Decimal,
        #[arg(long)]
        proof: Option<String>,
    },

    /// Request a deposit into the Personal account
    Deposit {
        user: UserRef,
        amount: Decimal,
        #[arg(long)]
        proof: Option<String>,
    },

    /// Request a withdrawal
    Withdraw {
        user: UserRef,
        amount: Decimal,
        #[arg(long, default_value = "Personal")]
        from: AccountType,
    },

    /// Apply for a credit card
    ApplyCard {
        user: UserRef,
        /// Score at application (defaults to the current score)
        #[arg(long)]
        score: Option<i32>,
    },

    /// Apply for a loan
    ApplyLoan {
        user: UserRef,
        amount: Decimal,
        /// Term in months
        term: u32,
        /// Annual rate as a fraction, e.g. 0.05
        rate: Decimal,
        #[arg(long, default_value = "Personal Loan")]
        loan_type: String,
        #[arg(long)]
        collateral: Option<String>,
        #[arg(long)]
        down_payment: Option<Decimal>,
        #[arg(long)]
        region: Option<String>,
    },

    /// List pending requests
    Pending {
        /// Filter by kind (account-open, deposit, withdrawal, credit-card, loan)
        #[arg(long)]
        kind: Option<RequestKind>,
    },

    /// Approve or deny a request
    Decide {
        request_id: String,
        /// approve | deny
        decision: Decision,
        /// Staff member deciding
        #[arg(long, default_value = "staff")]
        actor: String,
    },

    /// Show a user's ledger
    Ledger { user: UserRef },

    /// Set a credit score
    Score { user: UserRef, value: i32 },

    /// Apply a penalty from the catalog
    Penalty {
        user: UserRef,
        /// credit-overuse | missed-payment | loan-default | suspicious-activity
        category: String,
        /// 1, 2 or 3 (t2 and tier2 also work)
        tier: String,
    },

    /// Clear expired restrictions on every ledger
    Sweep,

    /// Request counts by status
    Stats {
        #[arg(long)]
        kind: Option<RequestKind>,
    },

    /// Show recent decisions
    Journal {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli.data).await?;

    let result = run(&ctx, cli.command);
    ctx.shutdown().await?;
    result
}

fn run(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Register { name, discord } => {
            commands::register(ctx, &name, discord)?;
        }

        Commands::OpenAccount {
            user,
            account_type,
            initial_deposit,
            proof,
        } => {
            commands::open_account(ctx, &user, account_type, initial_deposit, proof)?;
        }

        Commands::Deposit { user, amount, proof } => {
            commands::deposit(ctx, &user, amount, proof)?;
        }

        Commands::Withdraw { user, amount, from } => {
            commands::withdraw(ctx, &user, amount, from)?;
        }

        Commands::ApplyCard { user, score } => {
            commands::apply_card(ctx, &user, score)?;
        }

        Commands::ApplyLoan {
            user,
            amount,
            term,
            rate,
            loan_type,
            collateral,
            down_payment,
            region,
        } => {
            let args = LoanArgs {
                loan_type,
                amount,
                term_months: term,
                annual_rate: rate,
                collateral_link: collateral,
                down_payment,
                region,
            };
            commands::apply_loan(ctx, &user, args)?;
        }

        Commands::Pending { kind } => {
            commands::pending(ctx, kind)?;
        }

        Commands::Decide {
            request_id,
            decision,
            actor,
        } => {
            commands::decide(ctx, &request_id, decision, &actor)?;
        }

        Commands::Ledger { user } => {
            commands::ledger(ctx, &user)?;
        }

        Commands::Score { user, value } => {
            commands::score(ctx, &user, value)?;
        }

        Commands::Penalty {
            user,
            category,
            tier,
        } => {
            commands::penalty(ctx, &user, &category, &tier)?;
        }

        Commands::Sweep => {
            commands::sweep(ctx)?;
        }

        Commands::Stats { kind } => {
            commands::stats(ctx, kind)?;
        }

        Commands::Journal { limit } => {
            commands::journal(ctx, limit)?;
        }
    }

    Ok(())
}
