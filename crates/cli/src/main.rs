use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use engine::{BankDirection, Money};

use crate::error::{AppError, Result};

mod app;
mod config;
mod error;
mod http_store;
mod render;

#[derive(Parser, Debug)]
#[command(name = "boardlink_cli")]
#[command(about = "Shared bank for board game tables: one seat per device")]
struct Cli {
    #[command(flatten)]
    global: config::GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a new game and take the first seat.
    Create(CreateArgs),
    /// Take a seat in an existing game.
    Join(JoinArgs),
    /// Balances of everyone at the table.
    Status,
    /// Transaction log, newest first.
    Log(LogArgs),
    /// Pay another player.
    Pay(PayArgs),
    /// Pay the bank or collect from it.
    Bank(BankArgs),
    /// Ask another player for money.
    Request(RequestArgs),
    /// Requests waiting for you and the ones you sent.
    Requests,
    /// Pay a request addressed to you (the oldest one by default).
    Accept(RequestIdArgs),
    /// Refuse a request addressed to you (the oldest one by default).
    Decline(RequestIdArgs),
    /// Give up your seat; the game goes on for the others.
    Leave,
    /// End the game for everyone.
    End(EndArgs),
    /// Follow the table live until the game ends.
    Watch,
    /// Print the invite link for this game.
    Invite,
    /// Write the transaction log as CSV.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    /// Starting balance, e.g. 1500, 1.5K or 15M.
    #[arg(long)]
    budget: Money,
}

#[derive(Args, Debug)]
struct JoinArgs {
    game_id: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct LogArgs {
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Args, Debug)]
struct PayArgs {
    /// Player name (or id).
    to: String,
    amount: Money,
    #[arg(long, default_value = "")]
    remarks: String,
}

#[derive(Args, Debug)]
struct BankArgs {
    /// `pay` or `receive`.
    direction: BankDirection,
    amount: Money,
    #[arg(long, default_value = "")]
    remarks: String,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Player name (or id) who should pay.
    from: String,
    amount: Money,
    #[arg(long, default_value = "")]
    remarks: String,
}

#[derive(Args, Debug)]
struct RequestIdArgs {
    id: Option<String>,
}

#[derive(Args, Debug)]
struct EndArgs {
    /// End the game even if you are not the host.
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    out: PathBuf,
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load(&cli.global)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "boardlink_cli={level},engine={level}",
            level = config.log_level
        ))
        .init();

    let app = app::App::new(config)?;
    match cli.command {
        Command::Create(args) => app.create(&args.name, args.budget).await,
        Command::Join(args) => app.join(&args.game_id, &args.name).await,
        Command::Status => app.status().await,
        Command::Log(args) => app.log(args.limit).await,
        Command::Pay(args) => app.pay(&args.to, args.amount, &args.remarks).await,
        Command::Bank(args) => app.bank(args.direction, args.amount, &args.remarks).await,
        Command::Request(args) => app.request(&args.from, args.amount, &args.remarks).await,
        Command::Requests => app.requests().await,
        Command::Accept(args) => app.accept(args.id.as_deref()).await,
        Command::Decline(args) => app.decline(args.id.as_deref()).await,
        Command::Leave => app.leave().await,
        Command::End(args) => app.end(args.force).await,
        Command::Watch => app.watch().await,
        Command::Invite => app.invite().await,
        Command::Export(args) => app.export(&args.out).await,
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => Ok(()),
        Err(AppError::Setup(reason)) => {
            eprintln!("{}", config::setup_guide(&reason));
            std::process::exit(2);
        }
        Err(AppError::Engine(err)) if err.kind() == engine::ErrorKind::Transport => {
            eprintln!("store unreachable or misbehaving: {err}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
