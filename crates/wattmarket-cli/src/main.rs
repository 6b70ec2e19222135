//! WattMarket CLI — `watt` command.
//!
//! A thin host over the market runtime: every invocation loads the
//! snapshot, executes one call, and saves the snapshot back on success.
//! Failures print the named market condition and exit non-zero.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use wattmarket::host::snapshot;
use wattmarket::time::micros_to_rfc3339;
use wattmarket::{
    AccountId, Call, CancelPolicy, GridId, LedgerCall, RegistryCall, Reply, Runtime, TradeId,
    TradingCall,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_state_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".wattmarket").join("state.json")
}

// ── Command definitions ───────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "watt",
    version,
    about = "WattMarket — peer-to-peer local-energy marketplace"
)]
struct Cli {
    /// Path to the market state file.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a fresh market with an `admin` account.
    Init {
        /// Validate trade-creation grid ids against the registry.
        #[arg(long)]
        strict_grids: bool,
        /// Credit escrowed energy back to the seller on cancellation.
        #[arg(long)]
        refund_on_cancel: bool,
    },
    /// Manage named accounts.
    #[command(subcommand)]
    Account(AccountCmd),
    /// Move energy on the ledger.
    #[command(subcommand)]
    Energy(EnergyCmd),
    /// Manage grids and membership.
    #[command(subcommand)]
    Grid(GridCmd),
    /// List, cancel, and buy trades.
    #[command(subcommand)]
    Trade(TradeCmd),
    /// Manage the source-type catalog.
    #[command(subcommand)]
    Source(SourceCmd),
    /// Print the ordered event log.
    Events,
}

#[derive(Subcommand)]
enum AccountCmd {
    /// Generate a new named account.
    New { alias: String },
    /// List all accounts.
    List,
    /// Mint native currency to an account.
    Fund { account: String, amount: u128 },
}

#[derive(Subcommand)]
enum EnergyCmd {
    /// Credit kWh to a user's balance.
    Credit {
        user: String,
        kwh: u64,
        #[arg(long = "as")]
        caller: String,
    },
    /// Debit kWh from a user's balance.
    Debit {
        user: String,
        kwh: u64,
        #[arg(long = "as")]
        caller: String,
    },
    /// Show a user's balance.
    Balance { user: String },
}

#[derive(Subcommand)]
enum GridCmd {
    /// Register a new grid.
    Create {
        name: String,
        country_code: String,
        country_name: String,
        #[arg(long = "as")]
        caller: String,
    },
    /// List all grids in insertion order.
    List,
    /// Join a grid.
    Join {
        grid_id: String,
        #[arg(long = "as")]
        caller: String,
    },
    /// Authorize a device to create grids.
    Authorize {
        device: String,
        #[arg(long = "as")]
        caller: String,
    },
    /// Show the grid a user belongs to.
    Member { user: String },
}

#[derive(Subcommand)]
enum TradeCmd {
    /// List energy for sale.
    Create {
        grid_id: String,
        kwh: u64,
        price_per_kwh: u128,
        /// Source-type ids (defaults to the seeded pair).
        #[arg(long = "source")]
        source_type_ids: Vec<u32>,
        #[arg(long = "as")]
        caller: String,
    },
    /// List a grid's active trades.
    List { grid_id: String },
    /// Cancel an active trade (seller only).
    Cancel {
        grid_id: String,
        trade_id: String,
        #[arg(long = "as")]
        caller: String,
    },
    /// Buy an active trade with an exact payment.
    Buy {
        grid_id: String,
        trade_id: String,
        #[arg(long)]
        pay: u128,
        #[arg(long = "as")]
        caller: String,
    },
}

#[derive(Subcommand)]
enum SourceCmd {
    /// Register a source type (admin only).
    Add {
        id: u32,
        name: String,
        description: String,
        #[arg(long = "as")]
        caller: String,
    },
    /// Show a source type.
    Show { id: u32 },
}

// ── State helpers ─────────────────────────────────────────────────────────────

fn load_runtime(path: &PathBuf) -> Result<Runtime> {
    snapshot::load(path)
        .with_context(|| format!("no market state at {} — run `watt init`", path.display()))
}

fn resolve(runtime: &Runtime, alias_or_id: &str) -> Result<AccountId> {
    runtime
        .keyring()
        .resolve(alias_or_id)
        .map(|a| a.id.clone())
        .ok_or_else(|| anyhow!("unknown account: {alias_or_id}"))
}

fn execute_and_save(
    runtime: &mut Runtime,
    path: &PathBuf,
    caller: &AccountId,
    value: u128,
    call: Call,
) -> Result<Reply> {
    log::debug!("watt: executing as {caller} against {}", path.display());
    let reply = runtime.execute(caller, value, call)?;
    snapshot::save(path, runtime)?;
    Ok(reply)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = cli.state.unwrap_or_else(default_state_path);

    match cli.command {
        Command::Init {
            strict_grids,
            refund_on_cancel,
        } => {
            if path.exists() {
                return Err(anyhow!("market state already exists at {}", path.display()));
            }
            let policy = if refund_on_cancel {
                CancelPolicy::Refund
            } else {
                CancelPolicy::Forfeit
            };
            let (admin, admin_key) = wattmarket::account::generate();
            let mut runtime = Runtime::builder(admin.clone())
                .strict_grids(strict_grids)
                .cancel_policy(policy)
                .build()?;
            runtime.adopt_account(
                "admin",
                admin.clone(),
                wattmarket::account::verifying_key_base64(&admin_key),
            )?;
            snapshot::save(&path, &runtime)?;
            println!("initialized market at {}", path.display());
            println!("admin: {admin}");
        }
        Command::Account(cmd) => run_account(cmd, &path)?,
        Command::Energy(cmd) => run_energy(cmd, &path)?,
        Command::Grid(cmd) => run_grid(cmd, &path)?,
        Command::Trade(cmd) => run_trade(cmd, &path)?,
        Command::Source(cmd) => run_source(cmd, &path)?,
        Command::Events => {
            let runtime = load_runtime(&path)?;
            for record in runtime.events() {
                println!(
                    "{:>4}  {}  {:<20} {}",
                    record.seq,
                    micros_to_rfc3339(record.at),
                    record.event.as_tag(),
                    serde_json::to_string(&record.event)?
                );
            }
        }
    }
    Ok(())
}

fn run_account(cmd: AccountCmd, path: &PathBuf) -> Result<()> {
    let mut runtime = load_runtime(path)?;
    match cmd {
        AccountCmd::New { alias } => {
            let id = runtime.create_account(&alias)?;
            snapshot::save(path, &runtime)?;
            println!("{alias}: {id}");
        }
        AccountCmd::List => {
            for account in runtime.keyring().accounts() {
                println!(
                    "{:<12} {}  coins={}  kwh={}",
                    account.alias,
                    account.id,
                    runtime.coins_of(&account.id),
                    runtime.ledger().balance_of(&account.id)
                );
            }
        }
        AccountCmd::Fund { account, amount } => {
            let id = resolve(&runtime, &account)?;
            runtime.fund(&id, amount);
            snapshot::save(path, &runtime)?;
            println!("funded {id} with {amount}");
        }
    }
    Ok(())
}

fn run_energy(cmd: EnergyCmd, path: &PathBuf) -> Result<()> {
    let mut runtime = load_runtime(path)?;
    match cmd {
        EnergyCmd::Credit { user, kwh, caller } => {
            let caller = resolve(&runtime, &caller)?;
            let user = resolve(&runtime, &user)?;
            execute_and_save(
                &mut runtime,
                path,
                &caller,
                0,
                Call::Ledger(LedgerCall::Credit {
                    user: user.clone(),
                    amount: kwh,
                }),
            )?;
            println!("credited {kwh} kWh to {user}");
        }
        EnergyCmd::Debit { user, kwh, caller } => {
            let caller = resolve(&runtime, &caller)?;
            let user = resolve(&runtime, &user)?;
            execute_and_save(
                &mut runtime,
                path,
                &caller,
                0,
                Call::Ledger(LedgerCall::Debit {
                    user: user.clone(),
                    amount: kwh,
                }),
            )?;
            println!("debited {kwh} kWh from {user}");
        }
        EnergyCmd::Balance { user } => {
            let user = resolve(&runtime, &user)?;
            println!("{}", runtime.ledger().balance_of(&user));
        }
    }
    Ok(())
}

fn run_grid(cmd: GridCmd, path: &PathBuf) -> Result<()> {
    let mut runtime = load_runtime(path)?;
    match cmd {
        GridCmd::Create {
            name,
            country_code,
            country_name,
            caller,
        } => {
            let caller = resolve(&runtime, &caller)?;
            execute_and_save(
                &mut runtime,
                path,
                &caller,
                0,
                Call::Registry(RegistryCall::CreateGrid {
                    name: name.clone(),
                    country_code: country_code.clone(),
                    country_name,
                }),
            )?;
            println!("created grid {}", GridId::derive(&name, &country_code));
        }
        GridCmd::List => {
            for grid in runtime.registry().grids() {
                println!(
                    "{}  {} ({}, {})  members={}",
                    grid.id, grid.name, grid.country_code, grid.country_name, grid.member_count
                );
            }
        }
        GridCmd::Join { grid_id, caller } => {
            let caller = resolve(&runtime, &caller)?;
            execute_and_save(
                &mut runtime,
                path,
                &caller,
                0,
                Call::Registry(RegistryCall::JoinGrid {
                    grid_id: GridId(grid_id.clone()),
                }),
            )?;
            println!("{caller} joined {grid_id}");
        }
        GridCmd::Authorize { device, caller } => {
            let caller = resolve(&runtime, &caller)?;
            let device = resolve(&runtime, &device)?;
            execute_and_save(
                &mut runtime,
                path,
                &caller,
                0,
                Call::Registry(RegistryCall::AddAuthorizedDevice {
                    device: device.clone(),
                }),
            )?;
            println!("authorized device {device}");
        }
        GridCmd::Member { user } => {
            let user = resolve(&runtime, &user)?;
            let grid = runtime.registry().user_grid(&user)?;
            println!("{}  {} ({})", grid.id, grid.name, grid.country_code);
        }
    }
    Ok(())
}

fn run_trade(cmd: TradeCmd, path: &PathBuf) -> Result<()> {
    let mut runtime = load_runtime(path)?;
    match cmd {
        TradeCmd::Create {
            grid_id,
            kwh,
            price_per_kwh,
            source_type_ids,
            caller,
        } => {
            let caller = resolve(&runtime, &caller)?;
            let reply = execute_and_save(
                &mut runtime,
                path,
                &caller,
                0,
                Call::Trading(TradingCall::CreateTrade {
                    grid_id: GridId(grid_id),
                    kwh,
                    price_per_kwh,
                    source_type_ids,
                }),
            )?;
            if let Reply::TradeId(trade_id) = reply {
                println!("created trade {trade_id}");
            }
        }
        TradeCmd::List { grid_id } => {
            for trade in runtime.trading().active_trades(&GridId(grid_id)) {
                println!(
                    "{}  seller={}  {} kWh @ {}  sources={:?}",
                    trade.trade_id, trade.seller, trade.kwh, trade.price_per_kwh, trade.source_type_ids
                );
            }
        }
        TradeCmd::Cancel {
            grid_id,
            trade_id,
            caller,
        } => {
            let caller = resolve(&runtime, &caller)?;
            execute_and_save(
                &mut runtime,
                path,
                &caller,
                0,
                Call::Trading(TradingCall::CancelTrade {
                    grid_id: GridId(grid_id),
                    trade_id: TradeId(trade_id.clone()),
                }),
            )?;
            println!("cancelled trade {trade_id}");
        }
        TradeCmd::Buy {
            grid_id,
            trade_id,
            pay,
            caller,
        } => {
            let caller = resolve(&runtime, &caller)?;
            let reply = execute_and_save(
                &mut runtime,
                path,
                &caller,
                pay,
                Call::Trading(TradingCall::BuyTrade {
                    grid_id: GridId(grid_id),
                    trade_id: TradeId(trade_id),
                }),
            )?;
            if let Reply::Settlement(settlement) = reply {
                println!(
                    "settled {}: {} kWh to {}, {} paid to {}",
                    settlement.trade_id,
                    settlement.kwh,
                    settlement.buyer,
                    settlement.payment,
                    settlement.seller
                );
            }
        }
    }
    Ok(())
}

fn run_source(cmd: SourceCmd, path: &PathBuf) -> Result<()> {
    let mut runtime = load_runtime(path)?;
    match cmd {
        SourceCmd::Add {
            id,
            name,
            description,
            caller,
        } => {
            let caller = resolve(&runtime, &caller)?;
            execute_and_save(
                &mut runtime,
                path,
                &caller,
                0,
                Call::Trading(TradingCall::AddSourceType {
                    id,
                    name: name.clone(),
                    description,
                }),
            )?;
            println!("added source type {id}: {name}");
        }
        SourceCmd::Show { id } => {
            let source = runtime.trading().source_type(id);
            if source.name.is_empty() {
                println!("{id}: (unregistered)");
            } else {
                println!("{id}: {}  — {}", source.name, source.description);
            }
        }
    }
    Ok(())
}
