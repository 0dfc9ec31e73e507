//! Binary entrypoint for the Comanda POS terminal.
//!
//! Commands:
//! - `init` - write a starter `pos.toml`
//! - `login` / `logout` / `whoami` - session
//! - `order --table <id> | --takeaway <name> --item <product>[*qty][:notes]...` -
//!   send an order to the kitchen
//! - `append <order> --item ...` - add lines to an open order
//! - `reprint <order>` / `orders` / `close <order>`
//! - `menu` / `tables` / `category` / `product` / `table` / `member` - admin
//! - `summary [--period day|week|month|year] [--date YYYY-MM-DD]`
//! - `printers` / `select-printer` / `printer-status`
//!
//! `--dry-run` sends tickets to an in-memory printer and shows them instead.
//! Results are printed as JSON on stdout, errors as `{code, message}` on
//! stderr.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use comanda_client::repository::{CategoryPatch, MemberPatch, NewProduct, ProductPatch, TablePatch};
use comanda_client::PosConfig;
use comanda_core::{MemberRole, Money, OrderStatus, OrderType, PrintOrder, SummaryPeriod, ValidationError};
use comanda_print::{compose, escpos, OpLog};

use comanda_terminal::commands::{catalog, dashboard, draft, members, order, printer, session};
use comanda_terminal::error::{AppError, AppResult};
use comanda_terminal::state::AppState;
use comanda_terminal::{build_state, init_tracing};

#[derive(Parser)]
#[command(name = "comanda")]
#[command(about = "Restaurant point of sale: orders and kitchen tickets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show tickets instead of sending them to the printer
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter pos.toml
    Init,
    /// Sign in (password read from stdin when omitted)
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user and store
    Whoami,
    /// Send a new order to the kitchen
    Order {
        /// Dine-in table id
        #[arg(long, conflicts_with = "takeaway", required_unless_present = "takeaway")]
        table: Option<String>,
        /// Takeaway customer name
        #[arg(long)]
        takeaway: Option<String>,
        /// `<product_id>[*<qty>][:<notes>]`, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<ItemSpec>,
    },
    /// Add lines to an open order and print only those
    Append {
        order_id: String,
        #[arg(long = "item", required = true)]
        items: Vec<ItemSpec>,
    },
    /// Print an order again
    Reprint { order_id: String },
    /// List orders, newest first
    Orders {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Close an order and free its table
    Close { order_id: String },
    /// Categories and products
    Menu {
        /// Include inactive entries
        #[arg(long)]
        all: bool,
    },
    /// Dining tables
    Tables {
        #[arg(long)]
        all: bool,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage dining tables
    Table {
        #[command(subcommand)]
        action: TableAction,
    },
    /// Manage store members
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },
    /// Sales summary
    Summary {
        #[arg(long, default_value = "day")]
        period: SummaryPeriod,
        /// Reference date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List paired printers
    Printers,
    /// Use a printer for this store
    SelectPrinter {
        address: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the selected printer
    ClearPrinter {
        /// Also clear it from the store settings
        #[arg(long)]
        store: bool,
    },
    /// Show printer connection and address
    PrinterStatus,
}

#[derive(Subcommand)]
enum CategoryAction {
    Add { name: String },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    Add {
        name: String,
        #[arg(value_parser = Money::parse_decimal)]
        price: Money,
        #[arg(long)]
        category: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = Money::parse_decimal)]
        price: Option<Money>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand)]
enum TableAction {
    Add { name: String },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand)]
enum MemberAction {
    List,
    Invite {
        email: String,
        #[arg(long, value_enum, default_value = "staff")]
        role: RoleArg,
        /// Add the member disabled
        #[arg(long)]
        inactive: bool,
    },
    Update {
        id: String,
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Open,
    Closed,
}

impl From<StatusArg> for OrderStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => OrderStatus::Open,
            StatusArg::Closed => OrderStatus::Closed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    Staff,
}

impl From<RoleArg> for MemberRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => MemberRole::Admin,
            RoleArg::Staff => MemberRole::Staff,
        }
    }
}

/// One `--item` argument.
#[derive(Debug, Clone, PartialEq)]
struct ItemSpec {
    product_id: String,
    quantity: i64,
    notes: Option<String>,
}

impl FromStr for ItemSpec {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, notes) = match s.split_once(':') {
            Some((head, notes)) => (head, Some(notes.trim().to_string())),
            None => (s, None),
        };
        let (product_id, quantity) = match head.split_once('*') {
            Some((id, qty)) => {
                let qty = qty.trim().parse().map_err(|_| ValidationError::InvalidFormat {
                    field: "item".to_string(),
                    reason: format!("bad quantity '{}'", qty),
                })?;
                (id, qty)
            }
            None => (head, 1),
        };

        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Err(ValidationError::required("product id"));
        }
        Ok(ItemSpec {
            product_id: product_id.to_string(),
            quantity,
            notes: notes.filter(|n| !n.is_empty()),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&e).unwrap_or_else(|_| e.to_string())
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    if let Commands::Init = cli.command {
        PosConfig::default().save(cli.config)?;
        return Ok(());
    }

    let (state, dry_run_log) = build_state(cli.config, cli.dry_run)?;

    if let Commands::Login { email, password } = &cli.command {
        let password = match password {
            Some(password) => password.clone(),
            None => read_password()?,
        };
        return emit(&session::login(&state.session, &state.config, email, &password).await?);
    }

    if session::restore(&state.session, &state.config).await?.is_none() {
        return Err(AppError::unauthenticated());
    }

    match cli.command {
        Commands::Init | Commands::Login { .. } => Ok(()),
        Commands::Logout => session::logout(&state.session, &state.draft).await,
        Commands::Whoami => emit(&session::whoami(&state.session).await?),

        Commands::Order {
            table,
            takeaway,
            items,
        } => {
            fill_draft(&state, &items).await?;
            match takeaway {
                Some(name) => {
                    draft::set_order_type(&state.draft, OrderType::Takeaway);
                    draft::set_customer_name(&state.draft, Some(name));
                }
                None => {
                    draft::set_order_type(&state.draft, OrderType::DineIn);
                    draft::select_table(&state.draft, table);
                }
            }
            let outcome =
                order::send_to_kitchen(&state.draft, &state.session, &state.printer, &state.config)
                    .await?;
            if let Some(log) = &dry_run_log {
                show_ticket(&state, log, PrintOrder::from_confirmed(&outcome.order).ok());
            }
            emit(&outcome)
        }
        Commands::Append { order_id, items } => {
            fill_draft(&state, &items).await?;
            let outcome = order::append_to_open_order(
                &state.draft,
                &state.session,
                &state.printer,
                &state.config,
                &order_id,
            )
            .await?;
            if let Some(log) = &dry_run_log {
                show_ticket(&state, log, None);
            }
            emit(&outcome)
        }
        Commands::Reprint { order_id } => {
            let outcome =
                order::reprint_order(&state.session, &state.printer, &state.config, &order_id)
                    .await?;
            if let Some(log) = &dry_run_log {
                show_ticket(&state, log, None);
            }
            emit(&outcome)
        }
        Commands::Orders { status } => {
            emit(&order::list_orders(&state.session, status.map(OrderStatus::from)).await?)
        }
        Commands::Close { order_id } => order::close_order(&state.session, &order_id).await,

        Commands::Menu { all } => {
            #[derive(Serialize)]
            struct Menu {
                categories: Vec<comanda_core::Category>,
                products: Vec<comanda_core::Product>,
            }
            emit(&Menu {
                categories: catalog::list_categories(&state.session, all).await?,
                products: catalog::list_products(&state.session, all).await?,
            })
        }
        Commands::Tables { all } => emit(&catalog::list_tables(&state.session, all).await?),
        Commands::Category { action } => match action {
            CategoryAction::Add { name } => {
                emit(&catalog::create_category(&state.session, &name).await?)
            }
            CategoryAction::Update { id, name, active } => {
                let patch = CategoryPatch {
                    name,
                    is_active: active,
                };
                emit(&catalog::update_category(&state.session, &id, &patch).await?)
            }
        },
        Commands::Product { action } => match action {
            ProductAction::Add {
                name,
                price,
                category,
            } => {
                let input = NewProduct {
                    name,
                    price,
                    category_id: category,
                };
                emit(&catalog::create_product(&state.session, &input).await?)
            }
            ProductAction::Update {
                id,
                name,
                price,
                category,
                active,
            } => {
                let patch = ProductPatch {
                    name,
                    price,
                    category_id: category,
                    is_active: active,
                };
                emit(&catalog::update_product(&state.session, &id, &patch).await?)
            }
        },
        Commands::Table { action } => match action {
            TableAction::Add { name } => emit(&catalog::create_table(&state.session, &name).await?),
            TableAction::Update { id, name, active } => {
                let patch = TablePatch {
                    name,
                    is_active: active,
                };
                emit(&catalog::update_table(&state.session, &id, &patch).await?)
            }
        },
        Commands::Member { action } => match action {
            MemberAction::List => emit(&members::list_members(&state.session).await?),
            MemberAction::Invite {
                email,
                role,
                inactive,
            } => members::invite_member(&state.session, &email, role.into(), !inactive).await,
            MemberAction::Update { id, role, active } => {
                let patch = MemberPatch {
                    role: role.map(MemberRole::from),
                    is_active: active,
                };
                emit(&members::update_member(&state.session, &id, &patch).await?)
            }
        },

        Commands::Summary { period, date } => {
            emit(&dashboard::get_summary(&state.session, period, date).await?)
        }

        Commands::Printers => emit(&printer::scan_printers(&state.printer).await?),
        Commands::SelectPrinter { address, name } => emit(
            &printer::select_printer(&state.session, &state.printer, name.as_deref(), &address)
                .await?,
        ),
        Commands::ClearPrinter { store } => {
            printer::clear_printer(&state.session, &state.printer, store).await
        }
        Commands::PrinterStatus => emit(
            &printer::printer_status(&state.session, &state.printer, &state.config).await?,
        ),
    }
}

/// Puts the `--item` arguments into the draft.
async fn fill_draft(state: &AppState, items: &[ItemSpec]) -> AppResult<()> {
    for item in items {
        let uid = draft::add_product(&state.draft, &state.session, &item.product_id).await?;
        if item.quantity != 1 {
            draft::set_quantity(&state.draft, &uid, item.quantity)?;
        }
        if let Some(notes) = &item.notes {
            draft::set_notes(&state.draft, &uid, Some(notes.as_str()))?;
        }
    }
    Ok(())
}

fn read_password() -> AppResult<String> {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::internal(format!("Could not read password: {}", e)))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Dry run: what the printer would have received.
fn show_ticket(state: &AppState, log: &OpLog, ticket: Option<PrintOrder>) {
    eprintln!("----- ticket (dry run) -----");
    for line in log.printed_lines() {
        eprintln!("{}", line);
    }
    if let Some(ticket) = ticket {
        let bytes = escpos::encode(&compose(&ticket, state.printer.handle().layout()));
        eprintln!("----- {} bytes of ESC/POS -----", bytes.len());
    }
}

fn emit<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Could not render output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_spec() {
        assert_eq!(
            "p-1*2:sin hielo".parse::<ItemSpec>().unwrap(),
            ItemSpec {
                product_id: "p-1".into(),
                quantity: 2,
                notes: Some("sin hielo".into()),
            }
        );
        assert_eq!("p-2".parse::<ItemSpec>().unwrap().quantity, 1);
        assert!("p-3*dos".parse::<ItemSpec>().is_err());
        assert!("*2".parse::<ItemSpec>().is_err());
    }

    #[test]
    fn test_cli_parses_order() {
        let cli = Cli::try_parse_from([
            "comanda",
            "--dry-run",
            "order",
            "--takeaway",
            "Ana",
            "--item",
            "p-1*2",
            "--item",
            "p-2:sin hielo",
        ])
        .unwrap();
        assert!(cli.dry_run);
        match cli.command {
            Commands::Order {
                table,
                takeaway,
                items,
            } => {
                assert!(table.is_none());
                assert_eq!(takeaway.as_deref(), Some("Ana"));
                assert_eq!(items.len(), 2);
            }
            _ => panic!("expected order"),
        }
    }

    #[test]
    fn test_cli_requires_table_or_takeaway() {
        assert!(Cli::try_parse_from(["comanda", "order", "--item", "p-1"]).is_err());
    }
}
