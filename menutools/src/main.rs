use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use log::*;
use menu_engine::db_types::{OrderStatusType, PaymentMethod};
use menu_server::data_objects::AnalyticsParams;
use url::Url;

use menutools::{
    cart::Cart,
    client::MenuClient,
    formatting::{format_averages, format_cart, format_order, format_orders, format_products, format_report},
    order_board::OrderBoard,
};

#[derive(Parser, Debug)]
#[command(version, about = "Command-line companion for the table-side menu server")]
pub struct Arguments {
    /// The menu server's base URL
    #[arg(short, long, env = "MENU_SERVER_URL", default_value = "http://127.0.0.1:3001")]
    server: Url,
    #[command(flatten)]
    login: LoginParams,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
pub struct LoginParams {
    /// Staff username, for the commands that need a login
    #[arg(short, long, env = "MENU_USERNAME", global = true)]
    username: Option<String>,
    /// Staff password
    #[arg(short, long, env = "MENU_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the server is up
    Health,
    /// Log in and show who you are
    Whoami,
    /// Print the menu
    Menu,
    /// Place an order from a table, as a customer would
    Order(OrderParams),
    /// List orders (staff)
    Orders {
        /// Only show orders with this status (new, in_progress, ready, completed)
        #[arg(short = 't', long)]
        status: Option<OrderStatusType>,
    },
    /// Move an order to a new status (staff)
    Status { id: i64, status: OrderStatusType },
    /// Mark a product as sold out or back in stock (staff)
    Stock {
        id: i64,
        /// true if the product is available
        #[arg(action = clap::ArgAction::Set)]
        in_stock: bool,
    },
    /// Sales figures (staff; employees may only ask for shift1 and shift2)
    Analytics {
        /// today, week, month, year, shift1 or shift2
        #[arg(long)]
        period: Option<String>,
        /// Start of a date range, YYYY-MM-DD
        #[arg(long = "from")]
        start_date: Option<String>,
        /// End of a date range (inclusive), YYYY-MM-DD
        #[arg(long = "to")]
        end_date: Option<String>,
    },
    /// Average order values (owners)
    Averages,
    /// Show the order board and keep it up to date as orders come in (staff)
    Watch {
        #[arg(short = 't', long)]
        status: Option<OrderStatusType>,
    },
}

#[derive(Debug, Args)]
pub struct OrderParams {
    #[arg(short, long)]
    table: i64,
    /// cash or card
    #[arg(short = 'm', long, default_value = "cash")]
    payment: PaymentMethod,
    /// A product to order, as ID or ID:QUANTITY. Repeat for more products
    #[arg(short, long = "item", value_parser = parse_item, required = true)]
    items: Vec<(i64, i64)>,
    /// A note for the kitchen
    #[arg(short, long)]
    note: Option<String>,
}

fn parse_item(s: &str) -> Result<(i64, i64), String> {
    let (id, qty) = s.split_once(':').unwrap_or((s, "1"));
    let id = id.trim().parse::<i64>().map_err(|e| format!("Invalid product id '{id}'. {e}"))?;
    let qty = qty.trim().parse::<i64>().map_err(|e| format!("Invalid quantity '{qty}'. {e}"))?;
    Ok((id, qty))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    if let Err(e) = run(cli).await {
        error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Arguments) -> Result<()> {
    let mut client = MenuClient::new(cli.server)?;
    match cli.command {
        Command::Health => println!("{}", client.health().await?),
        Command::Whoami => {
            login(&mut client, &cli.login).await?;
            let user = client.me().await?;
            println!("{} (#{}), {}. Account created {}", user.username, user.id, user.role, user.created_at);
        },
        Command::Menu => println!("{}", format_products(&client.products().await?)),
        Command::Order(params) => place_order(&client, params).await?,
        Command::Orders { status } => {
            login(&mut client, &cli.login).await?;
            println!("{}", format_orders(&client.orders(status).await?));
        },
        Command::Status { id, status } => {
            login(&mut client, &cli.login).await?;
            let order = client.set_status(id, status).await?;
            let mut s = String::new();
            format_order(&order, &mut s)?;
            println!("{s}");
        },
        Command::Stock { id, in_stock } => {
            login(&mut client, &cli.login).await?;
            let product = client.set_stock(id, in_stock).await?;
            println!("{}", format_products(&[product]));
        },
        Command::Analytics { period, start_date, end_date } => {
            login(&mut client, &cli.login).await?;
            let report = client.analytics(&AnalyticsParams { period, start_date, end_date }).await?;
            println!("{}", format_report(&report)?);
        },
        Command::Averages => {
            login(&mut client, &cli.login).await?;
            println!("{}", format_averages(&client.averages().await?));
        },
        Command::Watch { status } => {
            login(&mut client, &cli.login).await?;
            watch(client, status).await?;
        },
    }
    Ok(())
}

async fn login(client: &mut MenuClient, params: &LoginParams) -> Result<()> {
    let username =
        params.username.as_deref().ok_or_else(|| anyhow!("This command needs --username or MENU_USERNAME"))?;
    let password =
        params.password.as_deref().ok_or_else(|| anyhow!("This command needs --password or MENU_PASSWORD"))?;
    client.login(username, password).await?;
    Ok(())
}

async fn place_order(client: &MenuClient, params: OrderParams) -> Result<()> {
    let products = client.products().await?;
    let mut cart = Cart::new();
    for (id, qty) in params.items {
        let product =
            products.iter().find(|p| p.id == id).ok_or_else(|| anyhow!("There is no product {id} on the menu"))?;
        cart.add_quantity(product, qty)?;
    }
    println!("{}", format_cart(&cart));
    let request = cart.checkout(params.table, params.payment, params.note)?;
    let order = client.place_order(&request).await?;
    cart.clear();
    let mut s = String::new();
    format_order(&order, &mut s)?;
    println!("Order placed!\n{s}");
    Ok(())
}

async fn watch(client: MenuClient, status: Option<OrderStatusType>) -> Result<()> {
    // Subscribe before the first fetch so that nothing placed in between is missed
    let events = client.subscribe().await?;
    let mut board = OrderBoard::new(&client);
    if let Some(status) = status {
        board = board.with_filter(status);
    }
    println!("{}", format_orders(board.refresh().await?));
    board
        .run(events, |notice, orders| {
            println!("{} #{}", notice.event, notice.order_id);
            println!("{}", format_orders(orders));
        })
        .await
}
