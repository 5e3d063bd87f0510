//! Storefront demo CLI
//!
//! The presentation collaborator for the storefront core: a thin
//! command-line layer driving the stores against file-backed storage. All
//! store logic lives in the library; this binary only parses arguments and
//! renders results.

use std::{
    error::Error,
    io::{self, Write},
    num::NonZeroU32,
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rusty_money::iso;
use tabled::{builder::Builder, settings::Style};
use tracing_subscriber::EnvFilter;

use storefront::{
    cart::Cart,
    catalog::{CatalogStore, PriceOrder},
    orders::{Order, OrderStore},
    prices::{Price, format_amount},
    products::{NewProduct, Product},
    rating::Stars,
    reviews::{NewReview, ReviewStore},
    session::Session,
    storage::FileStorage,
    users::{NewUser, Role, UserStore},
};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront demo", long_about = None)]
struct Cli {
    /// Directory holding the persisted storefront data
    #[arg(long, default_value = "./storefront-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse and manage the product catalog
    Catalog(CatalogCommand),

    /// Inspect and mutate the shopping cart
    Cart(CartCommand),

    /// Place an order from the current cart
    Checkout,

    /// List and decide orders
    Orders(OrdersCommand),

    /// Register, log in and out
    Account(AccountCommand),

    /// Post and read product reviews
    Review(ReviewCommand),
}

#[derive(Debug, Args)]
struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List products, optionally filtered and sorted
    List {
        /// Only show this category
        #[arg(long, default_value = "")]
        category: String,

        /// Sort the listing by price
        #[arg(long)]
        sort: Option<SortArg>,
    },

    /// Case-insensitive search over names and descriptions
    Search {
        /// Search term
        term: String,
    },

    /// Add a product to the catalog
    Add(AddProductArgs),

    /// Remove a product from the catalog
    Remove {
        /// Product identifier
        id: u64,
    },
}

#[derive(Debug, Args)]
struct AddProductArgs {
    /// Product name
    #[arg(long)]
    name: String,

    /// Free-text description
    #[arg(long, default_value = "")]
    description: String,

    /// Unit price in whole currency units
    #[arg(long)]
    price: u64,

    /// Category label
    #[arg(long)]
    category: String,

    /// Image reference (URL or embedded data)
    #[arg(long, default_value = "")]
    image: String,

    /// Star rating, 1-5
    #[arg(long, default_value_t = 4)]
    stars: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    /// Cheapest first
    PriceAsc,

    /// Most expensive first
    PriceDesc,
}

#[derive(Debug, Args)]
struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart lines and derived amounts
    Show,

    /// Add a catalog product to the cart
    Add {
        /// Product identifier
        product_id: u64,

        /// Number of units
        #[arg(long, default_value = "1")]
        quantity: NonZeroU32,
    },

    /// Remove a product from the cart
    Remove {
        /// Product identifier
        product_id: u64,
    },

    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List all orders
    List,

    /// Approve a pending order
    Approve {
        /// Order identifier
        id: u64,
    },

    /// Reject a pending order
    Reject {
        /// Order identifier
        id: u64,
    },

    /// Per-status counts and approved value
    Stats,
}

#[derive(Debug, Args)]
struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Debug, Subcommand)]
enum AccountSubcommand {
    /// Register a new account
    Register {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Password (stored in plaintext; this is a demo)
        #[arg(long)]
        password: String,

        /// Register as a seller with this store name
        #[arg(long)]
        store_name: Option<String>,
    },

    /// Log in with email and password
    Login {
        /// Email address
        email: String,

        /// Password
        password: String,
    },

    /// Log out of the current session
    Logout,

    /// Show the logged-in user
    Whoami,
}

#[derive(Debug, Args)]
struct ReviewCommand {
    #[command(subcommand)]
    command: ReviewSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReviewSubcommand {
    /// Post a review as the logged-in user
    Add {
        /// Product identifier
        product_id: u64,

        /// Star rating, 1-5
        #[arg(long)]
        stars: u8,

        /// Free-text comment
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// List the reviews for a product
    List {
        /// Product identifier
        product_id: u64,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let storage = FileStorage::open(&cli.data_dir)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Catalog(CatalogCommand { command }) => catalog(command, storage, &mut out),
        Commands::Cart(CartCommand { command }) => cart(command, storage, &mut out),
        Commands::Checkout => checkout(storage, &mut out),
        Commands::Orders(OrdersCommand { command }) => orders(command, storage, &mut out),
        Commands::Account(AccountCommand { command }) => account(command, storage, &mut out),
        Commands::Review(ReviewCommand { command }) => review(command, storage, &mut out),
    }
}

fn catalog(
    command: CatalogSubcommand,
    storage: FileStorage,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let mut store = CatalogStore::open(storage)?;

    match command {
        CatalogSubcommand::List { category, sort } => {
            let products = match sort {
                Some(SortArg::PriceAsc) => store.sorted_by_price(PriceOrder::Ascending),
                Some(SortArg::PriceDesc) => store.sorted_by_price(PriceOrder::Descending),
                None => store.filter_by_category(&category),
            };

            writeln!(out, "{}", product_table(&products))?;
        }
        CatalogSubcommand::Search { term } => {
            writeln!(out, "{}", product_table(&store.search(&term)))?;
        }
        CatalogSubcommand::Add(args) => {
            let product = store.insert(NewProduct {
                name: args.name,
                description: args.description,
                price: Price::new(args.price),
                category: args.category,
                image: args.image,
                stars: Stars::try_from(args.stars)?,
            })?;

            writeln!(out, "added product {} ({})", product.id, product.name)?;
        }
        CatalogSubcommand::Remove { id } => {
            let removed = store.remove(id)?;

            writeln!(out, "removed product {} ({})", removed.id, removed.name)?;
        }
    }

    Ok(())
}

fn cart(
    command: CartSubcommand,
    storage: FileStorage,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let mut cart = Cart::open(storage.clone())?;

    match command {
        CartSubcommand::Show => {
            writeln!(out, "{}", cart_table(&cart))?;
        }
        CartSubcommand::Add {
            product_id,
            quantity,
        } => {
            let catalog = CatalogStore::open(storage)?;

            let Some(product) = catalog.get(product_id) else {
                writeln!(out, "no product with id {product_id}")?;
                return Ok(());
            };

            cart.add(product.clone(), quantity)?;

            writeln!(out, "added {quantity} x {}", product.name)?;
        }
        CartSubcommand::Remove { product_id } => {
            cart.remove(product_id)?;

            writeln!(out, "removed product {product_id} from the cart")?;
        }
        CartSubcommand::Clear => {
            cart.clear()?;

            writeln!(out, "cart cleared")?;
        }
    }

    Ok(())
}

fn checkout(storage: FileStorage, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let mut cart = Cart::open(storage.clone())?;

    // Caller contract: the store does not reject empty carts itself.
    if cart.total_item_count() == 0 {
        writeln!(out, "the cart is empty; add products before checking out")?;
        return Ok(());
    }

    let mut orders = OrderStore::open(storage)?;
    let order = orders.create_from_cart(&cart)?;

    cart.clear()?;

    writeln!(
        out,
        "placed order {} for {} ({} items)",
        order.id,
        format_amount(order.total, iso::AOA),
        order.lines.len()
    )?;

    Ok(())
}

fn orders(
    command: OrdersSubcommand,
    storage: FileStorage,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let mut store = OrderStore::open(storage)?;

    match command {
        OrdersSubcommand::List => {
            writeln!(out, "{}", order_table(&store.all()))?;
        }
        OrdersSubcommand::Approve { id } => {
            store.approve(id)?;

            writeln!(out, "order {id} approved")?;
        }
        OrdersSubcommand::Reject { id } => {
            store.reject(id)?;

            writeln!(out, "order {id} rejected")?;
        }
        OrdersSubcommand::Stats => {
            let stats = store.statistics();

            writeln!(out, "total:    {}", stats.total)?;
            writeln!(out, "pending:  {}", stats.pending)?;
            writeln!(out, "approved: {}", stats.approved)?;
            writeln!(out, "rejected: {}", stats.rejected)?;
            writeln!(
                out,
                "approved value: {}",
                format_amount(stats.approved_value, iso::AOA)
            )?;
        }
    }

    Ok(())
}

fn account(
    command: AccountSubcommand,
    storage: FileStorage,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        AccountSubcommand::Register {
            name,
            email,
            password,
            store_name,
        } => {
            let role = if store_name.is_some() {
                Role::Seller
            } else {
                Role::Customer
            };

            let mut users = UserStore::open(storage)?;
            let user = users.add(NewUser {
                name,
                email,
                password,
                store_name,
                role,
            })?;

            writeln!(out, "registered {} as user {}", user.email, user.id)?;
        }
        AccountSubcommand::Login { email, password } => {
            let users = UserStore::open(storage.clone())?;
            let mut session = Session::open(storage)?;

            if let Some(user) = users.authenticate(&email, &password) {
                let user = user.clone();

                session.login(user.clone())?;
                writeln!(out, "logged in as {}", user.name)?;
            } else {
                writeln!(out, "invalid email or password")?;
            }
        }
        AccountSubcommand::Logout => {
            let mut session = Session::open(storage)?;

            session.logout()?;

            writeln!(out, "logged out")?;
        }
        AccountSubcommand::Whoami => {
            let session = Session::open(storage)?;

            if let Some(user) = session.current() {
                writeln!(out, "{} <{}>", user.name, user.email)?;
            } else {
                writeln!(out, "not logged in")?;
            }
        }
    }

    Ok(())
}

fn review(
    command: ReviewSubcommand,
    storage: FileStorage,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let mut reviews = ReviewStore::open(storage.clone())?;

    match command {
        ReviewSubcommand::Add {
            product_id,
            stars,
            comment,
        } => {
            let session = Session::open(storage)?;

            let Some(user) = session.current() else {
                writeln!(out, "log in before posting a review")?;
                return Ok(());
            };

            // Advisory pre-check; the store itself accepts duplicates.
            if reviews.has_user_reviewed(product_id, user.id) {
                writeln!(out, "you have already reviewed this product")?;
                return Ok(());
            }

            let review = reviews.add(NewReview {
                product_id,
                user_id: user.id,
                user_name: user.name.clone(),
                stars: Stars::try_from(stars)?,
                comment,
            })?;

            writeln!(out, "posted review {} ({})", review.id, review.stars)?;
        }
        ReviewSubcommand::List { product_id } => {
            for review in reviews.by_product(product_id) {
                writeln!(
                    out,
                    "{} {}: {}",
                    review.stars, review.user_name, review.comment
                )?;
            }

            if let Some(average) = reviews.average_for_product(product_id) {
                writeln!(out, "average: {average}")?;
            } else {
                writeln!(out, "no reviews yet")?;
            }
        }
    }

    Ok(())
}

fn product_table(products: &[Product]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Name", "Price", "Category", "Stars"]);

    for product in products {
        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.price.formatted(iso::AOA),
            product.category.clone(),
            product.stars.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::sharp());

    table.to_string()
}

fn cart_table(cart: &Cart<FileStorage>) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Product", "Unit price", "Qty", "Line total"]);

    for line in cart.lines() {
        let line_total =
            line.product.price.to_decimal() * rust_decimal::Decimal::from(line.quantity.get());

        builder.push_record([
            line.product.name.clone(),
            line.product.price.formatted(iso::AOA),
            line.quantity.to_string(),
            format_amount(line_total, iso::AOA),
        ]);
    }

    let subtotal = format_amount(cart.subtotal(), iso::AOA);
    let delivery = format_amount(cart.delivery_fee(), iso::AOA);
    let total = format_amount(cart.total(), iso::AOA);

    builder.push_record(["", "", "Subtotal", subtotal.as_str()]);
    builder.push_record(["", "", "Delivery", delivery.as_str()]);
    builder.push_record(["", "", "Total", total.as_str()]);

    let mut table = builder.build();
    table.with(Style::sharp());

    table.to_string()
}

fn order_table(orders: &[Order]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Placed at", "Items", "Total", "Status"]);

    for order in orders {
        builder.push_record([
            order.id.to_string(),
            order.placed_at.to_string(),
            order.lines.len().to_string(),
            format_amount(order.total, iso::AOA),
            order.status.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::sharp());

    table.to_string()
}
