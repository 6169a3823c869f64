//! Roti Alcary CLI - delivery quotes, carts and WhatsApp orders.
//!
//! # Usage
//!
//! ```bash
//! # List delivery zones with their cost for a subtotal
//! alcary zones --subtotal 54000
//!
//! # Suggest a zone for an area
//! alcary suggest-zone "Banjarbaru"
//!
//! # Quote shipping and total
//! alcary quote --subtotal 54000 --zone zone1
//!
//! # Manage a cart stored in a JSON file
//! alcary cart --file cart.json add '{"id":1,"name":"Bolu Tape","selling_price":27000}' -q 2
//! alcary cart --file cart.json show
//!
//! # Compose the WhatsApp order and clear the cart
//! alcary checkout --file cart.json --name Sari --phone 0812 --zone zone1 --address "Jl. Mawar 1"
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_NAME` - Shop display name used in order messages
//! - `SHOP_WHATSAPP_NUMBER` - Number the order link points at

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::num::NonZeroU32;
use std::path::PathBuf;

use alcary_core::checkout::{DEFAULT_SHOP_NAME, DEFAULT_WHATSAPP_NUMBER};
use alcary_core::{CartStore, CustomerInfo, Rupiah, ShopProfile, WhatsAppNumber};
use chrono::{FixedOffset, Utc};
use clap::{Parser, Subcommand};

mod commands;
mod error;
mod storage;

use error::CliError;
use storage::FileStorage;

#[derive(Parser)]
#[command(name = "alcary")]
#[command(author, version, about = "Roti Alcary CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List delivery zones and their cost
    Zones {
        /// Order subtotal in rupiah (free shipping applies at 100000)
        #[arg(short, long, default_value_t = 0)]
        subtotal: i64,
    },
    /// Suggest a delivery zone for an area name
    SuggestZone {
        /// Area, district or village name
        area: String,
    },
    /// Quote shipping and total for a subtotal
    Quote {
        /// Order subtotal in rupiah
        #[arg(short, long)]
        subtotal: i64,

        /// Delivery zone ID (`pickup`, `zone1`, `zone2`, `zone3`)
        #[arg(short, long, default_value = "pickup")]
        zone: String,
    },
    /// Manage a cart stored in a JSON file
    Cart {
        /// Storage file holding the cart snapshot
        #[arg(short, long, default_value = "alcary-cart.json")]
        file: PathBuf,

        #[command(subcommand)]
        action: CartAction,
    },
    /// Compose the WhatsApp order for a stored cart, then clear it
    Checkout {
        /// Storage file holding the cart snapshot
        #[arg(short, long, default_value = "alcary-cart.json")]
        file: PathBuf,

        /// Customer name
        #[arg(long)]
        name: String,

        /// Customer phone number
        #[arg(long)]
        phone: String,

        /// Delivery address (not needed for pickup)
        #[arg(long, default_value = "")]
        address: String,

        /// Order notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Delivery zone ID
        #[arg(short, long, default_value = "pickup")]
        zone: String,

        /// Shop clock offset from UTC in hours
        #[arg(long, default_value_t = 7, allow_hyphen_values = true)]
        utc_offset: i32,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product given as a JSON object
    Add {
        /// Product JSON, e.g. '{"id":1,"name":"Bolu Tape","selling_price":27000}'
        product: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = NonZeroU32::MIN)]
        quantity: NonZeroU32,
    },
    /// Set a product's quantity (0 removes it)
    Set {
        /// Product ID
        id: String,

        /// New quantity
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: String,
    },
    /// Empty the cart
    Clear,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alcary_cli=info,alcary_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Zones { subtotal } => commands::zones::list(&mut out, Rupiah::new(subtotal))?,
        Commands::SuggestZone { area } => commands::zones::suggest(&mut out, &area)?,
        Commands::Quote { subtotal, zone } => {
            commands::zones::quote(&mut out, Rupiah::new(subtotal), &zone)?;
        }
        Commands::Cart { file, action } => {
            let mut store = CartStore::load(FileStorage::new(file));
            match action {
                CartAction::Show => {}
                CartAction::Add { product, quantity } => {
                    commands::cart::add(&mut store, &product, quantity)?;
                }
                CartAction::Set { id, quantity } => commands::cart::set(&mut store, &id, quantity),
                CartAction::Remove { id } => commands::cart::remove(&mut store, &id),
                CartAction::Clear => store.clear(),
            }
            commands::cart::show(&mut out, &store)?;
        }
        Commands::Checkout {
            file,
            name,
            phone,
            address,
            notes,
            zone,
            utc_offset,
        } => {
            let offset = utc_offset
                .checked_mul(3600)
                .and_then(FixedOffset::east_opt)
                .ok_or(CliError::InvalidOffset(utc_offset))?;
            let mut store = CartStore::load(FileStorage::new(file));
            let customer = CustomerInfo {
                name,
                phone,
                address,
                notes,
            };
            commands::checkout::run(
                &mut out,
                &mut store,
                &shop_profile()?,
                customer,
                &zone,
                Utc::now().with_timezone(&offset),
            )?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Shop identity from the environment, with the built-in defaults.
fn shop_profile() -> Result<ShopProfile, CliError> {
    dotenvy::dotenv().ok();

    let name = std::env::var("SHOP_NAME")
        .ok()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SHOP_NAME.to_string());
    let number = std::env::var("SHOP_WHATSAPP_NUMBER")
        .unwrap_or_else(|_| DEFAULT_WHATSAPP_NUMBER.to_string());

    Ok(ShopProfile {
        name,
        whatsapp_number: WhatsAppNumber::parse(&number)?,
    })
}
