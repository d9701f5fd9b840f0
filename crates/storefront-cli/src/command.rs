use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use storefront_commerce::ItemKey;

pub const API_URL_ENV: &str = "STOREFRONT_API_URL";
pub const STATE_FILE_ENV: &str = "STOREFRONT_STATE_FILE";

#[derive(Parser, Clone)]
#[command(name = "sf", version, about = "Storefront CLI", long_about = None)]
pub struct Cli {
    // Optional so that running without a command prints the help
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        long,
        global = true,
        env = API_URL_ENV,
        default_value = "http://localhost:8000/api",
        help = "Base URL of the storefront API."
    )]
    pub api_url: String,

    #[arg(
        long,
        global = true,
        env = STATE_FILE_ENV,
        default_value = "storefront.sqlite",
        help = "File holding the session and cached collections."
    )]
    pub state_file: PathBuf,

    #[arg(
        short = 'q',
        long,
        global = true,
        help = "Don't return anything to stdout."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    #[command(long_about = "Log into a user account and merge local favorites into it.")]
    Login(LoginArgs),

    #[command(long_about = "Log out of the current user account.")]
    Logout,

    #[command(long_about = "Show or update the profile of the logged in user.")]
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },

    #[command(long_about = "Inspect and modify the shopping cart.")]
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },

    #[command(long_about = "Inspect and modify the favorites. Works without logging in.")]
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
}

#[derive(Args, Clone)]
pub struct LoginArgs {
    pub username: String,

    #[arg(long, help = "Prompted for when omitted")]
    pub password: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum ProfileCommands {
    Show,
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum CartCommands {
    List,
    Add {
        #[arg(help = "Item to add, e.g. `product-7` or `bundle-3`")]
        item: ItemKey,
        #[arg(short = 'n', long, default_value_t = 1)]
        quantity: u32,
    },
    Set {
        item: ItemKey,
        #[arg(allow_negative_numbers = true, help = "Zero or less removes the item")]
        quantity: i64,
    },
    Remove {
        item: ItemKey,
    },
    Clear,
}

#[derive(Subcommand, Clone)]
pub enum FavoritesCommands {
    List,
    Add { item: ItemKey },
    Remove { item: ItemKey },
    #[command(long_about = "Replace the favorites stored on the server with the local ones.")]
    Sync,
}
