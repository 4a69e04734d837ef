//! Command dispatch: bridges CLI args -> storefront reads and writes -> output.

pub mod auth;
pub mod categories;
pub mod config_cmd;
pub mod orders;
pub mod pharmacies;
pub mod products;
pub mod util;
pub mod watch;

use medcart_core::Storefront;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    store: &Storefront,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Products(args) => products::handle(store, args, global).await,
        Command::Categories(args) => categories::handle(store, args, global).await,
        Command::Pharmacies(args) => pharmacies::handle(store, args, global).await,
        Command::Orders(args) => orders::handle(store, args, global).await,
        Command::Watch(args) => watch::handle(store, args, global).await,
        Command::Login(args) => auth::login(store, args, global).await,
        // Handled before a backend is set up
        Command::Logout | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
