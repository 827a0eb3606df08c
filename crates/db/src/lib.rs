//! SQLite persistence: pool setup, embedded migrations, demo fixtures, and
//! the tenant/product/order repositories. Every query is scoped by owner id;
//! cross-tenant reads are not expressible through the repository traits.

pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
