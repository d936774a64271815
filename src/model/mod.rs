mod account;
mod doc;
mod toot;

pub use self::account::{Account, account_key};
pub use self::doc::{AccountDoc, StateDoc, TootDoc};
pub use self::toot::Toot;
