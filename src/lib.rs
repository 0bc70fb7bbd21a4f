pub mod cli;
pub mod config;
pub mod dates;
pub mod driver;
pub mod error;
pub mod extract;
pub mod layout;
pub mod paginate;
pub mod params;
pub mod playwright;
pub mod record;
pub mod run;
pub mod segment;
pub mod sink;

pub use error::{GrevError, Result};
