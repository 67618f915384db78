#![deny(rust_2018_idioms)]

pub mod order;
pub use order::{Field, Order};

pub mod parse;
pub use parse::function::{parse_orders, read_orders, read_raw_orders};

pub mod normalize;
pub use normalize::Normalizer;

pub mod dedup;
pub use dedup::function::deduplicate;

pub mod partition;

pub mod report;
pub use report::function::{process, write_list, write_orders};

pub mod data_entry;
pub use data_entry::function::read_data_entry;

pub mod billing;
pub use billing::function::{calculate, read_job, write_billing, write_summary};

pub mod config;
pub use config::Config;
