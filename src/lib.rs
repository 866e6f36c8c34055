pub mod args;
pub mod cache;
pub mod config;
pub mod detect;
pub mod error;
pub mod plot;
pub mod scan;
pub mod series;
pub mod table;
pub mod util;
