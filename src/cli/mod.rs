//! CLI command handlers

pub mod commands;

pub use commands::{
    convert, export, init_logging, open_session, parse_rate_override, rates, sheets, show,
    ShowOptions,
};
