//! Command-line surface: clap parser and subcommands.

mod clap_parser;

pub use clap_parser::{Cli, Command, parse_cli_to_app_config};
