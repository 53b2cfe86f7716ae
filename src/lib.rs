#![warn(clippy::pedantic)]
// Noisy doc/signature lints
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Keeping format!("{}", x) over format!("{x}") for readability with complex exprs
#![allow(clippy::uninlined_format_args)]
// Timestamps and counts cross i64/u32/usize boundaries in the wire models
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
// Tool modules use the foo::FooTool pattern
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod format;
pub mod gateway;
pub mod health;
pub mod mcp;
pub mod models;
pub mod responder;
pub mod scheduler;
pub mod tools;
pub(crate) mod utils;
pub mod whatsapp;
pub mod youtube;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
