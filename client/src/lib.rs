#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

//! Client for the Limtel telephony API.
//!
//! See [`api`] for the client itself and [`config`] for layered
//! configuration loading.

pub mod api;
pub mod config;

pub use limtel_xml::Element;
