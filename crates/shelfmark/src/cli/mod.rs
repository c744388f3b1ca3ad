//! Command-line front end: offline recommendation queries and rating store maintenance

pub mod commands;
pub mod display;
