//! Shelfmark - Book Recommendation Service
//!
//! Serves collaborative, content-based and hybrid book recommendations from
//! precomputed similarity tables, and keeps per-session user ratings in SQLite.

mod assets;

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod ratings;
pub mod recommend;
pub mod server;
pub mod session;
pub mod similarity;

pub use error::{Result, ShelfmarkError};
