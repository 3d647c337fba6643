//! The relational persistence collaborator: one actor owning every table,
//! a typed client, and a unit-of-work for multi-row commands.

pub mod actor;
pub mod client;
pub mod database;
pub mod error;

pub use actor::*;
pub use client::*;
pub use database::*;
pub use error::*;
