//! Wire types for the outreach state and session files.
//!
//! This crate contains the serde-serializable shapes of the two files the
//! outreach layer keeps on disk between runs. These types represent the
//! "file layer" - the data exactly as it appears in JSON.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with the files: `state.json` and `cookies.json` as written by earlier runs
//! * Stable: Changes only when the file format changes
//!
//! Set semantics, locking and persistence are built on top of these types in
//! `outreach-core`.

pub mod cookie;
pub mod state;

pub use cookie::*;
pub use state::*;
