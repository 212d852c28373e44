//! Core types and the attendance event pipeline for Hadir.
//!
//! This crate has no HTTP or database dependencies. It owns
//! the domain records, the store abstraction, and everything that sits between
//! an authenticated principal and the attendance log: identity resolution,
//! roster administration, the teacher's scan session, the check-in engine,
//! and the realtime report feed.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod auth;
pub mod checkin;
pub mod error;
pub mod feed;
pub mod identity;
pub mod live;
pub mod report;
pub mod roster;
pub mod session;
pub mod store;
pub mod subject;
pub mod user;
pub mod view;

pub use error::{Error, Result, WriteError};
