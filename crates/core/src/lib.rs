//! # Courtbook Core
//!
//! Domain layer for the court booking engine: entity models, typed errors,
//! the configuration resolver, the availability calculator, reservation
//! planning, and the booking lifecycle state machine. Everything in this
//! crate is pure logic over already-loaded data; persistence lives in
//! `courtbook-db`.

pub mod availability;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod reserve;
pub mod resolver;
