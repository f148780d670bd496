//! Core types and trait definitions for the TradingMind notes store.
//!
//! This crate holds the record types, ticker extraction, the
//! [`DocumentStore`](store::DocumentStore) abstraction and the typed
//! collections layered over it. It has no database dependency; backends such
//! as `tradingmind-store-sqlite` implement the trait.

pub mod article;
pub mod capture;
pub mod clock;
pub mod collection;
pub mod collections;
pub mod error;
pub mod local;
pub mod note;
pub mod store;
pub mod tickers;

pub use error::{Error, Result};
