//! Database bindings for shaped queries

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{push_descriptor, push_where};
