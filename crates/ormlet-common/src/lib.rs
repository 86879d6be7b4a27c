//! Common utilities for ormlet
//!
//! This crate provides the error taxonomy shared by the mapping engine and
//! its collaborators.

pub mod error;

pub use error::{OrmError, Result};
