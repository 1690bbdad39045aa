//! framegrab library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod config;
pub mod controller;
pub mod input;
pub mod labels;
pub mod preview;
pub mod saver;
pub mod source;
pub mod terminal;
