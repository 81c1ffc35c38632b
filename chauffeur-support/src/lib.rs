//! # Chauffeur Support
//!
//! Shared utilities for the Chauffeur registry crates.
//!
//! This crate provides:
//! - Text rendering for error messages (type names, resolution chains)
//! - "Did you mean?" suggestions for mistyped command names

pub mod rendering;
