//! Derive macros for Chauffeur, re-exported from `chauffeur-macros`.

pub use chauffeur_macros::{Describe, Injectable};
