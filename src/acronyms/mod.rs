//! Acronyms owned by users. Only the owner lookup lives here.

pub mod repo;

pub use repo::{Acronym, AcronymRepository, PgAcronymRepository};
