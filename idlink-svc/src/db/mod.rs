//! Contact store queries

pub mod contacts;
