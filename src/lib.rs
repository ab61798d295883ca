//! BioSearch-rs: search, chat, and analytics over a NASA bioscience
//! publication catalog.
//!
//! The HTTP surface exposes a filtered publication listing, a chat
//! assistant that merges the local catalog with live NASA sources, and
//! an analytics dashboard document. Storage sits behind the [`db::Store`]
//! trait, with a Postgres implementation and an in-memory mock selected
//! at startup.

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod sources;
