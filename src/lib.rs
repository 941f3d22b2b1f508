//! Nugget Feed - a daily article RSS feed
//!
//! This crate produces one short article per day on a rotating topic, either
//! from a chat-completion service or from a static fallback pool, and keeps a
//! bounded, newest-first RSS 2.0 feed of the results.

pub mod article;
pub mod config;
pub mod fallback;
pub mod feed;
pub mod generator;
pub mod run;
pub mod store;
pub mod topics;
