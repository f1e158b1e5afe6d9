//! vellum-core - Core library for Vellum
//!
//! This crate contains the shared models, storage layer, publish scheduler,
//! and offline sync queue behind the Vellum interfaces.

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod publish;
pub mod scheduler;
pub mod services;
pub mod sync;

pub use error::{Error, Result};
pub use models::{Article, ArticleId, Platform, ScheduledTask, TaskId, UserId};
