//! Mailflow automation core
//!
//! Document model, builders, validation, import/export and version history
//! for marketing automations, plus the gateway and session used to persist
//! them.

pub mod builder;
pub mod cli;
pub mod errors;
pub mod filesys;
pub mod gateway;
pub mod history;
pub mod logs;
pub mod models;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod utils;
pub mod validation;
