//! Request/response envelopes exchanged with the automation API

pub mod models;
