//! Local HTTP server: trigger endpoints and status API

pub mod handlers;
pub mod serve;
pub mod state;
pub mod webhook;
