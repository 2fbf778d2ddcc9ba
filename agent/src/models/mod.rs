//! Data models

pub mod project;
