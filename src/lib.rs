// src/lib.rs

//! PATC schedule ingestion library

pub mod app;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
