//! Service layer for the schedule pipeline.
//!
//! This module contains the business logic for:
//! - Link discovery on the listing page (`LinkDiscovery`)
//! - Document parsing into lessons (`DocumentParser`)
//! - Update status publishing (`StatusReporter`)

mod links;
pub mod parser;
mod status;

pub use links::LinkDiscovery;
pub use parser::{DocumentParser, parse_text};
pub use status::StatusReporter;
