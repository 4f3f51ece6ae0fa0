//! Core module - configuration record, events, and the camouflage state machine

pub mod config;
pub mod events;
pub mod ledger;
pub mod machine;
pub mod stats;
