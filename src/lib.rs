//! Intake relay: applicant form wizard and document relay.

pub mod channels;
pub mod config;
pub mod error;
pub mod form;
pub mod relay;
pub mod wizard;
