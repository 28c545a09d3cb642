//! Sprint iteration lifecycle management for Azure DevOps.
//!
//! A single run makes sure a year's worth of bi-weekly sprint iterations exists under a
//! root iteration path, assigns the new ones to the configured teams, and unassigns the
//! finished iterations that fall outside each team's retention window.

pub mod calendar;
pub mod client;
pub mod config;
pub mod lifecycle;
pub mod models;
pub mod paths;
