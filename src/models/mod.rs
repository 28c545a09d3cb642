//! Wire models for the Azure DevOps REST API.
//!
//! # Core Concepts
//!
//! - [`ClassificationNode`]: A node of the project's iteration (or area) tree. Year buckets and
//!   sprints are both classification nodes; sprints carry start and finish dates.
//! - [`TeamSettingsIteration`]: An iteration as seen from a team's settings, i.e. an iteration
//!   that is currently assigned to that team.
//! - [`TeamContext`]: The (project, team) pair addressing a team's settings.
//!
//! Payloads use the service's camelCase JSON. Only the fields this tool reads are modelled;
//! anything else in a response is ignored.

mod connection;
mod node;
mod team;

pub use connection::*;
pub use node::*;
pub use team::*;

use serde::{Deserialize, Serialize};

/// Envelope used by list endpoints: `{ "count": n, "value": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub count: usize,
    pub value: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(value: Vec<T>) -> Self {
        Self {
            count: value.len(),
            value,
        }
    }
}
