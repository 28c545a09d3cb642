use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Addresses one team's settings within a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamContext {
    pub project: String,
    pub team: String,
}

impl TeamContext {
    pub fn new(project: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            team: team.into(),
        }
    }
}

/// An iteration currently assigned to a team.
///
/// Unlike [`super::ClassificationNode::path`], the path here has no leading separator and
/// no `Iteration` segment: `Fabrikam\Release\2024\2024-01`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSettingsIteration {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub attributes: TeamIterationAttributes,
}

impl TeamSettingsIteration {
    /// True when the iteration has a finish date strictly before `today`.
    pub fn finished_before(&self, today: NaiveDate) -> bool {
        self.attributes
            .finish_date
            .is_some_and(|finish| finish.date_naive() < today)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamIterationAttributes {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_frame: Option<TimeFrame>,
}

/// Where an iteration sits relative to today, as computed by the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    Past,
    Current,
    Future,
}

/// Body of an assignment call: the iteration is referenced by identifier only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamIterationRef {
    pub id: Uuid,
}
