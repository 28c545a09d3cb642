//! Finds the finished iterations each team holds beyond its retention window.

use chrono::NaiveDate;
use uuid::Uuid;

use super::Phase;
use crate::client::{ClientError, WorkTracking};
use crate::config::IterationConfig;
use crate::models::{TeamContext, TeamSettingsIteration};
use crate::paths;

/// Iterations to unassign, per team, in configured team order.
///
/// Every configured team has an entry, possibly empty. A team configured twice has one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    entries: Vec<(String, Vec<Uuid>)>,
}

impl RetentionPlan {
    /// Records the iterations of `team`; the first entry for a team wins.
    pub fn insert(&mut self, team: impl Into<String>, iterations: Vec<Uuid>) {
        let team = team.into();
        if self.for_team(&team).is_none() {
            self.entries.push((team, iterations));
        }
    }

    pub fn for_team(&self, team: &str) -> Option<&[Uuid]> {
        self.entries
            .iter()
            .find(|(name, _)| name == team)
            .map(|(_, ids)| ids.as_slice())
    }

    pub fn teams(&self) -> impl Iterator<Item = (&str, &[Uuid])> {
        self.entries
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// Number of (team, iteration) pairs to unassign.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, ids)| ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Picks the iterations to unassign from one team's assignments.
///
/// Only iterations under `prefix` whose finish date is before `today` are considered. They are
/// ranked by start date, newest first; the first `keep` stay and the rest are returned in rank
/// order. Equal start dates keep the order the service returned them in.
pub fn select_for_unassignment(
    iterations: &[TeamSettingsIteration],
    prefix: &str,
    today: NaiveDate,
    keep: usize,
) -> Vec<Uuid> {
    let mut finished: Vec<&TeamSettingsIteration> = iterations
        .iter()
        .filter(|i| i.finished_before(today) && paths::is_in_scope(&i.path, prefix))
        .collect();
    finished.sort_by(|a, b| b.attributes.start_date.cmp(&a.attributes.start_date));
    finished.into_iter().skip(keep).map(|i| i.id).collect()
}

/// Fetches every team's iterations and builds the [`RetentionPlan`].
#[tracing::instrument(skip_all, fields(phase = %Phase::ScanRetention))]
pub async fn scan<C: WorkTracking>(
    client: &C,
    config: &IterationConfig,
    today: NaiveDate,
) -> Result<RetentionPlan, ClientError> {
    tracing::info!("retrieving past iterations to unassign");
    let prefix = paths::scope_prefix(&config.project, &config.root_iteration_path);
    let mut plan = RetentionPlan::default();

    for team in &config.teams {
        if plan.for_team(team).is_some() {
            continue;
        }
        let context = TeamContext::new(&config.project, team);
        let iterations = client.get_team_iterations(&context).await?;
        let stale =
            select_for_unassignment(&iterations, &prefix, today, config.iterations_to_keep);
        tracing::info!(
            team = %team,
            assigned = iterations.len(),
            to_unassign = stale.len(),
            "scanned team iterations"
        );
        plan.insert(team.as_str(), stale);
    }

    Ok(plan)
}
