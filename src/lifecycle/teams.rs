//! Attaches new iterations to teams and detaches retired ones.

use super::retention::RetentionPlan;
use super::synthesize::SprintSynthesizer;
use super::Phase;
use crate::client::{ClientError, WorkTracking};
use crate::config::IterationConfig;
use crate::models::{ClassificationNode, TeamContext, TeamIterationRef};

/// Pulls every new iteration out of `synthesizer` and assigns it to each configured team.
///
/// Assignment of an iteration starts as soon as it is created. Teams are visited in configured
/// order, duplicates included. Returns the created iterations in creation order.
pub async fn assign_iterations<C: WorkTracking>(
    client: &C,
    config: &IterationConfig,
    synthesizer: &mut SprintSynthesizer<'_, C>,
) -> Result<Vec<ClassificationNode>, ClientError> {
    tracing::info!(
        pending = synthesizer.remaining(),
        "assigning created iterations to the teams"
    );
    let mut created = Vec::new();

    while let Some(iteration) = synthesizer.next().await? {
        let reference = TeamIterationRef {
            id: iteration.identifier,
        };
        for team in &config.teams {
            let context = TeamContext::new(&config.project, team);
            client.post_team_iteration(&reference, &context).await?;
            tracing::info!(iteration = %iteration.name, team = %team, "assigned iteration");
        }
        created.push(iteration);
    }

    Ok(created)
}

/// Removes the iterations listed in `plan` from their teams, in plan order.
///
/// Returns the number of delete calls issued.
#[tracing::instrument(skip_all, fields(phase = %Phase::Unassign))]
pub async fn unassign_iterations<C: WorkTracking>(
    client: &C,
    config: &IterationConfig,
    plan: &RetentionPlan,
) -> Result<usize, ClientError> {
    let mut removed = 0;

    for (team, iterations) in plan.teams() {
        let context = TeamContext::new(&config.project, team);
        for id in iterations {
            client.delete_team_iteration(&context, *id).await?;
            tracing::info!(iteration = %id, team = %team, "unassigned iteration");
            removed += 1;
        }
    }

    Ok(removed)
}
