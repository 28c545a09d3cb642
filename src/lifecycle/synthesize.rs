//! Creates the sprint iterations of the configured year that do not exist yet.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::calendar::{self, SprintSlot};
use crate::client::{ClientError, WorkTracking};
use crate::config::IterationConfig;
use crate::models::{ClassificationNode, NewClassificationNode, TreeStructureGroup};
use crate::paths;

/// Depth fetched below the root iteration: year buckets and their sprints.
const ROOT_FETCH_DEPTH: u32 = 2;

/// Pull-based producer of newly created sprint iterations.
///
/// [`SprintSynthesizer::prepare`] resolves the year bucket and works out which slots are
/// missing without creating anything. Each call to [`SprintSynthesizer::next`] then creates the
/// next due slot and hands the resulting node back, so a consumer can act on every iteration as
/// soon as it exists. Slots are consumed as they are created; the sequence cannot be replayed.
pub struct SprintSynthesizer<'a, C> {
    client: &'a C,
    config: &'a IterationConfig,
    today: NaiveDate,
    year_path: String,
    pending: std::vec::IntoIter<SprintSlot>,
    skipped: Vec<String>,
}

impl<'a, C: WorkTracking> SprintSynthesizer<'a, C> {
    pub async fn prepare(
        client: &'a C,
        config: &'a IterationConfig,
        today: NaiveDate,
    ) -> Result<Self, ClientError> {
        let year = ensure_year_iteration(client, config).await?;

        tracing::info!(year = config.year, "retrieving sprint iterations of the year");
        let existing: HashSet<String> = year.children().iter().map(|c| c.name.clone()).collect();
        let missing = calendar::missing_slots(config.year, config.first_day_of_sprint, &existing);
        tracing::info!(
            year = config.year,
            existing = existing.len(),
            missing = missing.len(),
            "determined missing sprint iterations"
        );

        Ok(Self {
            client,
            config,
            today,
            year_path: paths::relative_path(&year.path, &config.project),
            pending: missing.into_iter(),
            skipped: Vec::new(),
        })
    }

    /// Creates the next missing sprint, or returns `None` once every slot has been handled.
    ///
    /// With `only_create_if_future`, slots that finished before today are skipped silently.
    pub async fn next(&mut self) -> Result<Option<ClassificationNode>, ClientError> {
        for slot in self.pending.by_ref() {
            if self.config.only_create_if_future && slot.is_past(self.today) {
                tracing::info!(iteration = %slot.name, finish = %slot.finish, "skipping past sprint iteration");
                self.skipped.push(slot.name);
                continue;
            }

            tracing::info!(
                iteration = %slot.name,
                start = %slot.start,
                finish = %slot.finish,
                "creating sprint iteration"
            );
            let node = NewClassificationNode::dated_iteration(slot.name, slot.start, slot.finish);
            let created = self
                .client
                .create_or_update_classification_node(
                    &node,
                    &self.config.project,
                    TreeStructureGroup::Iterations,
                    &self.year_path,
                )
                .await?;
            return Ok(Some(created));
        }
        Ok(None)
    }

    /// Names of the slots passed over because they lie in the past.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Slots not handled yet.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

/// Returns the year bucket under the root iteration, creating it when absent.
///
/// An existing bucket comes back with its sprint children; a new one has none.
pub async fn ensure_year_iteration<C: WorkTracking>(
    client: &C,
    config: &IterationConfig,
) -> Result<ClassificationNode, ClientError> {
    tracing::info!(root = %config.root_iteration_path, "retrieving root iteration");
    let root = client
        .get_classification_node(
            &config.project,
            TreeStructureGroup::Iterations,
            &config.root_iteration_path,
            ROOT_FETCH_DEPTH,
        )
        .await?;

    let year_name = config.year_name();
    if let Some(year) = root.child(&year_name) {
        tracing::info!(year = %year_name, "year iteration exists");
        return Ok(year.clone());
    }

    tracing::info!(year = %year_name, "year iteration missing, creating it");
    let root_path = paths::relative_path(&root.path, &config.project);
    client
        .create_or_update_classification_node(
            &NewClassificationNode::iteration(year_name),
            &config.project,
            TreeStructureGroup::Iterations,
            &root_path,
        )
        .await
}
