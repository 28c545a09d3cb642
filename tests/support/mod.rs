//! In-memory stand-in for the Azure DevOps work tracking service.
//!
//! [`FakeService`] implements [`WorkTracking`] directly, and [`serve`] exposes the same state
//! over HTTP so [`AzdoClient`](iteration_keeper::client::AzdoClient) can be exercised end to end.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use iteration_keeper::client::{ClientError, WorkTracking};
use iteration_keeper::config::IterationConfig;
use iteration_keeper::models::*;
use iteration_keeper::paths;
use reqwest::Url;
use uuid::Uuid;

pub const PROJECT: &str = "Fabrikam";
pub const ROOT: &str = "Release";
pub const PAT: &str = "secret";
/// `Basic base64(":secret")`
pub const PAT_AUTHORIZATION: &str = "Basic OnNlY3JldA==";

/// A remote call as the service saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    GetNode { path: String, depth: u32 },
    CreateNode { name: String, parent: String },
    GetTeamIterations { team: String },
    PostTeamIteration { team: String, id: Uuid },
    DeleteTeamIteration { team: String, id: Uuid },
}

#[derive(Debug)]
pub enum FakeError {
    NotFound(String),
    Injected,
}

impl From<FakeError> for ClientError {
    fn from(e: FakeError) -> Self {
        match e {
            FakeError::NotFound(msg) => ClientError::NotFound(msg),
            FakeError::Injected => ClientError::Server("500: injected failure".to_string()),
        }
    }
}

impl IntoResponse for FakeError {
    fn into_response(self) -> Response {
        match self {
            FakeError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            FakeError::Injected => {
                (StatusCode::INTERNAL_SERVER_ERROR, "injected failure").into_response()
            }
        }
    }
}

struct StoredNode {
    id: i64,
    identifier: Uuid,
    name: String,
    path: String,
    attributes: Option<NodeAttributes>,
    children: Vec<String>,
}

type FailWhen = Arc<dyn Fn(&Call) -> bool + Send + Sync>;

struct FakeState {
    project: String,
    next_id: i64,
    nodes: BTreeMap<String, StoredNode>,
    by_identifier: HashMap<Uuid, String>,
    assignments: Vec<(String, Uuid)>,
    calls: Vec<Call>,
    fail_when: Option<FailWhen>,
    expected_authorization: Option<String>,
}

#[derive(Clone)]
pub struct FakeService {
    state: Arc<Mutex<FakeState>>,
}

impl FakeService {
    /// A project with an empty `\Release` root iteration.
    pub fn new() -> Self {
        let root = paths::group_root(PROJECT, TreeStructureGroup::Iterations);
        let mut state = FakeState {
            project: PROJECT.to_string(),
            next_id: 1,
            nodes: BTreeMap::new(),
            by_identifier: HashMap::new(),
            assignments: Vec::new(),
            calls: Vec::new(),
            fail_when: None,
            expected_authorization: None,
        };
        state.insert_node(&root, "Iteration", None);
        let fake = Self {
            state: Arc::new(Mutex::new(state)),
        };
        fake.add_node("", ROOT, None);
        fake
    }

    /// Requests without this exact `Authorization` header get the 203 sign-in page.
    pub fn require_authorization(&self, value: &str) {
        self.state.lock().unwrap().expected_authorization = Some(value.to_string());
    }

    /// Fails every call matching `predicate` with a server error.
    pub fn fail_when(&self, predicate: impl Fn(&Call) -> bool + Send + Sync + 'static) {
        self.state.lock().unwrap().fail_when = Some(Arc::new(predicate));
    }

    /// Adds a node under `parent` (relative to the iteration root) and returns its identifier.
    pub fn add_node(&self, parent: &str, name: &str, dates: Option<(NaiveDate, NaiveDate)>) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let parent = state.absolute(parent);
        let attributes = dates.map(|(start, finish)| NodeAttributes::spanning(start, finish));
        state.insert_child(&parent, name, attributes)
    }

    /// Adds a dated iteration under `parent` and assigns it to `team`.
    pub fn add_assigned(
        &self,
        team: &str,
        parent: &str,
        name: &str,
        start: NaiveDate,
        finish: NaiveDate,
    ) -> Uuid {
        let id = self.add_node(parent, name, Some((start, finish)));
        self.assign(team, id);
        id
    }

    /// Assigns without recording a call.
    pub fn assign(&self, team: &str, id: Uuid) {
        self.state
            .lock()
            .unwrap()
            .assignments
            .push((team.to_string(), id));
    }

    pub fn assignments(&self, team: &str) -> Vec<Uuid> {
        self.state
            .lock()
            .unwrap()
            .assignments
            .iter()
            .filter(|(t, _)| t == team)
            .map(|(_, id)| *id)
            .collect()
    }

    /// Names of the children of the node at `path` (relative to the iteration root).
    pub fn child_names(&self, path: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let path = state.absolute(path);
        state
            .nodes
            .get(&path)
            .map(|node| {
                node.children
                    .iter()
                    .map(|child| state.nodes[child].name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn node(&self, path: &str) -> Option<ClassificationNode> {
        let state = self.state.lock().unwrap();
        let path = state.absolute(path);
        state.nodes.get(&path).map(|_| state.render(&path, 0))
    }

    pub fn identifier(&self, path: &str) -> Option<Uuid> {
        self.node(path).map(|node| node.identifier)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    // ============================================================
    // Service operations shared by the trait impl and the router
    // ============================================================

    fn record(&self, call: Call) -> Result<std::sync::MutexGuard<'_, FakeState>, FakeError> {
        let mut state = self.state.lock().unwrap();
        let fail = state.fail_when.as_ref().is_some_and(|f| f(&call));
        state.calls.push(call);
        if fail {
            return Err(FakeError::Injected);
        }
        Ok(state)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let state = self.state.lock().unwrap();
        match &state.expected_authorization {
            Some(expected) => headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == expected),
            None => true,
        }
    }

    fn op_connect(&self) -> Result<ConnectionData, FakeError> {
        self.record(Call::Connect)?;
        Ok(ConnectionData {
            authenticated_user: Identity {
                id: Uuid::nil(),
                provider_display_name: Some("Build Agent".to_string()),
            },
            instance_id: None,
        })
    }

    fn op_get_node(&self, path: &str, depth: u32) -> Result<ClassificationNode, FakeError> {
        let state = self.record(Call::GetNode {
            path: paths::join(paths::segments(path)),
            depth,
        })?;
        let absolute = state.absolute(path);
        if !state.nodes.contains_key(&absolute) {
            return Err(FakeError::NotFound(format!("node {} does not exist", path)));
        }
        Ok(state.render(&absolute, depth))
    }

    fn op_create_node(
        &self,
        node: &NewClassificationNode,
        parent: &str,
    ) -> Result<ClassificationNode, FakeError> {
        let mut state = self.record(Call::CreateNode {
            name: node.name.clone(),
            parent: paths::join(paths::segments(parent)),
        })?;
        let parent_path = state.absolute(parent);
        if !state.nodes.contains_key(&parent_path) {
            return Err(FakeError::NotFound(format!("node {} does not exist", parent)));
        }
        let path = format!("{}{}{}", parent_path, paths::PATH_SEPARATOR, node.name);
        match state.nodes.get_mut(&path) {
            Some(existing) => existing.attributes = node.attributes.clone(),
            None => {
                state.insert_child(&parent_path, &node.name, node.attributes.clone());
            }
        }
        Ok(state.render(&path, 0))
    }

    fn op_team_iterations(&self, team: &str) -> Result<Vec<TeamSettingsIteration>, FakeError> {
        let state = self.record(Call::GetTeamIterations {
            team: team.to_string(),
        })?;
        Ok(state
            .assignments
            .iter()
            .filter(|(t, _)| t == team)
            .filter_map(|(_, id)| state.team_iteration(*id))
            .collect())
    }

    fn op_post_team_iteration(
        &self,
        team: &str,
        iteration: TeamIterationRef,
    ) -> Result<TeamSettingsIteration, FakeError> {
        let mut state = self.record(Call::PostTeamIteration {
            team: team.to_string(),
            id: iteration.id,
        })?;
        let assigned = state
            .team_iteration(iteration.id)
            .ok_or_else(|| FakeError::NotFound(format!("iteration {} does not exist", iteration.id)))?;
        let entry = (team.to_string(), iteration.id);
        if !state.assignments.contains(&entry) {
            state.assignments.push(entry);
        }
        Ok(assigned)
    }

    fn op_delete_team_iteration(&self, team: &str, id: Uuid) -> Result<(), FakeError> {
        let mut state = self.record(Call::DeleteTeamIteration {
            team: team.to_string(),
            id,
        })?;
        let before = state.assignments.len();
        state.assignments.retain(|(t, i)| !(t == team && *i == id));
        if state.assignments.len() == before {
            return Err(FakeError::NotFound(format!(
                "iteration {} is not assigned to {}",
                id, team
            )));
        }
        Ok(())
    }
}

impl FakeState {
    /// Absolute path of a path relative to the iteration root.
    fn absolute(&self, relative: &str) -> String {
        let root = paths::group_root(&self.project, TreeStructureGroup::Iterations);
        paths::join(paths::segments(&root).chain(paths::segments(relative)))
    }

    fn insert_node(&mut self, path: &str, name: &str, attributes: Option<NodeAttributes>) -> Uuid {
        let identifier = Uuid::new_v4();
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            path.to_string(),
            StoredNode {
                id,
                identifier,
                name: name.to_string(),
                path: path.to_string(),
                attributes,
                children: Vec::new(),
            },
        );
        self.by_identifier.insert(identifier, path.to_string());
        identifier
    }

    fn insert_child(&mut self, parent: &str, name: &str, attributes: Option<NodeAttributes>) -> Uuid {
        let path = format!("{}{}{}", parent, paths::PATH_SEPARATOR, name);
        let identifier = self.insert_node(&path, name, attributes);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(path);
        }
        identifier
    }

    fn render(&self, path: &str, depth: u32) -> ClassificationNode {
        let node = &self.nodes[path];
        let children = (depth > 0 && !node.children.is_empty()).then(|| {
            node.children
                .iter()
                .map(|child| self.render(child, depth - 1))
                .collect()
        });
        ClassificationNode {
            id: node.id,
            identifier: node.identifier,
            name: node.name.clone(),
            structure_type: TreeNodeStructureType::Iteration,
            path: node.path.clone(),
            has_children: !node.children.is_empty(),
            attributes: node.attributes.clone(),
            children,
        }
    }

    /// The node as team settings report it: `Fabrikam\Release\2024\2024-01`.
    fn team_iteration(&self, id: Uuid) -> Option<TeamSettingsIteration> {
        let node = &self.nodes[self.by_identifier.get(&id)?];
        let path = paths::segments(&node.path)
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, s)| s)
            .collect::<Vec<_>>()
            .join("\\");
        let attributes = node.attributes.clone().unwrap_or_default();
        Some(TeamSettingsIteration {
            id,
            name: node.name.clone(),
            path,
            attributes: TeamIterationAttributes {
                start_date: attributes.start_date,
                finish_date: attributes.finish_date,
                time_frame: None,
            },
        })
    }
}

impl WorkTracking for FakeService {
    async fn connect(&self) -> Result<ConnectionData, ClientError> {
        Ok(self.op_connect()?)
    }

    async fn get_classification_node(
        &self,
        project: &str,
        _group: TreeStructureGroup,
        path: &str,
        depth: u32,
    ) -> Result<ClassificationNode, ClientError> {
        assert_eq!(project, PROJECT);
        Ok(self.op_get_node(path, depth)?)
    }

    async fn create_or_update_classification_node(
        &self,
        node: &NewClassificationNode,
        project: &str,
        _group: TreeStructureGroup,
        parent_path: &str,
    ) -> Result<ClassificationNode, ClientError> {
        assert_eq!(project, PROJECT);
        Ok(self.op_create_node(node, parent_path)?)
    }

    async fn get_team_iterations(
        &self,
        team: &TeamContext,
    ) -> Result<Vec<TeamSettingsIteration>, ClientError> {
        Ok(self.op_team_iterations(&team.team)?)
    }

    async fn post_team_iteration(
        &self,
        iteration: &TeamIterationRef,
        team: &TeamContext,
    ) -> Result<TeamSettingsIteration, ClientError> {
        Ok(self.op_post_team_iteration(&team.team, *iteration)?)
    }

    async fn delete_team_iteration(
        &self,
        team: &TeamContext,
        id: Uuid,
    ) -> Result<(), ClientError> {
        Ok(self.op_delete_team_iteration(&team.team, id)?)
    }
}

// ============================================================
// HTTP surface
// ============================================================

fn sign_in_page() -> Response {
    (
        StatusCode::NON_AUTHORITATIVE_INFORMATION,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><title>Azure DevOps Services | Sign In</title></html>",
    )
        .into_response()
}

macro_rules! authorize {
    ($fake:expr, $headers:expr) => {
        if !$fake.authorized(&$headers) {
            return sign_in_page();
        }
    };
}

fn respond<T: serde::Serialize>(result: Result<T, FakeError>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn connection_data(State(fake): State<FakeService>, headers: HeaderMap) -> Response {
    authorize!(fake, headers);
    respond(fake.op_connect())
}

async fn get_group_root(
    State(fake): State<FakeService>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    authorize!(fake, headers);
    respond(fake.op_get_node("", depth(&query)))
}

async fn get_node(
    State(fake): State<FakeService>,
    headers: HeaderMap,
    Path((_org, _project, _group, path)): Path<(String, String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    authorize!(fake, headers);
    respond(fake.op_get_node(&path, depth(&query)))
}

async fn create_under_group_root(
    State(fake): State<FakeService>,
    headers: HeaderMap,
    Json(node): Json<NewClassificationNode>,
) -> Response {
    authorize!(fake, headers);
    respond(fake.op_create_node(&node, ""))
}

async fn create_node(
    State(fake): State<FakeService>,
    headers: HeaderMap,
    Path((_org, _project, _group, path)): Path<(String, String, String, String)>,
    Json(node): Json<NewClassificationNode>,
) -> Response {
    authorize!(fake, headers);
    respond(fake.op_create_node(&node, &path))
}

async fn team_iterations(
    State(fake): State<FakeService>,
    headers: HeaderMap,
    Path((_org, _project, team)): Path<(String, String, String)>,
) -> Response {
    authorize!(fake, headers);
    respond(fake.op_team_iterations(&team).map(ListResponse::new))
}

async fn assign_iteration(
    State(fake): State<FakeService>,
    headers: HeaderMap,
    Path((_org, _project, team)): Path<(String, String, String)>,
    Json(iteration): Json<TeamIterationRef>,
) -> Response {
    authorize!(fake, headers);
    respond(fake.op_post_team_iteration(&team, iteration))
}

async fn unassign_iteration(
    State(fake): State<FakeService>,
    headers: HeaderMap,
    Path((_org, _project, team, id)): Path<(String, String, String, Uuid)>,
) -> Response {
    authorize!(fake, headers);
    match fake.op_delete_team_iteration(&team, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

fn depth(query: &HashMap<String, String>) -> u32 {
    query
        .get("$depth")
        .and_then(|d| d.parse().ok())
        .unwrap_or(0)
}

pub fn router(fake: FakeService) -> Router {
    Router::new()
        .route("/{org}/_apis/connectionData", get(connection_data))
        .route(
            "/{org}/{project}/_apis/wit/classificationnodes/{group}",
            get(get_group_root).post(create_under_group_root),
        )
        .route(
            "/{org}/{project}/_apis/wit/classificationnodes/{group}/{*path}",
            get(get_node).post(create_node),
        )
        .route(
            "/{org}/{project}/{team}/_apis/work/teamsettings/iterations",
            get(team_iterations).post(assign_iteration),
        )
        .route(
            "/{org}/{project}/{team}/_apis/work/teamsettings/iterations/{id}",
            delete(unassign_iteration),
        )
        .with_state(fake)
}

/// Serves `fake` on an ephemeral port and returns the organization URI to point a client at.
pub async fn serve(fake: FakeService) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake service");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router(fake))
            .await
            .expect("Fake service stopped");
    });
    Url::parse(&format!("http://{}/fabrikam", addr)).expect("Invalid fake service URI")
}

// ============================================================
// Fixtures
// ============================================================

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("invalid date")
}

pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).expect("invalid time").and_utc()
}

/// Config for year 2024 under `Fabrikam\Release` with the given teams.
pub fn config(teams: &[&str]) -> IterationConfig {
    config_for(Url::parse("https://dev.azure.com/fabrikam").unwrap(), teams)
}

pub fn config_for(account_uri: Url, teams: &[&str]) -> IterationConfig {
    IterationConfig::new(
        PAT,
        account_uri,
        2024,
        teams.iter().map(|t| t.to_string()).collect(),
        PROJECT,
        ROOT,
    )
}
