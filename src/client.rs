//! HTTP client for the Azure DevOps REST API.
//!
//! [`WorkTracking`] is the seam the lifecycle is written against; [`AzdoClient`] is the
//! reqwest implementation. Authentication is HTTP basic with an empty user name and a
//! personal access token as the password.

use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;
use crate::paths;

/// REST API version sent with every request.
const API_VERSION: &str = "7.1";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: personal access token rejected")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Cannot build request URL from {0}")]
    InvalidUrl(String),
}

/// Remote operations needed to manage a team's sprint iterations.
///
/// Every call is a single round trip; implementations do no retrying or caching.
#[allow(async_fn_in_trait)]
pub trait WorkTracking {
    /// Handshake validating the account URI and the credential.
    async fn connect(&self) -> Result<ConnectionData, ClientError>;

    /// Node at `path` (relative to the group root) with children down to `depth` levels.
    async fn get_classification_node(
        &self,
        project: &str,
        group: TreeStructureGroup,
        path: &str,
        depth: u32,
    ) -> Result<ClassificationNode, ClientError>;

    /// Upserts `node` by name under `parent_path` (relative to the group root).
    async fn create_or_update_classification_node(
        &self,
        node: &NewClassificationNode,
        project: &str,
        group: TreeStructureGroup,
        parent_path: &str,
    ) -> Result<ClassificationNode, ClientError>;

    /// Iterations currently assigned to the team.
    async fn get_team_iterations(
        &self,
        team: &TeamContext,
    ) -> Result<Vec<TeamSettingsIteration>, ClientError>;

    /// Assigns an iteration to the team. Re-assigning is accepted by the service.
    async fn post_team_iteration(
        &self,
        iteration: &TeamIterationRef,
        team: &TeamContext,
    ) -> Result<TeamSettingsIteration, ClientError>;

    /// Removes an iteration from the team's settings.
    async fn delete_team_iteration(&self, team: &TeamContext, id: Uuid)
        -> Result<(), ClientError>;
}

/// reqwest-backed [`WorkTracking`] for an Azure DevOps organization.
#[derive(Clone)]
pub struct AzdoClient {
    account_uri: Url,
    pat: String,
    client: Client,
}

impl std::fmt::Debug for AzdoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzdoClient")
            .field("account_uri", &self.account_uri.as_str())
            .finish_non_exhaustive()
    }
}

impl AzdoClient {
    /// Create with an organization URI such as `https://dev.azure.com/fabrikam`.
    pub fn new(account_uri: Url, pat: impl Into<String>) -> Self {
        Self {
            account_uri,
            pat: pat.into(),
            client: Client::new(),
        }
    }

    pub fn account_uri(&self) -> &Url {
        &self.account_uri
    }

    /// Organization URI extended with `segments`, each percent-encoded.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ClientError> {
        let mut url = self.account_uri.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.account_uri.to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    fn classification_nodes_url(
        &self,
        project: &str,
        group: TreeStructureGroup,
        path: &str,
    ) -> Result<Url, ClientError> {
        self.url(
            [
                project,
                "_apis",
                "wit",
                "classificationnodes",
                group.as_str(),
            ]
            .into_iter()
            .chain(paths::segments(path)),
        )
    }

    fn team_iterations_url(
        &self,
        team: &TeamContext,
        id: Option<Uuid>,
    ) -> Result<Url, ClientError> {
        let id = id.map(|id| id.to_string());
        self.url(
            [
                team.project.as_str(),
                team.team.as_str(),
                "_apis",
                "work",
                "teamsettings",
                "iterations",
            ]
            .into_iter()
            .chain(id.as_deref()),
        )
    }

    /// Build a request with basic auth.
    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        tracing::debug!(%method, %url, "azure devops request");
        self.client
            .request(method, url)
            .basic_auth("", Some(&self.pat))
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        Ok(self.request(method, url).json(body).send().await?)
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Handle response that may return empty body (204 No Content).
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        tracing::debug!(%status, url = %response.url(), "azure devops response");
        // A rejected token gets the sign-in page with 203 rather than a 401.
        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            return Err(ClientError::Unauthorized);
        }
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
            StatusCode::CONFLICT => Err(ClientError::Conflict(body)),
            _ => Err(ClientError::Server(format!("{}: {}", status, body))),
        }
    }
}

impl WorkTracking for AzdoClient {
    async fn connect(&self) -> Result<ConnectionData, ClientError> {
        let url = self.url(["_apis", "connectionData"])?;
        let response = self.request(Method::GET, url).send().await?;
        self.handle_response(response).await
    }

    async fn get_classification_node(
        &self,
        project: &str,
        group: TreeStructureGroup,
        path: &str,
        depth: u32,
    ) -> Result<ClassificationNode, ClientError> {
        let mut url = self.classification_nodes_url(project, group, path)?;
        url.query_pairs_mut()
            .append_pair("$depth", &depth.to_string());
        let response = self.request(Method::GET, url).send().await?;
        self.handle_response(response).await
    }

    async fn create_or_update_classification_node(
        &self,
        node: &NewClassificationNode,
        project: &str,
        group: TreeStructureGroup,
        parent_path: &str,
    ) -> Result<ClassificationNode, ClientError> {
        let url = self.classification_nodes_url(project, group, parent_path)?;
        let response = self.send_json(Method::POST, url, node).await?;
        self.handle_response(response).await
    }

    async fn get_team_iterations(
        &self,
        team: &TeamContext,
    ) -> Result<Vec<TeamSettingsIteration>, ClientError> {
        let url = self.team_iterations_url(team, None)?;
        let response = self.request(Method::GET, url).send().await?;
        let list: ListResponse<TeamSettingsIteration> = self.handle_response(response).await?;
        Ok(list.value)
    }

    async fn post_team_iteration(
        &self,
        iteration: &TeamIterationRef,
        team: &TeamContext,
    ) -> Result<TeamSettingsIteration, ClientError> {
        let url = self.team_iterations_url(team, None)?;
        let response = self.send_json(Method::POST, url, iteration).await?;
        self.handle_response(response).await
    }

    async fn delete_team_iteration(
        &self,
        team: &TeamContext,
        id: Uuid,
    ) -> Result<(), ClientError> {
        let url = self.team_iterations_url(team, Some(id))?;
        let response = self.request(Method::DELETE, url).send().await?;
        self.handle_empty_response(response).await
    }
}
