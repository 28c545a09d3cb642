use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A node of a project's classification tree.
///
/// Iteration nodes form a hierarchy rooted at `\{project}\Iteration`. This tool manages a
/// subtree below a configured root: one year bucket per year, each holding up to 26 sprints.
/// `children` is only populated down to the depth requested when the node was fetched; the
/// service omits it entirely for leaves, which [`ClassificationNode::children`] treats as empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationNode {
    pub id: i64,
    pub identifier: Uuid,
    pub name: String,
    pub structure_type: TreeNodeStructureType,
    /// Absolute path, e.g. `\Fabrikam\Iteration\Release\2024`.
    pub path: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<NodeAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ClassificationNode>>,
}

impl ClassificationNode {
    pub fn children(&self) -> &[ClassificationNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Direct child with exactly this name.
    pub fn child(&self, name: &str) -> Option<&ClassificationNode> {
        self.children().iter().find(|c| c.name == name)
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.attributes.as_ref().and_then(|a| a.start_date)
    }

    pub fn finish_date(&self) -> Option<DateTime<Utc>> {
        self.attributes.as_ref().and_then(|a| a.finish_date)
    }
}

/// Dated attributes of an iteration node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttributes {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish_date: Option<DateTime<Utc>>,
}

impl NodeAttributes {
    /// Attributes spanning whole days, both dates at midnight UTC.
    pub fn spanning(start: NaiveDate, finish: NaiveDate) -> Self {
        Self {
            start_date: Some(start.and_time(chrono::NaiveTime::MIN).and_utc()),
            finish_date: Some(finish.and_time(chrono::NaiveTime::MIN).and_utc()),
        }
    }
}

/// Body of a create-or-update call. The service upserts by name under the parent path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassificationNode {
    pub name: String,
    pub structure_type: TreeNodeStructureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<NodeAttributes>,
}

impl NewClassificationNode {
    /// An undated iteration, used for year buckets.
    pub fn iteration(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            structure_type: TreeNodeStructureType::Iteration,
            attributes: None,
        }
    }

    /// A dated iteration, used for sprints.
    pub fn dated_iteration(name: impl Into<String>, start: NaiveDate, finish: NaiveDate) -> Self {
        Self {
            name: name.into(),
            structure_type: TreeNodeStructureType::Iteration,
            attributes: Some(NodeAttributes::spanning(start, finish)),
        }
    }
}

/// Kind of a classification node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreeNodeStructureType {
    Area,
    Iteration,
}

/// Which classification tree of a project is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStructureGroup {
    Areas,
    Iterations,
}

impl TreeStructureGroup {
    /// URL segment naming the group.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Areas => "Areas",
            Self::Iterations => "Iterations",
        }
    }

    /// Name of the group's root node in absolute paths (`\{project}\Iteration`).
    pub fn root_segment(&self) -> &'static str {
        match self {
            Self::Areas => "Area",
            Self::Iterations => "Iteration",
        }
    }
}
