use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the remote service should execute the prompt or only plan it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    #[default]
    Run,
    Plan,
}

impl RunType {
    pub fn toggled(self) -> Self {
        match self {
            RunType::Run => RunType::Plan,
            RunType::Plan => RunType::Run,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunType::Run => "run",
            RunType::Plan => "plan",
        }
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload handed to the remote service.
///
/// Config files deserialize straight into this type, so every field is
/// optional on the wire. `content_hash` and `force` never come from a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "repo")]
    pub repository: String,
    #[serde(alias = "sourceBranch", alias = "source_branch")]
    pub source: String,
    #[serde(alias = "targetBranch", alias = "target_branch")]
    pub target: String,
    pub title: String,
    pub issue: String,
    pub prompt: String,
    pub context: String,
    pub run_type: RunType,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(skip_deserializing, skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,
}

/// A run accepted by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Run {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: None,
            title: None,
        }
    }
}

/// What the form persistence store keeps between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormSnapshot {
    pub repository: String,
    pub source: String,
    pub target: String,
    pub title: String,
    pub issue: String,
    pub prompt: String,
    pub context: String,
    pub run_type: RunType,
}

impl FormSnapshot {
    pub fn is_empty(&self) -> bool {
        [
            &self.repository,
            &self.source,
            &self.target,
            &self.title,
            &self.issue,
            &self.prompt,
            &self.context,
        ]
        .iter()
        .all(|value| value.is_empty())
            && self.run_type == RunType::default()
    }
}

impl From<&FormSnapshot> for Task {
    fn from(snapshot: &FormSnapshot) -> Self {
        Task {
            repository: snapshot.repository.clone(),
            source: snapshot.source.clone(),
            target: snapshot.target.clone(),
            title: snapshot.title.clone(),
            issue: snapshot.issue.clone(),
            prompt: snapshot.prompt.clone(),
            context: snapshot.context.clone(),
            run_type: snapshot.run_type,
            content_hash: None,
            force: false,
        }
    }
}
