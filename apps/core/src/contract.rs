use serde::{Deserialize, Serialize};

use crate::core_service::{Outcome, Selection};
use crate::query_dsl::DispatchMode;
use crate::search::DisplayItem;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    pub mode: DispatchMode,
    pub items: Vec<DisplayItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectRequest {
    pub item: DisplayItem,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Launched,
    Removed,
    NotFound,
    Copied,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectResponse {
    pub outcome: OutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteManyRequest {
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteManyResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreRequest {
    Search(SearchRequest),
    Select(SelectRequest),
    Delete(DeleteRequest),
    DeleteMany(DeleteManyRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreResponse {
    Search(SearchResponse),
    Select(SelectResponse),
    Delete(DeleteResponse),
    DeleteMany(DeleteManyResponse),
}

impl From<Selection> for SelectResponse {
    fn from(value: Selection) -> Self {
        let (outcome, message) = match value.outcome {
            Outcome::Launched => (OutcomeKind::Launched, None),
            Outcome::Removed => (OutcomeKind::Removed, None),
            Outcome::NotFound => (OutcomeKind::NotFound, None),
            Outcome::Copied(text) => (OutcomeKind::Copied, Some(text)),
            Outcome::Cancelled => (OutcomeKind::Cancelled, None),
            Outcome::Failed(message) => (OutcomeKind::Failed, Some(message)),
        };
        Self {
            outcome,
            message,
            next_query: value.next_query,
        }
    }
}
