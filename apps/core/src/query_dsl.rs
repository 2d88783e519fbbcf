use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    Open,
    Remove,
    CopyPath,
    /// Directory Opus.
    OpenAltToolA,
    /// Total Commander.
    OpenAltToolB,
}

/// Marker scan order; the first marker found wins.
const MARKER_PRIORITY: [DispatchMode; 4] = [
    DispatchMode::Remove,
    DispatchMode::CopyPath,
    DispatchMode::OpenAltToolA,
    DispatchMode::OpenAltToolB,
];

impl DispatchMode {
    pub fn marker(self) -> Option<&'static str> {
        match self {
            Self::Open => None,
            Self::Remove => Some("-rm"),
            Self::CopyPath => Some("-cp"),
            Self::OpenAltToolA => Some("-do"),
            Self::OpenAltToolB => Some("-tc"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "打开",
            Self::Remove => "删除",
            Self::CopyPath => "复制路径",
            Self::OpenAltToolA => "Opus打开",
            Self::OpenAltToolB => "TC打开",
        }
    }

    /// Sticky modes re-insert their marker into the next query after an action.
    pub fn is_sticky(self) -> bool {
        matches!(self, Self::Remove)
    }

    pub fn detect(query: &str) -> Self {
        MARKER_PRIORITY
            .into_iter()
            .find(|mode| mode.marker().is_some_and(|marker| query.contains(marker)))
            .unwrap_or(Self::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub raw: String,
    pub mode: DispatchMode,
    /// Query with every occurrence of the active marker removed, trimmed.
    pub text: String,
    pub keywords: Vec<String>,
}

impl ParsedQuery {
    pub fn parse(query: &str) -> Self {
        let mode = DispatchMode::detect(query);
        let text = match mode.marker() {
            Some(marker) => query.replace(marker, "").trim().to_string(),
            None => query.trim().to_string(),
        };
        let keywords = text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        Self {
            raw: query.to_string(),
            mode,
            text,
            keywords,
        }
    }
}
