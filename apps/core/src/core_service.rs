use std::collections::HashSet;

use crate::action_executor::{
    alt_tool_command, editor_command, local_path_from_uri, AltTool, CommandRunner,
    SystemCommandRunner, ALT_TOOL_TIMEOUT,
};
use crate::clipboard::{ClipboardProvider, SystemClipboard};
use crate::config::{validate, Config, ConfigError};
use crate::contract::{
    CoreRequest, CoreResponse, DeleteManyResponse, DeleteResponse, SearchResponse,
};
use crate::history_store::{self, StoreError};
use crate::host::Host;
use crate::model::basename;
use crate::query_dsl::{DispatchMode, ParsedQuery};
use crate::search::{self, DisplayItem, IconResolver, StaticIconResolver};

/// Extensions with a bundled icon; anything else falls back to the file icon.
pub const BUNDLED_ICON_EXTENSIONS: [&str; 12] = [
    "code-workspace",
    "c",
    "cpp",
    "go",
    "html",
    "js",
    "json",
    "md",
    "py",
    "rs",
    "ts",
    "txt",
];

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Launched,
    Removed,
    NotFound,
    Copied(String),
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub outcome: Outcome,
    /// Text the host should put back into the search box, if any.
    pub next_query: Option<String>,
}

impl Selection {
    fn done(outcome: Outcome) -> Self {
        Self {
            outcome,
            next_query: None,
        }
    }
}

pub struct CoreService {
    config: Config,
    host: Box<dyn Host>,
    runner: Box<dyn CommandRunner>,
    clipboard: Box<dyn ClipboardProvider>,
    icons: Box<dyn IconResolver>,
    last_mode: DispatchMode,
}

impl CoreService {
    pub fn new(config: Config, host: Box<dyn Host>) -> Result<Self, ServiceError> {
        validate(&config)?;
        Ok(Self {
            config,
            host,
            runner: Box::new(SystemCommandRunner),
            clipboard: Box::new(SystemClipboard),
            icons: Box::new(StaticIconResolver::new(BUNDLED_ICON_EXTENSIONS)),
            last_mode: DispatchMode::Open,
        })
    }

    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardProvider>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_icons(mut self, icons: Box<dyn IconResolver>) -> Self {
        self.icons = icons;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn last_mode(&self) -> DispatchMode {
        self.last_mode
    }

    pub fn search(&mut self, query: &str) -> Result<Vec<DisplayItem>, ServiceError> {
        let parsed = ParsedQuery::parse(query);
        self.last_mode = parsed.mode;
        let entries = history_store::load_entries(&self.config.database)?;
        Ok(search::search(&entries, &parsed, self.icons.as_ref()))
    }

    /// Acts on `item` using the mode captured when it was projected.
    pub fn select(&self, item: &DisplayItem) -> Selection {
        tracing::info!(mode = ?item.mode, path = %item.subtitle, "selection");
        match item.mode {
            DispatchMode::Open => {
                let command = editor_command(&self.config, &item.payload);
                self.launch(&command, self.config.effective_timeout())
            }
            DispatchMode::Remove => self.remove(item),
            DispatchMode::CopyPath => self.copy_path(item),
            DispatchMode::OpenAltToolA => {
                let command = alt_tool_command(&self.config, AltTool::DirectoryOpus, &item.subtitle);
                self.launch(&command, ALT_TOOL_TIMEOUT)
            }
            DispatchMode::OpenAltToolB => {
                let command = alt_tool_command(&self.config, AltTool::TotalCommander, &item.subtitle);
                self.launch(&command, ALT_TOOL_TIMEOUT)
            }
        }
    }

    pub fn delete_path(&self, path: &str) -> Result<bool, ServiceError> {
        Ok(history_store::delete_entry(&self.config.database, path)?)
    }

    pub fn delete_paths(&self, paths: &[String]) -> Result<usize, ServiceError> {
        let targets: HashSet<String> = paths.iter().cloned().collect();
        Ok(history_store::delete_entries(&self.config.database, &targets)?)
    }

    pub fn handle_command(&mut self, request: CoreRequest) -> Result<CoreResponse, ServiceError> {
        match request {
            CoreRequest::Search(request) => {
                let items = self.search(&request.query)?;
                Ok(CoreResponse::Search(SearchResponse {
                    mode: self.last_mode,
                    items,
                }))
            }
            CoreRequest::Select(request) => {
                if request.item.payload.trim().is_empty() {
                    return Err(ServiceError::InvalidRequest("item payload is empty".into()));
                }
                Ok(CoreResponse::Select(self.select(&request.item).into()))
            }
            CoreRequest::Delete(request) => {
                if request.path.trim().is_empty() {
                    return Err(ServiceError::InvalidRequest("path is empty".into()));
                }
                let removed = self.delete_path(&request.path)?;
                Ok(CoreResponse::Delete(DeleteResponse { removed }))
            }
            CoreRequest::DeleteMany(request) => {
                if request.paths.iter().any(|path| path.trim().is_empty()) {
                    return Err(ServiceError::InvalidRequest("paths contain an empty entry".into()));
                }
                let removed = self.delete_paths(&request.paths)?;
                Ok(CoreResponse::DeleteMany(DeleteManyResponse { removed }))
            }
        }
    }

    fn launch(&self, command: &str, timeout: std::time::Duration) -> Selection {
        match self.runner.run(command, timeout) {
            Ok(_) => {
                self.host.hide_window();
                Selection::done(Outcome::Launched)
            }
            Err(error) => {
                let message = error.to_string();
                self.host.notify(&message);
                Selection::done(Outcome::Failed(message))
            }
        }
    }

    fn remove(&self, item: &DisplayItem) -> Selection {
        let decoded = item.subtitle.as_str();
        if !self
            .host
            .confirm(&format!("确定要删除历史记录吗？\n\n{decoded}"))
        {
            return Selection::done(Outcome::Cancelled);
        }

        let name = basename(decoded);
        let outcome = match history_store::delete_entry(&self.config.database, &item.payload) {
            Ok(true) => {
                self.host.notify(&format!("已删除历史记录: {name}"));
                Outcome::Removed
            }
            Ok(false) => {
                self.host.notify(&format!("未找到要删除的记录: {name}"));
                Outcome::NotFound
            }
            Err(error) => {
                tracing::warn!(%error, path = %item.payload, "delete failed");
                let message = format!("删除失败: {error}");
                self.host.notify(&message);
                Outcome::Failed(message)
            }
        };

        Selection {
            outcome,
            next_query: sticky_query(item.mode),
        }
    }

    fn copy_path(&self, item: &DisplayItem) -> Selection {
        let path = local_path_from_uri(&item.subtitle);
        match self.clipboard.set_text(&path) {
            Ok(()) => {
                self.host.notify(&format!("已复制路径: {path}"));
                Selection::done(Outcome::Copied(path))
            }
            Err(error) => {
                let message = format!("复制失败: {error}");
                self.host.notify(&message);
                Selection::done(Outcome::Failed(message))
            }
        }
    }
}

fn sticky_query(mode: DispatchMode) -> Option<String> {
    if !mode.is_sticky() {
        return None;
    }
    mode.marker().map(str::to_string)
}
