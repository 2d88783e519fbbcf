use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The persisted `history.recentlyOpenedPathsList` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBlob {
    pub entries: Vec<Entry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryBlob {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            extra: Map::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRef {
    pub id: String,
    pub config_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTarget {
    File(String),
    Folder(String),
    Workspace(WorkspaceRef),
    /// Bare URI string written by older editor releases.
    Legacy(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct Entry {
    pub target: EntryTarget,
    pub label: Option<String>,
    pub remote_authority: Option<String>,
    /// Fields this crate does not interpret, written back untouched.
    pub extra: Map<String, Value>,
}

impl Entry {
    pub fn new(target: EntryTarget) -> Self {
        Self {
            target,
            label: None,
            remote_authority: None,
            extra: Map::new(),
        }
    }

    pub fn file(uri: &str) -> Self {
        Self::new(EntryTarget::File(uri.to_string()))
    }

    pub fn folder(uri: &str) -> Self {
        Self::new(EntryTarget::Folder(uri.to_string()))
    }

    pub fn workspace(id: &str, config_path: &str) -> Self {
        Self::new(EntryTarget::Workspace(WorkspaceRef {
            id: id.to_string(),
            config_path: config_path.to_string(),
        }))
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_remote_authority(mut self, authority: &str) -> Self {
        self.remote_authority = Some(authority.to_string());
        self
    }

    /// Identity key: `fileUri`, else `folderUri`, else `workspace.configPath`.
    pub fn canonical_path(&self) -> &str {
        match &self.target {
            EntryTarget::File(uri) | EntryTarget::Folder(uri) | EntryTarget::Legacy(uri) => uri,
            EntryTarget::Workspace(workspace) => &workspace.config_path,
        }
    }

    pub fn decoded_path(&self) -> String {
        decode_uri(self.canonical_path())
    }

    pub fn is_remote(&self) -> bool {
        self.remote_authority.is_some() || self.decoded_path().contains("remote")
    }
}

pub fn decode_uri(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

pub fn normalize_for_search(input: &str) -> String {
    decode_uri(input).to_lowercase()
}

/// Last path segment, ignoring trailing separators.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
}

/// Lower-cased extension of the last segment without the dot. Dotfiles have none.
pub fn extension(path: &str) -> Option<String> {
    let name = basename(path);
    let dot = name.rfind('.')?;
    if dot == 0 || dot + 1 == name.len() {
        return None;
    }
    Some(name[dot + 1..].to_lowercase())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Bare(String),
    Record(RawRecord),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    folder_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    workspace: Option<WorkspaceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_authority: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawEntry> for Entry {
    type Error = String;

    fn try_from(value: RawEntry) -> Result<Self, Self::Error> {
        let record = match value {
            RawEntry::Bare(uri) => return Ok(Entry::new(EntryTarget::Legacy(uri))),
            RawEntry::Record(record) => record,
        };

        let RawRecord {
            file_uri,
            folder_uri,
            workspace,
            label,
            remote_authority,
            mut extra,
        } = record;

        // Lower-priority targets are kept verbatim so the entry round-trips.
        let target = match (file_uri, folder_uri, workspace) {
            (Some(file), folder, workspace) => {
                if let Some(folder) = folder {
                    extra.insert("folderUri".to_string(), Value::String(folder));
                }
                if let Some(workspace) = workspace {
                    extra.insert("workspace".to_string(), workspace_value(&workspace));
                }
                EntryTarget::File(file)
            }
            (None, Some(folder), workspace) => {
                if let Some(workspace) = workspace {
                    extra.insert("workspace".to_string(), workspace_value(&workspace));
                }
                EntryTarget::Folder(folder)
            }
            (None, None, Some(workspace)) => EntryTarget::Workspace(workspace),
            (None, None, None) => {
                return Err("history entry has no fileUri, folderUri or workspace".to_string())
            }
        };

        Ok(Entry {
            target,
            label,
            remote_authority,
            extra,
        })
    }
}

impl From<Entry> for RawEntry {
    fn from(value: Entry) -> Self {
        let mut record = RawRecord {
            label: value.label,
            remote_authority: value.remote_authority,
            extra: value.extra,
            ..RawRecord::default()
        };
        match value.target {
            EntryTarget::Legacy(uri) => return RawEntry::Bare(uri),
            EntryTarget::File(uri) => record.file_uri = Some(uri),
            EntryTarget::Folder(uri) => record.folder_uri = Some(uri),
            EntryTarget::Workspace(workspace) => record.workspace = Some(workspace),
        }
        RawEntry::Record(record)
    }
}

fn workspace_value(workspace: &WorkspaceRef) -> Value {
    json!({ "id": workspace.id, "configPath": workspace.config_path })
}

#[cfg(test)]
mod tests {
    use super::{basename, extension, Entry, EntryTarget, HistoryBlob};

    #[test]
    fn canonical_path_follows_variant_priority() {
        let blob = HistoryBlob::from_json(
            r#"{"entries":[
                {"fileUri":"file:///a/x.rs","folderUri":"file:///a"},
                {"folderUri":"file:///b"},
                {"workspace":{"id":"w1","configPath":"file:///c/w.code-workspace"}},
                "file:///legacy"
            ]}"#,
        )
        .unwrap();

        let paths: Vec<&str> = blob.entries.iter().map(Entry::canonical_path).collect();
        assert_eq!(
            paths,
            vec![
                "file:///a/x.rs",
                "file:///b",
                "file:///c/w.code-workspace",
                "file:///legacy"
            ]
        );
        assert!(matches!(blob.entries[3].target, EntryTarget::Legacy(_)));
    }

    #[test]
    fn untouched_entries_round_trip_with_unknown_fields() {
        let raw = r#"{"entries":[
            {"fileUri":"file:///a/x.rs","folderUri":"file:///a","custom":1},
            {"workspace":{"id":"w1","configPath":"file:///c/w.code-workspace"},"label":"W","remoteAuthority":"ssh-remote+box"},
            "file:///legacy"
        ],"version":2}"#;
        let blob = HistoryBlob::from_json(raw).unwrap();
        let again = HistoryBlob::from_json(&blob.to_json().unwrap()).unwrap();

        assert_eq!(blob, again);
        let original: serde_json::Value = serde_json::from_str(raw).unwrap();
        let encoded: serde_json::Value = serde_json::from_str(&blob.to_json().unwrap()).unwrap();
        assert_eq!(original, encoded);
    }

    #[test]
    fn rejects_entry_without_target() {
        assert!(HistoryBlob::from_json(r#"{"entries":[{"label":"x"}]}"#).is_err());
        assert!(HistoryBlob::from_json(r#"{"items":[]}"#).is_err());
    }

    #[test]
    fn decodes_percent_encoded_paths() {
        let entry = Entry::folder("file:///c%3A/My%20Projects/%E4%B8%AD");
        assert_eq!(entry.decoded_path(), "file:///c:/My Projects/中");
    }

    #[test]
    fn basename_and_extension_match_path_semantics() {
        assert_eq!(basename("file:///Users/a/ProjA"), "ProjA");
        assert_eq!(basename("file:///Users/a/ProjA/"), "ProjA");
        assert_eq!(extension("file:///Users/a/b.code-workspace").as_deref(), Some("code-workspace"));
        assert_eq!(extension("file:///Users/a/Main.RS").as_deref(), Some("rs"));
        assert_eq!(extension("file:///Users/a/.bashrc"), None);
        assert_eq!(extension("file:///Users/a/ProjA"), None);
    }

    #[test]
    fn remote_entries_are_detected() {
        assert!(Entry::folder("vscode-remote://ssh-remote%2Bbox/home").is_remote());
        assert!(Entry::folder("file:///x").with_remote_authority("wsl+Ubuntu").is_remote());
        assert!(!Entry::folder("file:///x").is_remote());
    }
}
