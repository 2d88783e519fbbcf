use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{basename, extension, normalize_for_search, Entry};
use crate::query_dsl::{DispatchMode, ParsedQuery};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IconKey {
    Remote,
    Extension(String),
    Folder,
}

impl IconKey {
    pub fn for_entry(entry: &Entry) -> Self {
        if entry.is_remote() {
            return Self::Remote;
        }
        match extension(&entry.decoded_path()) {
            Some(ext) => Self::Extension(ext),
            None => Self::Folder,
        }
    }
}

pub trait IconResolver {
    fn resolve(&self, key: &IconKey) -> String;
}

/// Maps a fixed set of bundled extension icons to `icon/<ext>.svg`.
#[derive(Debug, Clone, Default)]
pub struct StaticIconResolver {
    known_extensions: HashSet<String>,
}

impl StaticIconResolver {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            known_extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }
}

impl IconResolver for StaticIconResolver {
    fn resolve(&self, key: &IconKey) -> String {
        match key {
            IconKey::Remote => "icon/remote.svg".to_string(),
            IconKey::Folder => "icon/folder.svg".to_string(),
            IconKey::Extension(ext) if self.known_extensions.contains(ext) => {
                format!("icon/{ext}.svg")
            }
            IconKey::Extension(_) => "icon/file.svg".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub title: String,
    /// Percent-decoded canonical path.
    pub subtitle: String,
    /// Raw canonical path, matched exactly against stored entries.
    pub payload: String,
    pub icon: String,
    /// Mode active when the item was projected; selection honours this one.
    pub mode: DispatchMode,
}

pub fn filter_entries<'a>(entries: &'a [Entry], keywords: &[String]) -> Vec<&'a Entry> {
    let needles: Vec<String> = keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect();

    entries
        .iter()
        .filter(|entry| {
            if needles.is_empty() {
                return true;
            }
            let haystack = normalize_for_search(entry.canonical_path());
            needles.iter().all(|needle| haystack.contains(needle.as_str()))
        })
        .collect()
}

pub fn project(entry: &Entry, mode: DispatchMode, icons: &dyn IconResolver) -> DisplayItem {
    let decoded = entry.decoded_path();
    DisplayItem {
        title: format!("{}: {}", mode.label(), basename(&decoded)),
        icon: icons.resolve(&IconKey::for_entry(entry)),
        payload: entry.canonical_path().to_string(),
        subtitle: decoded,
        mode,
    }
}

pub fn search(entries: &[Entry], query: &ParsedQuery, icons: &dyn IconResolver) -> Vec<DisplayItem> {
    filter_entries(entries, &query.keywords)
        .into_iter()
        .map(|entry| project(entry, query.mode, icons))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_entries, project, IconKey, IconResolver, StaticIconResolver};
    use crate::model::Entry;
    use crate::query_dsl::DispatchMode;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|word| word.to_string()).collect()
    }

    #[test]
    fn filter_is_conjunctive_and_case_insensitive() {
        let entries = vec![
            Entry::folder("file:///work/MyProjectA/x"),
            Entry::folder("file:///work/MyProjectB/x"),
        ];

        let hits = filter_entries(&entries, &keywords(&["proj", "A"]));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].canonical_path(), "file:///work/MyProjectA/x");
    }

    #[test]
    fn filter_matches_decoded_text() {
        let entries = vec![Entry::folder("file:///work/My%20Notes")];
        assert_eq!(filter_entries(&entries, &keywords(&["%20"])).len(), 0);
        assert_eq!(filter_entries(&entries, &keywords(&["my", "notes"])).len(), 1);
    }

    #[test]
    fn empty_keywords_keep_everything_in_order() {
        let entries = vec![Entry::folder("file:///b"), Entry::file("file:///a.rs")];
        let hits = filter_entries(&entries, &keywords(&["", "  "]));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].canonical_path(), "file:///b");
    }

    #[test]
    fn icon_keys_follow_extension_rules() {
        assert_eq!(IconKey::for_entry(&Entry::folder("file:///a/ProjA")), IconKey::Folder);
        assert_eq!(
            IconKey::for_entry(&Entry::file("file:///a/main.RS")),
            IconKey::Extension("rs".to_string())
        );
        assert_eq!(
            IconKey::for_entry(&Entry::folder("vscode-remote://ssh-remote%2Bhost/src")),
            IconKey::Remote
        );
    }

    #[test]
    fn static_resolver_falls_back_to_file_icon() {
        let icons = StaticIconResolver::new([".rs", "md"]);
        assert_eq!(icons.resolve(&IconKey::Extension("rs".into())), "icon/rs.svg");
        assert_eq!(icons.resolve(&IconKey::Extension("md".into())), "icon/md.svg");
        assert_eq!(icons.resolve(&IconKey::Extension("zip".into())), "icon/file.svg");
        assert_eq!(icons.resolve(&IconKey::Folder), "icon/folder.svg");
    }

    #[test]
    fn projection_carries_mode_label_and_raw_payload() {
        let icons = StaticIconResolver::default();
        let entry = Entry::folder("file:///Users/a/My%20Proj");
        let item = project(&entry, DispatchMode::Remove, &icons);

        assert_eq!(item.title, "删除: My Proj");
        assert_eq!(item.subtitle, "file:///Users/a/My Proj");
        assert_eq!(item.payload, "file:///Users/a/My%20Proj");
        assert_eq!(item.icon, "icon/folder.svg");
        assert_eq!(item.mode, DispatchMode::Remove);
    }
}
