//! Entry resolution.
//!
//! Turns a [`Store`] and a [`SelectionCriterion`] into the server records to
//! offer. Records keep database order; nothing is sorted.
//!
//! - [`SelectionCriterion::All`]: every entry with a non-empty URL
//! - [`SelectionCriterion::RootOnly`]: entries held directly by the root group
//! - [`SelectionCriterion::GroupPath`]: entries held directly by that group
//! - [`SelectionCriterion::TitleContains`]: entries with a URL whose title
//!   contains the text, ignoring case; a single hit needs no prompt

use crate::config::SelectionCriterion;
use crate::error::{KeepassSshError, Result};
use crate::server::ServerRecord;
use crate::store::{RawEntry, Store};

/// Outcome of resolving a criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exactly one title matched; connect without asking.
    Resolved(ServerRecord),
    /// Let the user pick from these (never empty).
    Choose(Vec<ServerRecord>),
}

impl Resolution {
    /// All records carried by this resolution, in order.
    pub fn records(&self) -> &[ServerRecord] {
        match self {
            Resolution::Resolved(record) => std::slice::from_ref(record),
            Resolution::Choose(records) => records,
        }
    }
}

/// Resolve a criterion against the store.
///
/// # Errors
///
/// - [`KeepassSshError::GroupNotFound`] if a group path names no group
/// - [`KeepassSshError::NoMatch`] if nothing is left after filtering
/// - [`KeepassSshError::InvalidUrl`] if a selected entry has a bad port
pub fn resolve(store: &Store, criterion: &SelectionCriterion) -> Result<Resolution> {
    let mut records = candidate_records(store, criterion)?;
    tracing::debug!(%criterion, count = records.len(), "resolved entries");

    if records.is_empty() {
        let detail = match criterion {
            SelectionCriterion::TitleContains(text) => format!(" matching '{}'", text),
            SelectionCriterion::GroupPath(path) => format!(" in group '{}'", path),
            _ => String::new(),
        };
        return Err(KeepassSshError::NoMatch(detail));
    }

    if matches!(criterion, SelectionCriterion::TitleContains(_)) && records.len() == 1 {
        return Ok(Resolution::Resolved(records.remove(0)));
    }
    Ok(Resolution::Choose(records))
}

/// Entries selected by the criterion, normalized into records.
pub fn candidate_records(
    store: &Store,
    criterion: &SelectionCriterion,
) -> Result<Vec<ServerRecord>> {
    match criterion {
        SelectionCriterion::All => to_records(store.all_entries().iter().filter(|e| has_url(e))),
        SelectionCriterion::RootOnly => {
            let root = store.root_group();
            to_records(
                store
                    .all_entries()
                    .iter()
                    .filter(|e| e.group() == Some(root)),
            )
        }
        SelectionCriterion::GroupPath(path) => {
            let group = store
                .find_group(path)
                .ok_or_else(|| KeepassSshError::GroupNotFound(path.clone()))?;
            to_records(group.entries())
        }
        SelectionCriterion::TitleContains(text) => {
            let needle = text.to_lowercase();
            to_records(
                store
                    .all_entries()
                    .iter()
                    .filter(|e| has_url(e) && e.title().to_lowercase().contains(&needle)),
            )
        }
    }
}

fn has_url(entry: &RawEntry) -> bool {
    !entry.url().is_empty()
}

fn to_records<'a>(entries: impl Iterator<Item = &'a RawEntry>) -> Result<Vec<ServerRecord>> {
    entries.map(ServerRecord::from_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        let mut store = Store::new("Root");
        let root = store.root_group();
        store.add_entry(root, RawEntry::new("db1", "admin", "pw", "10.0.0.1:2222", ""));
        store.add_entry(root, RawEntry::new("no-url", "admin", "pw", "", ""));
        let servers = store.add_group(root, "Servers");
        let web = store.add_group(servers, "Web");
        store.add_entry(web, RawEntry::new("Web-Prod", "deploy", "pw", "web.prod", "nginx"));
        store.add_entry(web, RawEntry::new("web-staging", "deploy", "pw", "web.stg:2200", ""));
        store
    }

    fn titles(records: &[ServerRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_all_skips_entries_without_url() {
        let records = candidate_records(&store(), &SelectionCriterion::All).unwrap();
        assert_eq!(titles(&records), ["db1", "Web-Prod", "web-staging"]);
    }

    #[test]
    fn test_root_only() {
        let records = candidate_records(&store(), &SelectionCriterion::RootOnly).unwrap();
        assert_eq!(titles(&records), ["db1", "no-url"]);
    }

    #[test]
    fn test_group_path() {
        let criterion = SelectionCriterion::GroupPath("/Servers/Web".into());
        let records = candidate_records(&store(), &criterion).unwrap();
        assert_eq!(titles(&records), ["Web-Prod", "web-staging"]);
        assert_eq!(records[1].hostname, "web.stg");
        assert_eq!(records[1].port, 2200);
    }

    #[test]
    fn test_group_not_found() {
        let criterion = SelectionCriterion::GroupPath("Staging/Web".into());
        let err = resolve(&store(), &criterion).unwrap_err();
        assert!(matches!(err, KeepassSshError::GroupNotFound(ref p) if p == "Staging/Web"));
    }

    #[test]
    fn test_single_entry_scenario() {
        let mut store = Store::new("Root");
        let root = store.root_group();
        store.add_entry(root, RawEntry::new("db1", "admin", "pw", "10.0.0.1:2222", ""));

        let resolution = resolve(&store, &SelectionCriterion::All).unwrap();
        let Resolution::Choose(records) = resolution else {
            panic!("non-title criteria always go through the selector");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hostname, "10.0.0.1");
        assert_eq!(records[0].port, 2222);
    }

    #[test]
    fn test_empty_store_is_no_match() {
        let store = Store::new("Root");
        for criterion in [
            SelectionCriterion::All,
            SelectionCriterion::RootOnly,
            SelectionCriterion::TitleContains("x".into()),
        ] {
            let err = resolve(&store, &criterion).unwrap_err();
            assert!(matches!(err, KeepassSshError::NoMatch(_)));
        }
    }

    #[test]
    fn test_title_single_match_resolves() {
        let resolution =
            resolve(&store(), &SelectionCriterion::TitleContains("PROD".into())).unwrap();
        assert!(matches!(resolution, Resolution::Resolved(ref r) if r.title == "Web-Prod"));
    }

    #[test]
    fn test_title_multiple_matches_restrict_choice() {
        let resolution = resolve(&store(), &SelectionCriterion::TitleContains("web".into())).unwrap();
        let Resolution::Choose(records) = resolution else {
            panic!("expected a choice between matches");
        };
        assert_eq!(titles(&records), ["Web-Prod", "web-staging"]);
    }

    #[test]
    fn test_title_no_match() {
        let err = resolve(&store(), &SelectionCriterion::TitleContains("mail".into())).unwrap_err();
        assert!(matches!(err, KeepassSshError::NoMatch(_)));
    }

    #[test]
    fn test_invalid_port_is_fatal() {
        let mut store = Store::new("Root");
        let root = store.root_group();
        store.add_entry(root, RawEntry::new("bad", "u", "p", "host:ssh", ""));
        let err = resolve(&store, &SelectionCriterion::RootOnly).unwrap_err();
        assert!(matches!(err, KeepassSshError::InvalidUrl { .. }));
    }
}
