//! Password-database access.
//!
//! [`Store`] is a flattened, read-only snapshot of a KeePass database: every
//! group gets a [`GroupId`] and every entry is reduced to the handful of
//! fields a server record needs. Opening goes through the `keepass` crate;
//! tests build stores by hand with [`Store::new`], [`Store::add_group`] and
//! [`Store::add_entry`].

use crate::error::{KeepassSshError, Result};
use keepass::db::{Group as KdbxGroup, Node};
use keepass::{Database, DatabaseKey};
use std::fs::File;
use std::path::Path;

/// Identifier of a group inside a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// One credential record as read from the database.
#[derive(Clone, Default, PartialEq)]
pub struct RawEntry {
    title: String,
    username: String,
    password: String,
    url: String,
    notes: String,
    group: Option<GroupId>,
}

impl RawEntry {
    /// Create a detached entry; the group is assigned by [`Store::add_entry`].
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            username: username.into(),
            password: password.into(),
            url: url.into(),
            notes: notes.into(),
            group: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// The group holding this entry, `None` only for detached entries.
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }
}

impl std::fmt::Debug for RawEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawEntry")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .field("notes", &self.notes)
            .field("group", &self.group)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct GroupNode {
    name: String,
    parent: Option<GroupId>,
    entries: Vec<usize>,
}

/// Borrowed view of one group and its direct entries.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    store: &'a Store,
    id: GroupId,
}

impl<'a> Group<'a> {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.store.groups[self.id.0].name
    }

    /// Entries held directly by this group, in database order.
    pub fn entries(&self) -> impl Iterator<Item = &'a RawEntry> + 'a {
        let store = self.store;
        store.groups[self.id.0]
            .entries
            .iter()
            .map(move |&i| &store.entries[i])
    }
}

/// Flattened snapshot of a password database.
#[derive(Debug, Clone)]
pub struct Store {
    groups: Vec<GroupNode>,
    entries: Vec<RawEntry>,
}

impl Store {
    /// Create an empty store whose root group is called `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            groups: vec![GroupNode {
                name: root_name.into(),
                parent: None,
                entries: Vec::new(),
            }],
            entries: Vec::new(),
        }
    }

    /// Open a KDBX file with an optional key file and master password.
    ///
    /// # Errors
    ///
    /// Returns [`KeepassSshError::StoreOpen`] for a missing file, unreadable
    /// key file, wrong credentials or a corrupt database.
    pub fn open(path: &Path, key_path: Option<&Path>, password: Option<&str>) -> Result<Self> {
        let mut source = File::open(path).map_err(|e| {
            KeepassSshError::StoreOpen(format!(
                "Error opening KeePass database {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut key = DatabaseKey::new();
        if let Some(password) = password {
            key = key.with_password(password);
        }
        if let Some(key_path) = key_path {
            let key_error = |e: std::io::Error| {
                KeepassSshError::StoreOpen(format!(
                    "Error reading key file {}: {}",
                    key_path.display(),
                    e
                ))
            };
            let mut keyfile = File::open(key_path).map_err(key_error)?;
            key = key.with_keyfile(&mut keyfile).map_err(key_error)?;
        }

        let db = Database::open(&mut source, key).map_err(|e| {
            KeepassSshError::StoreOpen(format!("Error opening KeePass database: {}", e))
        })?;

        let store = Self::from_database(&db);
        tracing::debug!(
            path = %path.display(),
            groups = store.groups.len(),
            entries = store.entries.len(),
            "opened password database"
        );
        Ok(store)
    }

    /// Flatten a decrypted database, keeping its document order.
    pub fn from_database(db: &Database) -> Self {
        let mut store = Self::new(db.root.name.clone());
        store.copy_children(store.root_group(), &db.root);
        store
    }

    fn copy_children(&mut self, parent: GroupId, group: &KdbxGroup) {
        for node in &group.children {
            match node {
                Node::Entry(e) => {
                    let entry = RawEntry::new(
                        e.get_title().unwrap_or_default(),
                        e.get_username().unwrap_or_default(),
                        e.get_password().unwrap_or_default(),
                        e.get("URL").unwrap_or_default(),
                        e.get("Notes").unwrap_or_default(),
                    );
                    self.add_entry(parent, entry);
                }
                Node::Group(g) => {
                    let id = self.add_group(parent, g.name.clone());
                    self.copy_children(id, g);
                }
            }
        }
    }

    /// The implicit top-level group.
    pub fn root_group(&self) -> GroupId {
        GroupId(0)
    }

    /// Add a child group under `parent`.
    pub fn add_group(&mut self, parent: GroupId, name: impl Into<String>) -> GroupId {
        self.groups.push(GroupNode {
            name: name.into(),
            parent: Some(parent),
            entries: Vec::new(),
        });
        GroupId(self.groups.len() - 1)
    }

    /// Append an entry to `group`.
    pub fn add_entry(&mut self, group: GroupId, mut entry: RawEntry) {
        entry.group = Some(group);
        self.groups[group.0].entries.push(self.entries.len());
        self.entries.push(entry);
    }

    /// Every entry in the database, in database order.
    pub fn all_entries(&self) -> &[RawEntry] {
        &self.entries
    }

    /// Look up a group by a `/`-separated path below the root.
    ///
    /// Leading, trailing and doubled separators are ignored, so `/Servers/Web/`
    /// and `Servers/Web` name the same group. An empty path is the root.
    pub fn find_group(&self, path: &str) -> Option<Group<'_>> {
        let mut current = self.root_group();
        for name in path.split('/').filter(|c| !c.is_empty()) {
            let next = self
                .groups
                .iter()
                .position(|g| g.parent == Some(current) && g.name == name)?;
            current = GroupId(next);
        }
        Some(Group {
            store: self,
            id: current,
        })
    }
}
