//! In-memory tag host for tests.
use super::{NewTag, RemoteTag, TagHost};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(String),
    #[error("tag {0:?} already exists")]
    AlreadyExists(String),
}

#[derive(Debug)]
pub struct MemoryHost {
    pub default_branch: String,
    pub branches: HashMap<String, String>,
    pub authenticated: bool,
    tags: Mutex<BTreeMap<String, (RemoteTag, Option<String>)>>,
    mutations: Mutex<usize>,
}

impl MemoryHost {
    /// A repository with a `main` branch whose head is `head`.
    pub fn new(head: &str) -> Self {
        Self {
            default_branch: "main".to_string(),
            branches: [("main".to_string(), head.to_string())]
                .into_iter()
                .collect(),
            authenticated: true,
            tags: Mutex::new(BTreeMap::new()),
            mutations: Mutex::new(0),
        }
    }

    pub fn with_branch(mut self, name: &str, head: &str) -> Self {
        self.branches.insert(name.to_string(), head.to_string());
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn with_tag(self, name: &str, commit_sha: &str) -> Self {
        let tag = RemoteTag {
            name: name.to_string(),
            commit_sha: commit_sha.to_string(),
        };
        self.tags
            .lock()
            .unwrap()
            .insert(name.to_string(), (tag, None));
        self
    }

    /// Names of all tags, sorted.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<RemoteTag> {
        self.tags.lock().unwrap().get(name).map(|(tag, _)| tag.clone())
    }

    pub fn message(&self, name: &str) -> Option<String> {
        self.tags
            .lock()
            .unwrap()
            .get(name)
            .and_then(|(_, message)| message.clone())
    }

    /// Number of create, update and delete calls.
    pub fn mutations(&self) -> usize {
        *self.mutations.lock().unwrap()
    }

    fn mutated(&self) {
        *self.mutations.lock().unwrap() += 1;
    }
}

impl TagHost for MemoryHost {
    type Error = Error;

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn default_branch(&self) -> Result<String, Self::Error> {
        Ok(self.default_branch.clone())
    }

    async fn resolve_ref(&self, reference: &str) -> Result<String, Self::Error> {
        if let Some(sha) = self.branches.get(reference) {
            return Ok(sha.clone());
        }
        if let Some(tag) = self.get(reference) {
            return Ok(tag.commit_sha);
        }
        if reference.len() >= 7 && reference.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(reference.to_string());
        }
        Err(Error::NotFound(format!("ref {reference:?}")))
    }

    async fn tags(&self) -> Result<Vec<RemoteTag>, Self::Error> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .values()
            .map(|(tag, _)| tag.clone())
            .collect())
    }

    async fn tag(&self, name: &str) -> Result<Option<RemoteTag>, Self::Error> {
        Ok(self.get(name))
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<RemoteTag, Self::Error> {
        self.mutated();
        let mut tags = self.tags.lock().unwrap();
        if tags.contains_key(&tag.name) {
            return Err(Error::AlreadyExists(tag.name.clone()));
        }
        let remote = RemoteTag {
            name: tag.name.clone(),
            commit_sha: tag.commit_sha.clone(),
        };
        tags.insert(tag.name.clone(), (remote.clone(), tag.message.clone()));
        Ok(remote)
    }

    async fn update_tag(&self, name: &str, commit_sha: &str) -> Result<RemoteTag, Self::Error> {
        self.mutated();
        let mut tags = self.tags.lock().unwrap();
        let (tag, _) = tags
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("tag {name:?}")))?;
        tag.commit_sha = commit_sha.to_string();
        Ok(tag.clone())
    }

    async fn delete_tag(&self, name: &str) -> Result<(), Self::Error> {
        self.mutated();
        self.tags
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("tag {name:?}")))
    }
}
