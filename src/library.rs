//! Puzzle file storage and load bookkeeping.
//!
//! Problems are addressed by category name and numeric id. An [`SgfSource`]
//! turns that address into SGF text; [`ProblemLoader`] parses it into a
//! [`GameTree`] and makes sure a result that arrives for a request the
//! caller has since replaced is dropped instead of shown.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::tree::{GameTree, IdGenerator, SequentialIds};

/// Where SGF text for a `category/id` pair comes from.
pub trait SgfSource {
    fn load_sgf_text(&self, category: &str, id: u32) -> Result<String, LoadError>;

    /// Ids available in `category`, ascending.
    fn problem_ids(&self, category: &str) -> Result<Vec<u32>, LoadError>;
}

/// Problems stored as `<root>/<category>/<id>.sgf`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn problem_path(&self, category: &str, id: u32) -> PathBuf {
        self.root.join(category).join(format!("{id}.sgf"))
    }

    /// Subdirectory names under the root, sorted.
    pub fn categories(&self) -> Result<Vec<String>, LoadError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl SgfSource for DirectorySource {
    fn load_sgf_text(&self, category: &str, id: u32) -> Result<String, LoadError> {
        let path = self.problem_path(category, id);
        if !path.is_file() {
            return Err(LoadError::NotFound {
                category: category.to_string(),
                id,
                path,
            });
        }
        let text = fs::read_to_string(&path)?;
        debug!("Loaded problem {}/{} from {}", category, id, path.display());
        Ok(text)
    }

    fn problem_ids(&self, category: &str) -> Result<Vec<u32>, LoadError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(category))? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "sgf") {
                if let Some(id) = path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse().ok()) {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

/// In-memory problem set.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    problems: BTreeMap<(String, u32), String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: impl Into<String>, id: u32, sgf: impl Into<String>) {
        self.problems.insert((category.into(), id), sgf.into());
    }
}

impl SgfSource for MemorySource {
    fn load_sgf_text(&self, category: &str, id: u32) -> Result<String, LoadError> {
        self.problems
            .get(&(category.to_string(), id))
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                category: category.to_string(),
                id,
                path: PathBuf::from(format!("memory:{category}/{id}")),
            })
    }

    fn problem_ids(&self, category: &str) -> Result<Vec<u32>, LoadError> {
        Ok(self
            .problems
            .keys()
            .filter(|(c, _)| c == category)
            .map(|(_, id)| *id)
            .collect())
    }
}

/// Receipt for one load request. Only the most recent ticket is honored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    pub category: String,
    pub id: u32,
}

#[derive(Debug)]
pub struct ProblemLoader<S: SgfSource> {
    source: S,
    ids: Arc<dyn IdGenerator>,
    latest: u64,
    loading: bool,
    loaded: Option<(String, u32)>,
}

impl<S: SgfSource> ProblemLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            ids: Arc::new(SequentialIds::new()),
            latest: 0,
            loading: false,
            loaded: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// True from a request until its successful completion.
    ///
    /// A failed load leaves this set; the caller decides what to show.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Address of the last successfully loaded problem.
    pub fn loaded(&self) -> Option<(&str, u32)> {
        self.loaded.as_ref().map(|(c, id)| (c.as_str(), *id))
    }

    /// Start loading `category/id`, superseding any earlier request.
    pub fn request(&mut self, category: &str, id: u32) -> LoadTicket {
        self.latest += 1;
        self.loading = true;
        debug!(category, id, seq = self.latest, "problem requested");
        LoadTicket {
            seq: self.latest,
            category: category.to_string(),
            id,
        }
    }

    /// Read and parse the problem named by `ticket`. Does not touch loader state.
    pub fn fetch(&self, ticket: &LoadTicket) -> Result<GameTree, LoadError> {
        let text = self.source.load_sgf_text(&ticket.category, ticket.id)?;
        Ok(GameTree::parse_with(&text, Arc::clone(&self.ids))?)
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.seq == self.latest
    }

    /// Deliver the result of `ticket`.
    ///
    /// Returns the tree only if the ticket is still the latest request and
    /// the load succeeded.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<GameTree, LoadError>) -> Option<GameTree> {
        if !self.is_current(&ticket) {
            debug!(category = %ticket.category, id = ticket.id, "ignoring result of superseded request");
            return None;
        }
        match result {
            Ok(tree) => {
                info!(category = %ticket.category, id = ticket.id, nodes = tree.len(), "problem loaded");
                self.loading = false;
                self.loaded = Some((ticket.category, ticket.id));
                Some(tree)
            }
            Err(err) => {
                warn!(category = %ticket.category, id = ticket.id, %err, "problem failed to load");
                None
            }
        }
    }

    /// Request, fetch and complete in one step.
    ///
    /// Text that fails to parse still loads, as an empty-board problem; only
    /// a missing or unreadable source is an error.
    pub fn load(&mut self, category: &str, id: u32) -> Result<GameTree, LoadError> {
        let ticket = self.request(category, id);
        match self.source.load_sgf_text(category, id) {
            Ok(text) => {
                let tree = GameTree::parse_or_degenerate(&text, Arc::clone(&self.ids));
                self.complete(ticket, Ok(tree.clone()));
                Ok(tree)
            }
            Err(err) => {
                warn!(category, id, %err, "problem failed to load");
                Err(err)
            }
        }
    }
}
