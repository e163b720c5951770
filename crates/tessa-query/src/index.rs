use std::any::Any;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tessa_syntax::{try_visit, Node};

use crate::error::QueryError;
use crate::located::NodeInfo;
use crate::monitor::{Monitor, NullMonitor};

/// Class tag of a document root.
const FILE_TAG: &str = "File";

/// Top-level section tags a document root may contain directly.
const TOP_LEVEL_TAGS: [&str; 5] = [
    "SettingSection",
    "VariableSection",
    "TestCaseSection",
    "KeywordSection",
    "CommentSection",
];

/// The top-level section a given inner node kind must live in. Routing a
/// query through this table avoids walking unrelated sections (e.g. every
/// test body) when only imports are wanted.
fn section_for_inner(tag: &str) -> Option<&'static str> {
    Some(match tag {
        "LibraryImport" | "ResourceImport" | "VariablesImport" | "SuiteSetup" | "SuiteTeardown"
        | "TestTemplate" => "SettingSection",
        "Keyword" => "KeywordSection",
        "TestCase" => "TestCaseSection",
        "Variable" => "VariableSection",
        _ => return None,
    })
}

/// Key of an [`AstIndex::iter_cached`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    KeywordUsages { include_argument_usages: bool },
}

/// Non-owning located node: everything is held weakly so the index never
/// extends the lifetime of the tree it describes.
struct WeakLocated {
    stack: Vec<Weak<Node>>,
    node: Weak<Node>,
}

impl WeakLocated {
    fn capture(stack: &[Arc<Node>], node: &Arc<Node>) -> WeakLocated {
        WeakLocated {
            stack: stack.iter().map(Arc::downgrade).collect(),
            node: Arc::downgrade(node),
        }
    }

    fn upgrade(&self) -> Result<NodeInfo, QueryError> {
        let stack = self
            .stack
            .iter()
            .map(Weak::upgrade)
            .collect::<Option<Vec<_>>>()
            .ok_or(QueryError::TreeDiscarded)?;
        let node = self.node.upgrade().ok_or(QueryError::TreeDiscarded)?;
        Ok(NodeInfo { stack, node })
    }
}

/// Whole-subtree index: one deferred depth-first walk groups every node by
/// class tag, then queries are map lookups.
struct FullIndex {
    tree: Weak<Node>,
    build_lock: Mutex<()>,
    by_tag: OnceLock<FxHashMap<String, Vec<WeakLocated>>>,
}

impl FullIndex {
    fn new(tree: &Arc<Node>) -> FullIndex {
        FullIndex {
            tree: Arc::downgrade(tree),
            build_lock: Mutex::new(()),
            by_tag: OnceLock::new(),
        }
    }

    /// The one-time build: concurrent first queries converge on a single
    /// walk behind `build_lock`; steady-state reads skip the lock entirely.
    /// A cancelled build stores nothing, so the next query retries.
    fn ensure_built(
        &self,
        monitor: &dyn Monitor,
    ) -> Result<&FxHashMap<String, Vec<WeakLocated>>, QueryError> {
        if let Some(map) = self.by_tag.get() {
            return Ok(map);
        }
        let _guard = self.build_lock.lock();
        if let Some(map) = self.by_tag.get() {
            return Ok(map);
        }
        let tree = self.tree.upgrade().ok_or(QueryError::TreeDiscarded)?;
        let mut map: FxHashMap<String, Vec<WeakLocated>> = FxHashMap::default();
        try_visit(&tree, &mut |stack, node| {
            monitor.check_cancelled()?;
            map.entry(node.tag.clone())
                .or_default()
                .push(WeakLocated::capture(stack, node));
            Ok(())
        })?;
        Ok(self.by_tag.get_or_init(move || map))
    }

    fn nodes(&self, tag: &str, monitor: &dyn Monitor) -> Result<Vec<NodeInfo>, QueryError> {
        let map = self.ensure_built(monitor)?;
        match map.get(tag) {
            Some(entries) => entries.iter().map(WeakLocated::upgrade).collect(),
            None => Ok(Vec::new()),
        }
    }
}

/// Document-root index: groups only the direct children (the top-level
/// sections, assumed cheap, built eagerly) and routes inner tags to the
/// owning section's own [`FullIndex`]. Unknown tags fall back to delegating
/// to every top-level child in document order.
struct SectionIndex {
    by_tag: FxHashMap<String, Vec<WeakLocated>>,
    order: Vec<WeakLocated>,
    section_indexes: Mutex<FxHashMap<usize, Arc<FullIndex>>>,
}

impl SectionIndex {
    fn new(root: &Arc<Node>) -> SectionIndex {
        let mut by_tag: FxHashMap<String, Vec<WeakLocated>> = FxHashMap::default();
        let mut order = Vec::new();
        for child in &root.children {
            by_tag
                .entry(child.tag.clone())
                .or_default()
                .push(WeakLocated::capture(&[], child));
            order.push(WeakLocated::capture(&[], child));
        }
        SectionIndex {
            by_tag,
            order,
            section_indexes: Mutex::new(FxHashMap::default()),
        }
    }

    fn sub_index(&self, section: &Arc<Node>) -> Arc<FullIndex> {
        let mut indexes = self.section_indexes.lock();
        Arc::clone(
            indexes
                .entry(Arc::as_ptr(section) as usize)
                .or_insert_with(|| Arc::new(FullIndex::new(section))),
        )
    }

    fn delegate(
        &self,
        entries: &[WeakLocated],
        tag: &str,
        monitor: &dyn Monitor,
        out: &mut Vec<NodeInfo>,
    ) -> Result<(), QueryError> {
        for entry in entries {
            let info = entry.upgrade()?;
            let index = self.sub_index(&info.node);
            out.extend(index.nodes(tag, monitor)?);
        }
        Ok(())
    }

    fn nodes(&self, tag: &str, monitor: &dyn Monitor) -> Result<Vec<NodeInfo>, QueryError> {
        let mut out = Vec::new();
        if let Some(top_level) = section_for_inner(tag) {
            if let Some(entries) = self.by_tag.get(top_level) {
                self.delegate(entries, tag, monitor, &mut out)?;
            }
        } else if TOP_LEVEL_TAGS.contains(&tag) {
            if let Some(entries) = self.by_tag.get(tag) {
                for entry in entries {
                    out.push(entry.upgrade()?);
                }
            }
        } else {
            // Unknown tag: conservatively check every top-level child.
            self.delegate(&self.order, tag, monitor, &mut out)?;
        }
        Ok(out)
    }
}

enum Strategy {
    Full(FullIndex),
    Sections(SectionIndex),
}

/// Per-tree query index, created once per parse and held by the document
/// owner next to the tree. Both the class-tag index and the auxiliary cache
/// are append-only; invalidation happens only by discarding the whole
/// index together with its tree.
pub struct AstIndex {
    strategy: Strategy,
    caches: Mutex<FxHashMap<CacheKey, Arc<dyn Any + Send + Sync>>>,
    monitor: Arc<dyn Monitor>,
}

impl AstIndex {
    pub fn new(root: &Arc<Node>) -> AstIndex {
        AstIndex::with_monitor(root, Arc::new(NullMonitor))
    }

    /// Index whose deferred builds and long enumerations consult `monitor`.
    pub fn with_monitor(root: &Arc<Node>, monitor: Arc<dyn Monitor>) -> AstIndex {
        let strategy = if root.is(FILE_TAG) {
            Strategy::Sections(SectionIndex::new(root))
        } else {
            Strategy::Full(FullIndex::new(root))
        };
        AstIndex {
            strategy,
            caches: Mutex::new(FxHashMap::default()),
            monitor,
        }
    }

    pub fn monitor(&self) -> &dyn Monitor {
        &*self.monitor
    }

    /// All nodes with the given class tag, in tree encounter order. Never
    /// fails for an unknown tag; the result is simply empty.
    pub fn iter_indexed(&self, tag: &str) -> Result<Vec<NodeInfo>, QueryError> {
        match &self.strategy {
            Strategy::Full(index) => index.nodes(tag, &*self.monitor),
            Strategy::Sections(index) => index.nodes(tag, &*self.monitor),
        }
    }

    /// Union of `iter_indexed` over several tags, grouped per tag.
    pub fn iter_indexed_any(&self, tags: &[&str]) -> Result<Vec<NodeInfo>, QueryError> {
        let mut out = Vec::new();
        for tag in tags {
            out.extend(self.iter_indexed(tag)?);
        }
        Ok(out)
    }

    /// Materialized result of a derived computation, computed at most once
    /// per key. Entries are written once and never overwritten; repeat calls
    /// replay the stored sequence.
    pub fn iter_cached<T, F>(&self, key: CacheKey, compute: F) -> Result<Arc<Vec<T>>, QueryError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&AstIndex) -> Result<Vec<T>, QueryError>,
    {
        if let Some(entry) = self.caches.lock().get(&key) {
            if let Ok(values) = Arc::clone(entry).downcast::<Vec<T>>() {
                return Ok(values);
            }
            tracing::warn!(?key, "cache entry has an unexpected type; recomputing");
        }
        // Compute outside the lock: the computation itself queries the index.
        let computed: Arc<Vec<T>> = Arc::new(compute(self)?);
        let mut caches = self.caches.lock();
        let entry = caches
            .entry(key)
            .or_insert_with(|| Arc::clone(&computed) as Arc<dyn Any + Send + Sync>);
        Ok(Arc::clone(entry)
            .downcast::<Vec<T>>()
            .unwrap_or(computed))
    }
}
