use std::collections::HashSet;
use std::path::Path;

/// One resolved library import in scope for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDependency {
    pub name: String,
    pub alias: Option<String>,
}

/// Names visible from a document's resolved import graph. Implemented by the
/// host's dependency resolution; consumed here to decide whether a dotted
/// keyword name starts with a library or resource qualifier.
pub trait ImportGraph {
    fn libraries(&self) -> Vec<LibraryDependency>;
    fn resource_paths(&self) -> Vec<String>;
}

/// Empty graph for hosts without import resolution.
pub struct NoImports;

impl ImportGraph for NoImports {
    fn libraries(&self) -> Vec<LibraryDependency> {
        Vec::new()
    }

    fn resource_paths(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Plain-data [`ImportGraph`] for hosts that resolve imports up front.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImports {
    pub libraries: Vec<LibraryDependency>,
    pub resources: Vec<String>,
}

impl ImportGraph for ResolvedImports {
    fn libraries(&self) -> Vec<LibraryDependency> {
        self.libraries.clone()
    }

    fn resource_paths(&self) -> Vec<String> {
        self.resources.clone()
    }
}

/// Libraries imported from plugin files drop this extension when used as a
/// keyword qualifier.
const LIBRARY_FILE_EXTENSIONS: [&str; 1] = ["py"];

/// Resource files drop these extensions when used as a keyword qualifier.
const RESOURCE_FILE_EXTENSIONS: [&str; 2] = ["tessa", "txt"];

/// The lowercase names usable as keyword-call qualifiers: library names (or
/// file stems) and aliases, plus resource file stems. Case is irrelevant for
/// qualifier matching, so everything is lowercased once here.
pub(crate) fn dependent_name_set(graph: &dyn ImportGraph) -> HashSet<String> {
    let mut names = HashSet::new();
    for library in graph.libraries() {
        if !library.name.is_empty() {
            names.insert(qualifier_name(&library.name, &LIBRARY_FILE_EXTENSIONS));
        }
        if let Some(alias) = library.alias {
            if !alias.is_empty() {
                names.insert(alias.to_lowercase());
            }
        }
    }
    for resource in graph.resource_paths() {
        if !resource.is_empty() {
            names.insert(qualifier_name(&resource, &RESOURCE_FILE_EXTENSIONS));
        }
    }
    names
}

fn qualifier_name(name: &str, stem_extensions: &[&str]) -> String {
    let path = Path::new(name);
    let extension = path.extension().and_then(|e| e.to_str());
    if extension.is_some_and(|e| stem_extensions.iter().any(|s| e.eq_ignore_ascii_case(s))) {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            return stem.to_lowercase();
        }
    }
    name.to_lowercase()
}
