//! Walks the routes directory and collects one [`RouteDir`] per directory.
//!
//! Reserved files start with `+`. They are classified through [`classify`]
//! into a [`FileRole`] and attached to the directory they live in. Everything
//! else in the tree is an ordinary module and is left alone.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::config::ManifestConfig;
use crate::error::{ManifestError, ManifestResult};
use crate::manifest::PageNode;
use crate::segment::affects_path;
use crate::utils::project_relative;

/// File names that package managers and editors leave in source trees.
const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
];

pub const DEFAULT_LAYOUT: &str = "layout.svelte";
pub const DEFAULT_ERROR: &str = "error.svelte";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Layout,
    LayoutShared,
    LayoutServer,
    Error,
    Page,
    PageShared,
    PageServer,
    Endpoint,
}

impl FileRole {
    pub fn describe(&self) -> &'static str {
        match self {
            FileRole::Layout => "layout component",
            FileRole::LayoutShared => "layout module",
            FileRole::LayoutServer => "layout server module",
            FileRole::Error => "error component",
            FileRole::Page => "page component",
            FileRole::PageShared => "page module",
            FileRole::PageServer => "page server module",
            FileRole::Endpoint => "endpoint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub role: FileRole,
    /// `ref` from `+page@ref.svelte` or `+layout@ref.svelte`
    pub named_layout: Option<String>,
}

impl ClassifiedFile {
    fn new(role: FileRole) -> Self {
        Self {
            role,
            named_layout: None,
        }
    }
}

/// Decides what a file in the routes tree is.
///
/// Returns `Ok(None)` for files that are not reserved route files: anything
/// not starting with `+`, and `+` files without a recognized extension.
pub fn classify(
    file_name: &str,
    project_relative: &str,
    config: &ManifestConfig,
) -> ManifestResult<Option<ClassifiedFile>> {
    if !file_name.starts_with('+') {
        return Ok(None);
    }

    if let Some(ext) = config.component_extension(file_name) {
        let stem = &file_name[1..file_name.len() - ext.len()];
        return classify_component(stem, project_relative).map(Some);
    }

    if let Some(ext) = config.module_extension(file_name) {
        let stem = &file_name[1..file_name.len() - ext.len()];
        return classify_module(stem, file_name, project_relative).map(Some);
    }

    Ok(None)
}

fn classify_component(stem: &str, project_relative: &str) -> ManifestResult<ClassifiedFile> {
    let (base, reference) = match stem.split_once('@') {
        Some((base, reference)) => (base, Some(reference.to_string())),
        None => (stem, None),
    };

    let role = match (base, &reference) {
        ("page", _) => FileRole::Page,
        ("layout", _) => FileRole::Layout,
        ("error", None) => FileRole::Error,
        _ if stem.starts_with("layout-") => {
            return Err(ManifestError::DeprecatedLayout(project_relative.to_string()));
        }
        _ => return Err(ManifestError::ReservedFile(project_relative.to_string())),
    };

    Ok(ClassifiedFile {
        role,
        named_layout: reference,
    })
}

fn classify_module(
    stem: &str,
    file_name: &str,
    project_relative: &str,
) -> ManifestResult<ClassifiedFile> {
    if stem == "server" {
        return Ok(ClassifiedFile::new(FileRole::Endpoint));
    }

    let (stem, server) = match stem.strip_suffix(".server") {
        Some(stem) => (stem, true),
        None => (stem, false),
    };

    let base = match stem.split_once('@') {
        Some(("page" | "layout", reference)) => {
            return Err(ManifestError::NamedLayoutInModule {
                reference: format!("@{}", reference),
                name: file_name.to_string(),
                file: project_relative.to_string(),
            });
        }
        Some(_) => return Err(ManifestError::ReservedFile(project_relative.to_string())),
        None => stem,
    };

    let role = match (base, server) {
        ("page", false) => FileRole::PageShared,
        ("page", true) => FileRole::PageServer,
        ("layout", false) => FileRole::LayoutShared,
        ("layout", true) => FileRole::LayoutServer,
        _ => return Err(ManifestError::ReservedFile(project_relative.to_string())),
    };

    Ok(ClassifiedFile::new(role))
}

/// Whether the walker skips an entry with this name.
pub fn is_ignored(name: &str) -> bool {
    (name.starts_with('.') && name != ".well-known")
        || name.starts_with('_')
        || looks_like_lockfile(name)
}

fn looks_like_lockfile(name: &str) -> bool {
    LOCKFILES.contains(&name)
        || name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".swo")
        || (name.len() > 1 && name.starts_with('#') && name.ends_with('#'))
}

/// One directory of the routes tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDir {
    /// Path relative to the routes root, `/`-separated
    pub id: String,
    /// The directory's own name, empty for the root
    pub segment: String,
    pub parent: Option<usize>,
    pub layout: Option<PageNode>,
    pub error: Option<PageNode>,
    pub leaf: Option<PageNode>,
    pub endpoint: Option<String>,
}

impl RouteDir {
    /// Whether a named layout reference points at this directory. Group
    /// directories can be referenced with or without their parentheses.
    pub fn is_named(&self, reference: &str) -> bool {
        self.segment == reference
            || (!reference.is_empty() && self.segment == format!("({})", reference))
    }
}

/// All directories of the routes tree in walk order: depth first, each
/// directory before its children. Index 0 is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTree {
    pub dirs: Vec<RouteDir>,
    /// False when the routes directory does not exist
    pub exists: bool,
}

/// Route ids that resolve to the same URL, keyed by the id with groups removed.
#[derive(Debug, Default)]
struct ConflictTracker {
    occupied: HashMap<String, String>,
}

impl ConflictTracker {
    fn claim(&mut self, id: &str) -> ManifestResult<()> {
        let key = id
            .split('/')
            .filter(|segment| !segment.is_empty() && affects_path(segment))
            .collect::<Vec<_>>()
            .join("/");

        if let Some(existing) = self.occupied.get(&key) {
            return Err(ManifestError::RouteConflict(
                display_id(existing),
                display_id(id),
            ));
        }

        self.occupied.insert(key, id.to_string());
        Ok(())
    }
}

pub fn display_id(id: &str) -> String {
    if id.is_empty() {
        "/".to_string()
    } else {
        id.to_string()
    }
}

pub struct TreeWalker<'a> {
    config: &'a ManifestConfig,
    tree: RouteTree,
    index_by_path: HashMap<PathBuf, usize>,
}

impl<'a> TreeWalker<'a> {
    pub fn new(config: &'a ManifestConfig) -> Self {
        Self {
            config,
            tree: RouteTree::default(),
            index_by_path: HashMap::new(),
        }
    }

    pub fn walk(mut self) -> ManifestResult<RouteTree> {
        let routes_dir = self.config.routes_dir();

        if routes_dir.is_dir() {
            self.tree.exists = true;

            let walker = WalkDir::new(&routes_dir)
                .follow_links(true)
                .sort_by(files_first)
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_ignored(&file_name(entry)));

            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    self.enter_dir(&entry)?;
                } else {
                    self.add_file(&entry)?;
                }
            }
        } else {
            debug!(
                "Routes directory {} does not exist, using defaults",
                routes_dir.display()
            );
            self.tree.dirs.push(RouteDir::default());
        }

        self.finish()
    }

    fn enter_dir(&mut self, entry: &DirEntry) -> ManifestResult<()> {
        let path = entry.path().to_path_buf();

        if entry.depth() == 0 {
            self.index_by_path.insert(path, self.tree.dirs.len());
            self.tree.dirs.push(RouteDir::default());
            return Ok(());
        }

        let segment = file_name(entry);
        if segment.starts_with('+') {
            return Err(ManifestError::ReservedDirectory(project_relative(
                &self.config.cwd,
                &path,
            )));
        }

        let parent = self.parent_index(&path)?;
        let parent_id = &self.tree.dirs[parent].id;
        let id = if parent_id.is_empty() {
            segment.clone()
        } else {
            format!("{}/{}", parent_id, segment)
        };

        trace!("Route directory {}", id);
        self.index_by_path.insert(path, self.tree.dirs.len());
        self.tree.dirs.push(RouteDir {
            id,
            segment,
            parent: Some(parent),
            ..RouteDir::default()
        });

        Ok(())
    }

    fn add_file(&mut self, entry: &DirEntry) -> ManifestResult<()> {
        let name = file_name(entry);
        let relative = project_relative(&self.config.cwd, entry.path());

        let Some(classified) = classify(&name, &relative, self.config)? else {
            return Ok(());
        };

        let index = self.parent_index(entry.path())?;
        let dir = &mut self.tree.dirs[index];
        let dir_id = display_id(&dir.id);
        trace!("{} is a {}", relative, classified.role.describe());

        let (parent_slot, slot) = match classified.role {
            FileRole::Endpoint => (None, &mut dir.endpoint),
            role => {
                let node = match role {
                    FileRole::Layout | FileRole::LayoutShared | FileRole::LayoutServer => {
                        &mut dir.layout
                    }
                    FileRole::Error => &mut dir.error,
                    _ => &mut dir.leaf,
                }
                .get_or_insert_with(PageNode::default);

                match role {
                    FileRole::Layout | FileRole::Page => {
                        (Some(&mut node.parent_id), &mut node.component)
                    }
                    FileRole::Error => (None, &mut node.component),
                    FileRole::LayoutShared | FileRole::PageShared => (None, &mut node.shared),
                    _ => (None, &mut node.server),
                }
            }
        };

        if let Some(existing) = slot.as_ref() {
            return Err(ManifestError::DuplicateRouteFile {
                role: classified.role.describe(),
                dir: dir_id,
                first: existing.clone(),
                second: relative,
            });
        }
        *slot = Some(relative);

        if let (Some(parent_id), Some(reference)) = (parent_slot, classified.named_layout) {
            *parent_id = Some(reference);
        }

        Ok(())
    }

    fn parent_index(&self, path: &Path) -> ManifestResult<usize> {
        path.parent()
            .and_then(|parent| self.index_by_path.get(parent))
            .copied()
            .ok_or_else(|| {
                ManifestError::io(
                    path,
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "parent directory was not visited",
                    ),
                )
            })
    }

    /// Checks the collected tree and fills in default components.
    fn finish(mut self) -> ManifestResult<RouteTree> {
        let mut conflicts = ConflictTracker::default();
        for dir in &self.tree.dirs {
            if dir.leaf.is_some() && dir.endpoint.is_some() {
                return Err(ManifestError::PageEndpointConflict(display_id(&dir.id)));
            }
            if dir.leaf.is_some() || dir.endpoint.is_some() {
                conflicts.claim(&dir.id)?;
            }
        }

        let fallback = self.config.fallback_dir();
        let default_layout = project_relative(&self.config.cwd, &fallback.join(DEFAULT_LAYOUT));
        let default_error = project_relative(&self.config.cwd, &fallback.join(DEFAULT_ERROR));

        if let Some(root) = self.tree.dirs.first_mut() {
            root.layout.get_or_insert_with(PageNode::default);
            root.error
                .get_or_insert_with(PageNode::default)
                .component
                .get_or_insert_with(|| default_error.clone());
        }

        for dir in &mut self.tree.dirs {
            if let Some(layout) = &mut dir.layout {
                layout
                    .component
                    .get_or_insert_with(|| default_layout.clone());
            }
        }

        debug!("Walked {} route directories", self.tree.dirs.len());
        Ok(self.tree)
    }
}

/// Files sort before directories so a directory's own files are seen before
/// any of its children.
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn file_name(entry: &DirEntry) -> String {
    entry.file_name().to_string_lossy().into_owned()
}

pub fn walk_routes(config: &ManifestConfig) -> ManifestResult<RouteTree> {
    TreeWalker::new(config).walk()
}
