use tracing::trace;

use crate::error::{ManifestError, ManifestResult};
use crate::manifest::{PageIndexes, PageNode};
use crate::walker::RouteTree;

/// The manifest's node list plus, per route directory, where its nodes ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTable {
    pub nodes: Vec<PageNode>,
    pub layout_of: Vec<Option<usize>>,
    pub error_of: Vec<Option<usize>>,
    pub leaf_of: Vec<Option<usize>>,
}

impl NodeTable {
    /// Layouts and errors come first in walk order, so the root layout is
    /// node 0 and the root error is node 1. Leaves follow.
    pub fn build(tree: &RouteTree) -> Self {
        let count = tree.dirs.len();
        let mut table = NodeTable {
            nodes: Vec::new(),
            layout_of: vec![None; count],
            error_of: vec![None; count],
            leaf_of: vec![None; count],
        };

        for (index, dir) in tree.dirs.iter().enumerate() {
            if let Some(layout) = &dir.layout {
                table.layout_of[index] = Some(table.push(layout));
            }
            if let Some(error) = &dir.error {
                table.error_of[index] = Some(table.push(error));
            }
        }

        for (index, dir) in tree.dirs.iter().enumerate() {
            if let Some(leaf) = &dir.leaf {
                table.leaf_of[index] = Some(table.push(leaf));
            }
        }

        table
    }

    fn push(&mut self, node: &PageNode) -> usize {
        self.nodes.push(node.clone());
        self.nodes.len() - 1
    }
}

/// Works out which layouts and error boundaries wrap each page.
pub struct LayoutResolver<'a> {
    tree: &'a RouteTree,
    table: &'a NodeTable,
}

impl<'a> LayoutResolver<'a> {
    pub fn new(tree: &'a RouteTree, table: &'a NodeTable) -> Self {
        Self { tree, table }
    }

    /// Resolves the layout chain for the page in directory `index`, or
    /// returns `None` when that directory has no page.
    ///
    /// The walk goes from the page's directory up to the root. While a named
    /// layout reference is pending, directories other than the referenced one
    /// are passed over.
    pub fn resolve_layouts(&self, index: usize) -> ManifestResult<Option<PageIndexes>> {
        let dir = &self.tree.dirs[index];
        let (Some(leaf), Some(leaf_index)) = (&dir.leaf, self.table.leaf_of[index]) else {
            return Ok(None);
        };

        let mut layouts = Vec::new();
        let mut errors = Vec::new();
        let mut pending = leaf.parent_id.clone();
        let mut declared_by = node_file(leaf);

        let mut current = Some(index);
        while let Some(i) = current {
            let dir = &self.tree.dirs[i];

            let selected = match pending.as_deref() {
                Some(reference) => dir.is_named(reference),
                None => true,
            };

            if selected {
                if dir.layout.is_some() || dir.error.is_some() {
                    layouts.push(self.table.layout_of[i]);
                    errors.push(self.table.error_of[i]);
                }

                match &dir.layout {
                    Some(layout) => {
                        pending = layout.parent_id.clone();
                        declared_by = node_file(layout);
                    }
                    None => pending = None,
                }
            } else {
                trace!("Skipping {} while looking for {:?}", dir.id, pending);
            }

            current = dir.parent;
        }

        if let Some(segment) = pending {
            return Err(ManifestError::MissingLayoutSegment {
                file: declared_by,
                segment,
            });
        }

        layouts.reverse();
        errors.reverse();

        Ok(Some(PageIndexes {
            layouts,
            errors,
            leaf: leaf_index,
        }))
    }
}

fn node_file(node: &PageNode) -> String {
    node.component
        .as_ref()
        .or(node.shared.as_ref())
        .or(node.server.as_ref())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::RouteDir;

    fn node(component: &str) -> PageNode {
        PageNode {
            component: Some(component.to_string()),
            ..PageNode::default()
        }
    }

    fn dir(id: &str, parent: Option<usize>) -> RouteDir {
        RouteDir {
            id: id.to_string(),
            segment: id.rsplit('/').next().unwrap_or_default().to_string(),
            parent,
            ..RouteDir::default()
        }
    }

    fn root() -> RouteDir {
        RouteDir {
            layout: Some(node("layout.svelte")),
            error: Some(node("error.svelte")),
            ..dir("", None)
        }
    }

    fn resolve(tree: &RouteTree, index: usize) -> ManifestResult<Option<PageIndexes>> {
        let table = NodeTable::build(tree);
        LayoutResolver::new(tree, &table).resolve_layouts(index)
    }

    #[test]
    fn test_node_order() {
        let tree = RouteTree {
            dirs: vec![
                RouteDir {
                    leaf: Some(node("+page.svelte")),
                    ..root()
                },
                RouteDir {
                    layout: Some(node("foo/+layout.svelte")),
                    leaf: Some(node("foo/+page.svelte")),
                    ..dir("foo", Some(0))
                },
            ],
            exists: true,
        };
        let table = NodeTable::build(&tree);

        let components: Vec<_> = table
            .nodes
            .iter()
            .map(|n| n.component.as_deref().unwrap())
            .collect();
        assert_eq!(
            components,
            vec![
                "layout.svelte",
                "error.svelte",
                "foo/+layout.svelte",
                "+page.svelte",
                "foo/+page.svelte"
            ]
        );
        assert_eq!(table.leaf_of, vec![Some(3), Some(4)]);
    }

    #[test]
    fn test_chain_with_nested_layout() {
        let tree = RouteTree {
            dirs: vec![
                root(),
                RouteDir {
                    layout: Some(node("foo/+layout.svelte")),
                    ..dir("foo", Some(0))
                },
                RouteDir {
                    leaf: Some(node("foo/bar/+page.svelte")),
                    ..dir("foo/bar", Some(1))
                },
            ],
            exists: true,
        };

        let page = resolve(&tree, 2).unwrap().unwrap();
        assert_eq!(page.layouts, vec![Some(0), Some(2)]);
        assert_eq!(page.errors, vec![Some(1), None]);
        assert_eq!(page.leaf, 3);
    }

    #[test]
    fn test_directory_without_page() {
        let tree = RouteTree {
            dirs: vec![root()],
            exists: true,
        };
        assert_eq!(resolve(&tree, 0).unwrap(), None);
    }

    #[test]
    fn test_named_reference_skips_levels() {
        let tree = RouteTree {
            dirs: vec![
                root(),
                RouteDir {
                    layout: Some(node("(special)/+layout.svelte")),
                    ..dir("(special)", Some(0))
                },
                RouteDir {
                    layout: Some(node("(special)/a/+layout.svelte")),
                    ..dir("(special)/a", Some(1))
                },
                RouteDir {
                    leaf: Some(PageNode {
                        parent_id: Some("(special)".to_string()),
                        ..node("(special)/a/b/+page@(special).svelte")
                    }),
                    ..dir("(special)/a/b", Some(2))
                },
            ],
            exists: true,
        };

        let page = resolve(&tree, 3).unwrap().unwrap();
        assert_eq!(page.layouts, vec![Some(0), Some(2)]);
        assert_eq!(page.errors, vec![Some(1), None]);
    }

    #[test]
    fn test_reference_without_parentheses() {
        let tree = RouteTree {
            dirs: vec![
                root(),
                RouteDir {
                    layout: Some(node("(special)/+layout.svelte")),
                    ..dir("(special)", Some(0))
                },
                RouteDir {
                    leaf: Some(PageNode {
                        parent_id: Some("special".to_string()),
                        ..node("(special)/x/+page@special.svelte")
                    }),
                    ..dir("(special)/x", Some(1))
                },
            ],
            exists: true,
        };

        let page = resolve(&tree, 2).unwrap().unwrap();
        assert_eq!(page.layouts, vec![Some(0), Some(2)]);
    }

    #[test]
    fn test_root_reference() {
        let tree = RouteTree {
            dirs: vec![
                root(),
                RouteDir {
                    layout: Some(node("a/+layout.svelte")),
                    ..dir("a", Some(0))
                },
                RouteDir {
                    leaf: Some(PageNode {
                        parent_id: Some(String::new()),
                        ..node("a/b/+page@.svelte")
                    }),
                    ..dir("a/b", Some(1))
                },
            ],
            exists: true,
        };

        let page = resolve(&tree, 2).unwrap().unwrap();
        assert_eq!(page.layouts, vec![Some(0)]);
        assert_eq!(page.errors, vec![Some(1)]);
    }

    #[test]
    fn test_layout_reference_continues_chain() {
        let tree = RouteTree {
            dirs: vec![
                root(),
                RouteDir {
                    layout: Some(node("a/+layout.svelte")),
                    ..dir("a", Some(0))
                },
                RouteDir {
                    layout: Some(PageNode {
                        parent_id: Some(String::new()),
                        ..node("a/b/+layout@.svelte")
                    }),
                    ..dir("a/b", Some(1))
                },
                RouteDir {
                    leaf: Some(node("a/b/c/+page.svelte")),
                    ..dir("a/b/c", Some(2))
                },
            ],
            exists: true,
        };

        let page = resolve(&tree, 3).unwrap().unwrap();
        assert_eq!(page.layouts, vec![Some(0), Some(3)]);
    }

    #[test]
    fn test_missing_reference() {
        let tree = RouteTree {
            dirs: vec![
                root(),
                RouteDir {
                    leaf: Some(PageNode {
                        parent_id: Some("missing".to_string()),
                        ..node("src/routes/x/+page@missing.svelte")
                    }),
                    ..dir("x", Some(0))
                },
            ],
            exists: true,
        };

        let err = resolve(&tree, 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "src/routes/x/+page@missing.svelte references missing segment \"missing\""
        );
    }
}
