//! Projection structs and the schema projector.
//!
//! A [`ProjectionStruct`] is the merged tree of a set of document paths. It
//! says which fields and list positions to keep; the projector in
//! [`projector`] applies it to a [`Schema`](dynashape_model::Schema).

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::expression::{DocumentPath, Segment};

pub mod projector;

pub use projector::{ProjectOptions, project, project_path, project_value};

/// What to keep at one node of a [`ProjectionStruct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The whole value.
    All,
    /// The whole list, collapsed to `T[] | undefined` because positions were
    /// removed from it.
    Collapse,
    /// Only the selected sub-paths.
    Partial(ProjectionStruct),
}

/// Merged selection tree built from document paths.
///
/// Named children and index children are kept apart: a named child only
/// applies to objects and records, an index child only to lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionStruct {
    /// Selected named children.
    pub fields: BTreeMap<String, Selection>,
    /// Selected list positions.
    pub indices: BTreeMap<usize, Selection>,
}

impl ProjectionStruct {
    /// Merge resolved paths into one struct.
    ///
    /// A full selection of a node wins over any deeper selection below it,
    /// regardless of the order the paths arrive in.
    #[must_use]
    pub fn build<'a>(paths: impl IntoIterator<Item = &'a DocumentPath>) -> Self {
        let mut root = Self::default();
        for path in paths {
            root.insert(&path.segments);
        }
        root
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.indices.is_empty()
    }

    /// Select the value at `segments`.
    pub fn insert(&mut self, segments: &[Segment]) {
        self.merge(segments, Selection::All);
    }

    /// Select the list at `segments` as collapsed.
    pub fn insert_collapsed(&mut self, segments: &[Segment]) {
        self.merge(segments, Selection::Collapse);
    }

    fn merge(&mut self, segments: &[Segment], leaf: Selection) {
        let Some((first, rest)) = segments.split_first() else {
            return;
        };
        match first {
            Segment::Field(name) | Segment::Placeholder(name) => {
                merge_into(self.fields.entry(name.clone()), rest, leaf);
            }
            Segment::Index(idx) => merge_into(self.indices.entry(*idx), rest, leaf),
        }
    }

    /// The paths this struct selects, in field-then-index order. Collapsed
    /// nodes are reported like full selections.
    #[must_use]
    pub fn paths(&self) -> Vec<DocumentPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut out);
        out
    }

    fn collect_paths(&self, prefix: &mut Vec<Segment>, out: &mut Vec<DocumentPath>) {
        let children = self
            .fields
            .iter()
            .map(|(name, sel)| (Segment::Field(name.clone()), sel))
            .chain(self.indices.iter().map(|(idx, sel)| (Segment::Index(*idx), sel)));
        for (segment, selection) in children {
            prefix.push(segment);
            match selection {
                Selection::All | Selection::Collapse => out.push(DocumentPath::new(prefix.clone())),
                Selection::Partial(sub) => sub.collect_paths(prefix, out),
            }
            prefix.pop();
        }
    }
}

/// Merge `rest` below the node held by `entry`.
///
/// At the leaf, `Collapse` beats `All`, and both replace a partial selection.
/// Above the leaf, an existing full selection absorbs the deeper path.
fn merge_into<K: Ord>(entry: Entry<'_, K, Selection>, rest: &[Segment], leaf: Selection) {
    match entry {
        Entry::Vacant(slot) => {
            if rest.is_empty() {
                slot.insert(leaf);
            } else {
                let mut sub = ProjectionStruct::default();
                sub.merge(rest, leaf);
                slot.insert(Selection::Partial(sub));
            }
        }
        Entry::Occupied(mut slot) => {
            let current = slot.get_mut();
            if rest.is_empty() {
                if !matches!(
                    (&*current, &leaf),
                    (Selection::Collapse, _) | (Selection::All, Selection::All)
                ) {
                    *current = leaf;
                }
            } else if let Selection::Partial(sub) = current {
                sub.merge(rest, leaf);
            }
        }
    }
}
