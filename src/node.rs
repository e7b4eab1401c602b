//! Parent/child transform hierarchy.
//!
//! A [`Node`] carries [`ObjectTransforms`] relative to an optional parent. Its global matrix
//! applies the local object matrix first and then the parent's global matrix, recursively up to
//! the root. Both matrices are cached on first use.
//!
//! Changing a node's own transforms through [`Node::set_transforms`] refreshes its caches.
//! Children are not tracked, so after moving a parent its children must be told with
//! [`Node::invalidate_global_cache`].
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use vertform::{Node, ObjectTransforms, Vec3, transform_position};
//!
//! let arm = Rc::new(Node::new(ObjectTransforms::new().at(Vec3::new(10.0, 0.0, 0.0))));
//! let hand = Node::child_of(&arm, ObjectTransforms::new().at(Vec3::new(1.0, 0.0, 0.0)));
//!
//! let tip = transform_position(hand.global_matrix(), Vec3::ZERO);
//! assert_eq!(tip, Vec3::new(11.0, 0.0, 0.0));
//! ```

use std::cell::Cell;
use std::rc::{Rc, Weak};

use glam::Mat4;

use crate::compose::object_matrix;
use crate::convention::CONVENTION;
use crate::uniforms::ObjectTransforms;

/// Lazily computed matrices for one node.
#[derive(Debug, Default)]
struct CachedMatrices {
    local: Cell<Option<Mat4>>,
    global: Cell<Option<Mat4>>,
}

impl CachedMatrices {
    fn invalidate_global(&self) {
        self.global.set(None);
    }

    fn invalidate_all(&self) {
        self.invalidate_global();
        self.local.set(None);
    }
}

/// One transform in a hierarchy.
///
/// Parents are held weakly. If the parent has been dropped the node behaves as a root.
#[derive(Debug, Default)]
pub struct Node {
    parent: Weak<Node>,
    transforms: Cell<ObjectTransforms>,
    cache: CachedMatrices,
}

impl Node {
    /// A root node.
    pub fn new(transforms: ObjectTransforms) -> Self {
        Self {
            parent: Weak::new(),
            transforms: Cell::new(transforms),
            cache: CachedMatrices::default(),
        }
    }

    /// A node positioned relative to `parent`.
    pub fn child_of(parent: &Rc<Node>, transforms: ObjectTransforms) -> Self {
        Self {
            parent: Rc::downgrade(parent),
            ..Self::new(transforms)
        }
    }

    /// The parent, if it is still alive.
    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.upgrade()
    }

    /// Reattaches this node. `None` makes it a root.
    pub fn set_parent(&mut self, parent: Option<&Rc<Node>>) {
        self.parent = parent.map(Rc::downgrade).unwrap_or_default();
        self.cache.invalidate_global();
    }

    /// Transforms relative to the parent.
    pub fn transforms(&self) -> ObjectTransforms {
        self.transforms.get()
    }

    /// Replaces the local transforms and drops both cached matrices.
    pub fn set_transforms(&self, transforms: ObjectTransforms) {
        self.transforms.set(transforms);
        self.cache.invalidate_all();
    }

    /// Forgets the cached global matrix, e.g. after an ancestor moved.
    pub fn invalidate_global_cache(&self) {
        self.cache.invalidate_global();
    }

    /// Forgets both cached matrices.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }

    /// The object matrix of this node's own transforms.
    ///
    /// Returns the cached copy when one is available.
    pub fn local_matrix(&self) -> Mat4 {
        cached(&self.cache.local, || object_matrix(&self.transforms.get()))
    }

    /// The local matrix followed by every ancestor's local matrix, innermost first.
    ///
    /// Returns the cached copy when one is available. Ancestors answer from their own caches.
    pub fn global_matrix(&self) -> Mat4 {
        cached(&self.cache.global, || match self.parent.upgrade() {
            Some(parent) => CONVENTION.then(self.local_matrix(), parent.global_matrix()),
            None => self.local_matrix(),
        })
    }
}

fn cached(cell: &Cell<Option<Mat4>>, create: impl FnOnce() -> Mat4) -> Mat4 {
    if let Some(matrix) = cell.get() {
        return matrix;
    }

    let matrix = create();
    cell.set(Some(matrix));
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::transform_position;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    fn origin_of(node: &Node) -> Vec3 {
        transform_position(node.global_matrix(), Vec3::ZERO)
    }

    fn near(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn root_global_is_local() {
        let transforms = ObjectTransforms::new()
            .at(Vec3::new(1.0, 2.0, 3.0))
            .rotated(Vec3::new(0.1, 0.2, 0.3))
            .scaled(1.5);
        let root = Node::new(transforms);

        assert_eq!(root.local_matrix(), object_matrix(&transforms));
        assert_eq!(root.global_matrix(), root.local_matrix());
    }

    #[test]
    fn child_is_placed_in_parent_space() {
        let parent = Rc::new(Node::new(
            ObjectTransforms::new().at(Vec3::new(10.0, 0.0, 0.0)).scaled(2.0),
        ));
        let child = Node::child_of(&parent, ObjectTransforms::new().at(Vec3::new(1.0, 0.0, 0.0)));

        // Offset 1 is scaled by the parent to 2, then shifted to 12.
        assert!(near(origin_of(&child), Vec3::new(12.0, 0.0, 0.0)));
    }

    #[test]
    fn parent_rotation_carries_child() {
        let parent = Rc::new(Node::new(
            ObjectTransforms::new().rotated(Vec3::new(0.0, 0.0, FRAC_PI_2)),
        ));
        let child = Node::child_of(&parent, ObjectTransforms::new().at(Vec3::new(1.0, 0.0, 0.0)));

        assert!(near(origin_of(&child), Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn three_levels_compose_innermost_first() {
        let root = Rc::new(Node::new(
            ObjectTransforms::new().rotated(Vec3::new(0.3, 0.0, 0.0)),
        ));
        let middle = Rc::new(Node::child_of(
            &root,
            ObjectTransforms::new().at(Vec3::new(0.0, 2.0, 0.0)).scaled(0.5),
        ));
        let leaf = Node::child_of(
            &middle,
            ObjectTransforms::new().rotated(Vec3::new(0.0, 1.1, 0.0)),
        );

        let expected = CONVENTION.then(
            CONVENTION.then(leaf.local_matrix(), middle.local_matrix()),
            root.local_matrix(),
        );
        assert!(leaf.global_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn moved_parent_needs_child_invalidation() {
        let parent = Rc::new(Node::new(ObjectTransforms::new().at(Vec3::new(1.0, 0.0, 0.0))));
        let child = Node::child_of(&parent, ObjectTransforms::new());
        assert!(near(origin_of(&child), Vec3::new(1.0, 0.0, 0.0)));

        parent.set_transforms(ObjectTransforms::new().at(Vec3::new(5.0, 0.0, 0.0)));
        // Still the cached matrix from before the move.
        assert!(near(origin_of(&child), Vec3::new(1.0, 0.0, 0.0)));

        child.invalidate_global_cache();
        assert!(near(origin_of(&child), Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn set_transforms_refreshes_own_matrices() {
        let node = Node::new(ObjectTransforms::new());
        assert_eq!(node.global_matrix(), Mat4::IDENTITY);

        node.set_transforms(ObjectTransforms::new().scaled(3.0));
        assert_eq!(node.local_matrix(), object_matrix(&ObjectTransforms::new().scaled(3.0)));
        assert_eq!(node.global_matrix(), node.local_matrix());
    }

    #[test]
    fn dropped_parent_leaves_a_root() {
        let parent = Rc::new(Node::new(ObjectTransforms::new().at(Vec3::new(4.0, 0.0, 0.0))));
        let child = Node::child_of(&parent, ObjectTransforms::new().at(Vec3::new(0.0, 1.0, 0.0)));
        drop(parent);

        assert!(child.parent().is_none());
        child.invalidate_cache();
        assert!(near(origin_of(&child), Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn reparenting_drops_cached_global() {
        let a = Rc::new(Node::new(ObjectTransforms::new().at(Vec3::new(1.0, 0.0, 0.0))));
        let b = Rc::new(Node::new(ObjectTransforms::new().at(Vec3::new(0.0, 0.0, 7.0))));
        let mut child = Node::child_of(&a, ObjectTransforms::new());
        assert!(near(origin_of(&child), Vec3::new(1.0, 0.0, 0.0)));

        child.set_parent(Some(&b));
        assert!(near(origin_of(&child), Vec3::new(0.0, 0.0, 7.0)));

        child.set_parent(None);
        assert!(near(origin_of(&child), Vec3::ZERO));
    }
}
