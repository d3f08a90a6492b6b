use std::borrow::Cow;

use glam::Affine3A;

use crate::scene::transform::Transform;

/// A minimal scene node: a name, a transform and a visibility flag.
///
/// Both detail models and composite LOD groups carry one. The caller's scene
/// graph decides where the node lives; [`parent_world`](Self::parent_world)
/// is how that placement is fed back so world positions stay correct.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Cow<'static, str>,
    /// Transform component (hot data accessed every frame)
    pub transform: Transform,
    /// Visibility flag
    pub visible: bool,
    /// World matrix of the parent node, `None` at the scene root
    pub parent_world: Option<Affine3A>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::new(),
            visible: true,
            parent_world: None,
        }
    }

    /// Recomputes the world matrix from the local TRS and the parent placement.
    pub fn sync_transform(&mut self) {
        self.transform.update_world_matrix(self.parent_world.as_ref());
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("Node")
    }
}
