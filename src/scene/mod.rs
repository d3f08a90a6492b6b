//! Scene node primitives.
//!
//! - [`Node`]: named node with visibility and a parent placement
//! - [`Transform`]: position, rotation and scale with cached matrices

pub mod node;
pub mod transform;

pub use node::Node;
pub use transform::Transform;
