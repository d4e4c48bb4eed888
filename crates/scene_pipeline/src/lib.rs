//! # Scene Pipeline
//!
//! Runtime core of a 3D scene: a transform hierarchy with lazily cached
//! matrices, and a double-buffered render command pipeline that lets one
//! frame be collected while the previous one renders.
//!
//! ## Features
//!
//! - **Transform Tree**: Local, world and inverse matrices recomputed on demand
//! - **Render Commands**: Pending/snapshot state, z-index and camera distance sorting
//! - **Render Infos**: Per-object visibility rules kept in sync with a spatial index
//! - **Pass Collections**: Per-pass buckets with constant-time buffer swap
//! - **Configuration**: Pass layout and logging from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use scene_pipeline::prelude::*;
//!
//! struct Sprite;
//!
//! impl Drawable2D for Sprite {
//!     type State = Vec2;
//!
//!     fn draw(&self, position: &Vec2, _shadow_pass: bool) {
//!         println!("sprite at {position:?}");
//!     }
//! }
//!
//! let config = PipelineConfig::default();
//! let passes = RenderCommandCollection::from_config(&config.passes, false);
//!
//! let scene = VisualScene::new("hud");
//! let mut info = RenderInfo2D::new().with_command(RenderCommand2D::shared(2, 0, Sprite, Vec2::zeros()));
//! info.set_scene(Some(Arc::clone(&scene)));
//!
//! if info.allow_render(None, &passes, None) {
//!     info.add_render_commands(&passes, None);
//! }
//! passes.swap_buffers();
//! assert_eq!(passes.render_all(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod transform;
pub mod scene;
pub mod render;

#[cfg(test)]
mod tests;

/// Common imports for pipeline users
pub mod prelude {
    pub use crate::{
        config::{Config, PassConfig, PipelineConfig, SortMode},
        foundation::{
            collections::NodeId,
            math::{Mat4, Quat, Vec2, Vec3},
        },
        render::{
            Camera, Drawable2D, Drawable3D, PassId, RenderCommand, RenderCommand2D,
            RenderCommand3D, RenderCommandCollection, RenderInfo, RenderInfo2D, RenderInfo3D,
            SharedCommand,
        },
        scene::{CullingVolume, EntityId, Rect, VisualScene, AABB},
        transform::{CompositionOrder, MatrixChanged, TransformError, TransformTree},
    };
}
