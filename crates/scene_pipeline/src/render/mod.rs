//! # Render Pipeline Core
//!
//! Everything between "this object is in the scene" and "this draw call is
//! issued", independent of any graphics API.
//!
//! ## Architecture
//!
//! - **RenderCommand**: Unit of drawing work with a pending state (written by
//!   the update thread) and a snapshot (read by the render thread)
//! - **RenderInfo**: Per-object visibility rule and owner of its commands
//! - **RenderCommandCollection**: Per-pass buckets, double buffered so one
//!   frame can be collected while the previous one renders
//! - **Camera**: Supplies the sort position and the culling frustum
//!
//! ## Frame Flow
//!
//! ```text
//! update thread:  query scene -> allow_render -> add_render_commands -> collection.add
//! render thread:  collection.render(pass) for each pass of the previous frame
//! between frames: collection.swap_buffers()
//! ```

mod camera;
mod collection;
mod command;
mod command_2d;
mod command_3d;
pub mod comparators;
mod info;
mod info_2d;
mod info_3d;

pub use camera::Camera;
pub use collection::RenderCommandCollection;
pub use command::{CommandFlags, CommandState, PassId, RenderCommand, SharedCommand, SortKey};
pub use command_2d::{Drawable2D, RenderCommand2D};
pub use command_3d::{Drawable3D, RenderCommand3D};
pub use comparators::CommandComparator;
pub use info::{RenderInfo, RenderInfoId};
pub use info_2d::RenderInfo2D;
pub use info_3d::RenderInfo3D;
