//! Transform hierarchy
//!
//! A tree of spatial transforms that lazily computes and caches local,
//! world, inverse-local and inverse-world matrices.
//!
//! ## Architecture
//!
//! - **MatrixCache**: value + dirty flag, recomputed on read
//! - **TransformNode**: arena slot holding local SRT, composition order and four caches
//! - **TransformTree**: the arena; owns structure, invalidation and notifications
//!
//! Changing a local transform marks the node's local caches dirty and then
//! pushes world invalidation down the whole subtree. Reads re-establish
//! `world == parent.world * local` lazily.

mod composition;
mod error;
mod events;
mod matrix_cache;
mod node;
mod tree;

pub use composition::{compose_with, ComposeFn, CompositionOrder};
pub use error::TransformError;
pub use events::{MatrixChanged, MatrixKind, MatrixListener, SubscriptionId};
pub use matrix_cache::MatrixCache;
pub use node::{CacheStats, InverseMatrix, TransformNode};
pub use tree::{TransformResult, TransformTree};
