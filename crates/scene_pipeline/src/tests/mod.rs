//! Cross-module scenario tests
//!
//! Unit tests live next to their modules; these exercise the transform tree
//! and the render pipeline together, including multi-threaded use.
