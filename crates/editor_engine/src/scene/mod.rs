//! Scene world
//!
//! Owns the entities the manipulators act on. Everything outside this module
//! refers to entities by [`EntityId`] only; the world is the single owner of
//! entity data and keys are generational, so a stale id held by a
//! manipulator simply stops resolving.

pub mod world;

pub use world::{Aabb, EntityId, EntityKind, World};
