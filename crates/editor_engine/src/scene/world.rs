//! Entity storage and transform access

use slotmap::SlotMap;

use crate::foundation::math::{Quat, Transform, Vec3};

slotmap::new_key_type! {
    /// Stable, generational handle to an entity in a [`World`].
    pub struct EntityId;
}

/// Broad classification of an entity, used by manipulator capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A regular placeable object.
    Object,
    /// The terrain; not draggable or rotatable.
    Terrain,
    /// The sky dome; not draggable or rotatable.
    Sky,
    /// A camera entity.
    Camera,
}

/// Axis-aligned bounding box in local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box spanning `min` to `max`.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centered on the origin with the given half extent on every axis.
    pub fn from_half_extent(half_extent: f32) -> Self {
        Self {
            min: Vec3::new(-half_extent, -half_extent, -half_extent),
            max: Vec3::new(half_extent, half_extent, half_extent),
        }
    }

    /// Center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::from_half_extent(0.5)
    }
}

#[derive(Debug, Clone)]
struct EntityRecord {
    kind: EntityKind,
    transform: Transform,
    bounds: Aabb,
}

/// Owner of all scene entities.
#[derive(Default)]
pub struct World {
    entities: SlotMap<EntityId, EntityRecord>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity and return its handle.
    pub fn spawn(&mut self, kind: EntityKind, transform: Transform, bounds: Aabb) -> EntityId {
        let id = self.entities.insert(EntityRecord {
            kind,
            transform,
            bounds,
        });
        log::debug!("spawned {kind:?} entity {id:?}");
        id
    }

    /// Remove an entity. Stale handles held elsewhere stop resolving.
    pub fn despawn(&mut self, id: EntityId) {
        if self.entities.remove(id).is_some() {
            log::debug!("despawned entity {id:?}");
        }
    }

    /// `true` if the handle still resolves.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// `true` if the world holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Classification of an entity.
    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entities.get(id).map(|e| e.kind)
    }

    /// World-space position of an entity.
    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(id).map(|e| e.transform.position)
    }

    /// Move an entity. No-op for a stale handle.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.transform.position = position;
        }
    }

    /// Orientation of an entity.
    pub fn orientation(&self, id: EntityId) -> Option<Quat> {
        self.entities.get(id).map(|e| e.transform.rotation)
    }

    /// Rotate an entity. No-op for a stale handle.
    pub fn set_orientation(&mut self, id: EntityId, orientation: Quat) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.transform.rotation = orientation;
        }
    }

    /// Local-space bounding box of an entity.
    pub fn bounding_box(&self, id: EntityId) -> Option<Aabb> {
        self.entities.get(id).map(|e| e.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_access() {
        let mut world = World::new();
        let id = world.spawn(
            EntityKind::Object,
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            Aabb::default(),
        );
        assert!(world.contains(id));
        assert_eq!(world.kind(id), Some(EntityKind::Object));
        assert_eq!(world.position(id), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_stale_handle_stops_resolving() {
        let mut world = World::new();
        let id = world.spawn(EntityKind::Object, Transform::identity(), Aabb::default());
        world.despawn(id);
        assert!(!world.contains(id));
        assert_eq!(world.position(id), None);
        // Writes through a stale handle are silently ignored.
        world.set_position(id, Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(world.position(id), None);
    }

    #[test]
    fn test_bounding_box_center() {
        let aabb = Aabb::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::new(3.0, 2.0, 5.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 1.0, 3.0));
    }
}
