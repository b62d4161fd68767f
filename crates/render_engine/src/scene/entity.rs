//! Scene entities
//!
//! Flat entity records with process-wide unique ids. Entities are owned by
//! the `Scene` registry and referenced by id; they are never cloned.

use nalgebra::Vector3;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::scene::transform::Transform3D;
use crate::scene::{GeometryHandle, MaterialHandle};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Unique entity identifier, monotonic for the process lifetime and
/// never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Point light component; the emitter radius is carried by the entity's
/// transform scale
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub intensity: f32,
}

/// A renderable or light-emitting object in the scene
pub struct Entity {
    id: EntityId,
    pub transform: Transform3D,
    pub color: Vector3<f32>,
    pub geometry: Option<GeometryHandle>,
    pub material: Option<MaterialHandle>,
    pub point_light: Option<PointLight>,
}

impl Entity {
    pub(crate) fn new() -> Self {
        Self {
            id: EntityId::next(),
            transform: Transform3D::default(),
            color: Vector3::new(1.0, 1.0, 1.0),
            geometry: None,
            material: None,
            point_light: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Configure this entity as a point light emitter
    pub fn make_point_light(&mut self, intensity: f32, radius: f32, color: Vector3<f32>) {
        self.color = color;
        self.transform.scale.x = radius;
        self.point_light = Some(PointLight { intensity });
    }
}
