//! Scene registry
//!
//! A flat id-keyed entity registry plus slotmap arenas for GPU geometry
//! and materials, so many entities can share one uploaded model.

pub mod entity;
pub mod transform;

pub use entity::{Entity, EntityId, PointLight};
pub use transform::Transform3D;

use slotmap::SlotMap;
use std::collections::HashMap;

use crate::render::material::Material;
use crate::render::model::Model;

slotmap::new_key_type! {
    /// Stable handle into the scene's geometry arena
    pub struct GeometryHandle;
    /// Stable handle into the scene's material arena
    pub struct MaterialHandle;
}

/// Owns every entity plus the shared geometry/material arenas
#[derive(Default)]
pub struct Scene {
    entities: HashMap<EntityId, Entity>,
    geometries: SlotMap<GeometryHandle, Model>,
    materials: SlotMap<MaterialHandle, Material>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh entity and return a mutable reference for setup
    pub fn create_entity(&mut self) -> &mut Entity {
        let entity = Entity::new();
        let id = entity.id();
        self.entities.entry(id).or_insert(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Remove an entity. The id is retired permanently; lookups for it
    /// return `None` from then on.
    pub fn erase(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Move an uploaded model into the arena, returning its handle
    pub fn add_geometry(&mut self, model: Model) -> GeometryHandle {
        self.geometries.insert(model)
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&Model> {
        self.geometries.get(handle)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_are_distinct() {
        let mut scene = Scene::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let id = scene.create_entity().id();
            assert!(seen.insert(id));
        }
        assert_eq!(scene.len(), 1000);
    }

    #[test]
    fn erased_ids_are_never_reused() {
        let mut scene = Scene::new();
        let mut retired = Vec::new();

        for round in 0..100 {
            let id = scene.create_entity().id();
            if round % 2 == 0 {
                assert!(scene.erase(id));
                retired.push(id);
            }
        }

        // New entities never resurrect a retired id
        for _ in 0..100 {
            let id = scene.create_entity().id();
            assert!(!retired.contains(&id));
        }
        for &id in &retired {
            assert!(scene.get(id).is_none());
        }
    }

    #[test]
    fn erase_of_unknown_id_is_a_no_op() {
        let mut scene = Scene::new();
        let id = scene.create_entity().id();
        assert!(scene.erase(id));
        assert!(!scene.erase(id));
    }

    #[test]
    fn get_mut_allows_component_edits() {
        let mut scene = Scene::new();
        let id = scene.create_entity().id();
        scene
            .get_mut(id)
            .unwrap()
            .make_point_light(2.0, 0.5, nalgebra::Vector3::new(1.0, 0.0, 0.0));

        let entity = scene.get(id).unwrap();
        assert!(entity.point_light.is_some());
        assert_eq!(entity.transform.scale.x, 0.5);
    }
}
