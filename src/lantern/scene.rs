use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Spheres point into `materials` by index, so editing a material changes
/// every sphere that uses it.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sphere {
    pub position: Vector3<f32>,
    pub radius: f32,
    pub material_index: usize,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            radius: 0.5,
            material_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub albedo: Vector3<f32>,
    pub roughness: f32,
    // not read by the diffuse bounce yet
    pub metallic: f32,
    pub emission_color: Vector3<f32>,
    pub emission_power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vector3::new(1.0, 1.0, 1.0),
            roughness: 1.0,
            metallic: 0.0,
            emission_color: Vector3::zeros(),
            emission_power: 0.0,
        }
    }
}

impl Material {
    pub fn emission(&self) -> Vector3<f32> {
        self.emission_color * self.emission_power
    }
}

impl Scene {
    /// Pink ball resting on a huge blue ground sphere, lit by a big orange emitter.
    pub fn showcase() -> Self {
        let mut scene = Self::default();

        let pink = scene.add_material(Material {
            albedo: Vector3::new(1.0, 0.0, 1.0),
            roughness: 0.0,
            ..Default::default()
        });
        let blue = scene.add_material(Material {
            albedo: Vector3::new(0.2, 0.3, 1.0),
            roughness: 0.2,
            ..Default::default()
        });
        let orange_albedo = Vector3::new(0.8, 0.5, 0.2);
        let orange = scene.add_material(Material {
            albedo: orange_albedo,
            roughness: 0.1,
            emission_color: orange_albedo,
            emission_power: 3.65,
            ..Default::default()
        });

        scene.add_sphere(Sphere {
            position: Vector3::zeros(),
            radius: 1.0,
            material_index: pink,
        });
        scene.add_sphere(Sphere {
            position: Vector3::new(0.0, -101.0, 0.0),
            radius: 100.0,
            material_index: blue,
        });
        scene.add_sphere(Sphere {
            position: Vector3::new(9.2, -1.2, -9.6),
            radius: 9.2,
            material_index: orange,
        });

        scene
    }

    /// Returns the index the new material can be referenced by.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_sphere(&mut self, sphere: Sphere) -> usize {
        self.spheres.push(sphere);
        self.spheres.len() - 1
    }

    /// Checks that every sphere points at an existing material.
    pub fn validate(&self) -> Result<(), RenderError> {
        let material_count = self.materials.len();

        match self
            .spheres
            .iter()
            .position(|sphere| sphere.material_index >= material_count)
        {
            Some(sphere) => Err(RenderError::InvalidMaterialIndex {
                sphere,
                material_index: self.spheres[sphere].material_index,
                material_count,
            }),
            None => Ok(()),
        }
    }
}
