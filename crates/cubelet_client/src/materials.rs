use cubelet_shared::block::{atlas_uv, AtlasUv, BlockId, BlockRegistry};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Flat color used for every block while the atlas is unavailable.
pub const FALLBACK_COLOR: u32 = 0xcccccc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Textured { atlas_index: u8, uv: AtlasUv },
    Fallback { color: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasStatus {
    Loaded,
    Missing,
}

#[derive(Debug)]
pub struct MaterialCache {
    atlas: AtlasStatus,
    materials: FxHashMap<BlockId, Material>,
    warned_fallback: bool,
}

impl MaterialCache {
    pub fn new(atlas: AtlasStatus) -> Self {
        Self {
            atlas,
            materials: FxHashMap::default(),
            warned_fallback: false,
        }
    }

    pub fn atlas_status(&self) -> AtlasStatus {
        self.atlas
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Air and blocks with no atlas tile have no material.
    pub fn material_for(&mut self, block: BlockId, registry: &BlockRegistry) -> Option<Material> {
        if let Some(material) = self.materials.get(&block) {
            return Some(*material);
        }

        let atlas_index = registry.get_properties(block)?.atlas_index?;
        let material = match (self.atlas, atlas_uv(atlas_index)) {
            (AtlasStatus::Loaded, Some(uv)) => Material::Textured { atlas_index, uv },
            _ => {
                if !self.warned_fallback {
                    warn!(
                        "Block atlas unavailable, using flat #{FALLBACK_COLOR:06x} materials"
                    );
                    self.warned_fallback = true;
                }
                Material::Fallback {
                    color: FALLBACK_COLOR,
                }
            }
        };
        self.materials.insert(block, material);
        Some(material)
    }
}

#[cfg(test)]
mod tests {
    use cubelet_shared::block::{atlas_uv, register_default_blocks, BlockId};

    use super::{AtlasStatus, Material, MaterialCache, FALLBACK_COLOR};

    #[test]
    fn textured_materials_use_the_block_tile() {
        let registry = register_default_blocks();
        let mut cache = MaterialCache::new(AtlasStatus::Loaded);

        let stone = cache.material_for(BlockId::STONE, &registry);
        assert_eq!(
            stone,
            Some(Material::Textured {
                atlas_index: 2,
                uv: atlas_uv(2).expect("stone tile"),
            })
        );
        assert_eq!(cache.material_for(BlockId::STONE, &registry), stone);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn air_has_no_material() {
        let registry = register_default_blocks();
        let mut cache = MaterialCache::new(AtlasStatus::Loaded);
        assert_eq!(cache.material_for(BlockId::AIR, &registry), None);
        assert_eq!(cache.material_for(BlockId(77), &registry), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn missing_atlas_falls_back_to_flat_color() {
        let registry = register_default_blocks();
        let mut cache = MaterialCache::new(AtlasStatus::Missing);
        let fallback = Some(Material::Fallback {
            color: FALLBACK_COLOR,
        });

        assert_eq!(cache.material_for(BlockId::GRASS, &registry), fallback);
        assert_eq!(cache.material_for(BlockId::LEAVES, &registry), fallback);
        assert_eq!(cache.len(), 2);
    }
}
