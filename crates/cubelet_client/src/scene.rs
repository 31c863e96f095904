use cubelet_shared::block::{BlockId, BlockRegistry};
use cubelet_shared::grid::VoxelGrid;
use glam::IVec3;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::materials::{Material, MaterialCache};

/// One unit cube to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockInstance {
    pub block: BlockId,
    pub material: Material,
}

/// Drawable mirror of the voxel grid, keyed by cell.
#[derive(Debug, Default)]
pub struct BlockScene {
    instances: FxHashMap<IVec3, BlockInstance>,
}

impl BlockScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(
        &mut self,
        grid: &VoxelGrid,
        registry: &BlockRegistry,
        materials: &mut MaterialCache,
    ) -> usize {
        self.instances.clear();
        for (pos, block) in grid.iter_blocks() {
            self.insert(pos, block, registry, materials);
        }
        debug!(instances = self.instances.len(), "Scene rebuilt");
        self.instances.len()
    }

    /// Returns false for blocks with nothing to draw.
    pub fn insert(
        &mut self,
        pos: IVec3,
        block: BlockId,
        registry: &BlockRegistry,
        materials: &mut MaterialCache,
    ) -> bool {
        let Some(material) = materials.material_for(block, registry) else {
            return false;
        };
        self.instances.insert(pos, BlockInstance { block, material });
        true
    }

    pub fn remove(&mut self, pos: IVec3) -> Option<BlockInstance> {
        self.instances.remove(&pos)
    }

    pub fn get(&self, pos: IVec3) -> Option<&BlockInstance> {
        self.instances.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use cubelet_shared::block::{register_default_blocks, BlockId};
    use cubelet_shared::grid::{VoxelGrid, WorldDims};
    use cubelet_shared::worldgen::{generate_flat, WorldGenOptions};
    use glam::IVec3;

    use super::BlockScene;
    use crate::materials::{AtlasStatus, MaterialCache};

    #[test]
    fn rebuild_mirrors_every_block() {
        let registry = register_default_blocks();
        let mut materials = MaterialCache::new(AtlasStatus::Loaded);
        let mut grid = VoxelGrid::new(WorldDims::default());
        generate_flat(&mut grid, WorldGenOptions::default());

        let mut scene = BlockScene::new();
        let count = scene.rebuild(&grid, &registry, &mut materials);
        assert_eq!(count, grid.count_non_air());
        assert_eq!(
            scene.get(IVec3::new(2, 4, 2)).map(|instance| instance.block),
            Some(BlockId::STONE)
        );
        assert_eq!(materials.len(), 3);
    }

    #[test]
    fn insert_and_remove_track_edits() {
        let registry = register_default_blocks();
        let mut materials = MaterialCache::new(AtlasStatus::Missing);
        let mut scene = BlockScene::new();
        let pos = IVec3::new(4, 3, 4);

        assert!(!scene.insert(pos, BlockId::AIR, &registry, &mut materials));
        assert!(scene.is_empty());
        assert!(scene.insert(pos, BlockId::WOOD, &registry, &mut materials));
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.remove(pos).map(|instance| instance.block), Some(BlockId::WOOD));
        assert!(scene.remove(pos).is_none());
    }
}
