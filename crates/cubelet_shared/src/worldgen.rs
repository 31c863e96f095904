use glam::IVec3;
use tracing::info;

use crate::block::BlockId;
use crate::grid::{VoxelGrid, WorldDims};

#[derive(Debug, Clone, Copy, Default)]
pub struct WorldGenOptions {
    /// Adds a two-log tree capped with leaves next to the stone steps.
    pub sample_tree: bool,
}

pub fn ground_level(dims: WorldDims) -> i32 {
    dims.height / 3
}

/// Dirt below the ground level, a grass layer on top and a couple of stone
/// steps near the origin corner.
pub fn generate_flat(grid: &mut VoxelGrid, options: WorldGenOptions) {
    let dims = grid.dims();
    let ground = ground_level(dims);

    for y in 0..ground {
        grid.fill_layer(y, BlockId::DIRT);
    }
    if ground < dims.height {
        grid.fill_layer(ground, BlockId::GRASS);
    }

    let room_for_features = dims.width > 5 && dims.height > ground + 3 && dims.depth > 5;
    if room_for_features {
        grid.set(IVec3::new(1, ground + 1, 1), BlockId::STONE);
        grid.set(IVec3::new(2, ground + 1, 2), BlockId::STONE);
        grid.set(IVec3::new(2, ground + 2, 2), BlockId::STONE);

        if options.sample_tree && ground + 3 < dims.height {
            grid.set(IVec3::new(5, ground + 1, 5), BlockId::WOOD);
            grid.set(IVec3::new(5, ground + 2, 5), BlockId::WOOD);
            grid.set(IVec3::new(5, ground + 3, 5), BlockId::LEAVES);
        }
    }

    info!(
        ground_level = ground,
        blocks = grid.count_non_air(),
        "World generation complete"
    );
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::{generate_flat, ground_level, WorldGenOptions};
    use crate::block::BlockId;
    use crate::grid::{VoxelGrid, WorldDims};

    #[test]
    fn default_world_has_dirt_grass_and_stone_steps() {
        let dims = WorldDims::default();
        let mut grid = VoxelGrid::new(dims);
        generate_flat(&mut grid, WorldGenOptions::default());

        let ground = ground_level(dims);
        assert_eq!(ground, 2);
        assert_eq!(grid.get(IVec3::new(0, 0, 0)), Some(BlockId::DIRT));
        assert_eq!(grid.get(IVec3::new(15, 1, 15)), Some(BlockId::DIRT));
        assert_eq!(grid.get(IVec3::new(7, 2, 9)), Some(BlockId::GRASS));
        assert_eq!(grid.get(IVec3::new(7, 3, 9)), Some(BlockId::AIR));

        assert_eq!(grid.get(IVec3::new(1, 3, 1)), Some(BlockId::STONE));
        assert_eq!(grid.get(IVec3::new(2, 3, 2)), Some(BlockId::STONE));
        assert_eq!(grid.get(IVec3::new(2, 4, 2)), Some(BlockId::STONE));
        assert_eq!(grid.get(IVec3::new(5, 3, 5)), Some(BlockId::AIR));

        assert_eq!(grid.count_non_air(), 16 * 16 * 3 + 3);
    }

    #[test]
    fn sample_tree_is_optional() {
        let mut grid = VoxelGrid::new(WorldDims::default());
        generate_flat(&mut grid, WorldGenOptions { sample_tree: true });

        assert_eq!(grid.get(IVec3::new(5, 3, 5)), Some(BlockId::WOOD));
        assert_eq!(grid.get(IVec3::new(5, 4, 5)), Some(BlockId::WOOD));
        assert_eq!(grid.get(IVec3::new(5, 5, 5)), Some(BlockId::LEAVES));
    }

    #[test]
    fn small_worlds_skip_features() {
        let mut grid = VoxelGrid::new(WorldDims::new(4, 3, 4));
        generate_flat(&mut grid, WorldGenOptions { sample_tree: true });

        assert_eq!(ground_level(grid.dims()), 1);
        assert_eq!(grid.count_non_air(), 4 * 4 * 2);
        assert!(grid
            .iter_blocks()
            .all(|(_, block)| block == BlockId::DIRT || block == BlockId::GRASS));
    }
}
