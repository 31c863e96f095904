use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::block::BlockId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldDims {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

impl WorldDims {
    pub const fn new(width: i32, height: i32, depth: i32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn volume(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize) * (self.depth.max(0) as usize)
    }

    pub fn contains(&self, pos: IVec3) -> bool {
        (0..self.width).contains(&pos.x)
            && (0..self.height).contains(&pos.y)
            && (0..self.depth).contains(&pos.z)
    }
}

impl Default for WorldDims {
    fn default() -> Self {
        Self::new(16, 8, 16)
    }
}

/// Dense, fixed-size block storage. Cell `(x, y, z)` covers the unit cube
/// starting at that corner.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    dims: WorldDims,
    blocks: Vec<BlockId>,
}

impl VoxelGrid {
    pub fn new(dims: WorldDims) -> Self {
        Self {
            dims,
            blocks: vec![BlockId::AIR; dims.volume()],
        }
    }

    pub fn dims(&self) -> WorldDims {
        self.dims
    }

    pub fn contains(&self, pos: IVec3) -> bool {
        self.dims.contains(pos)
    }

    pub fn get(&self, pos: IVec3) -> Option<BlockId> {
        pos_to_index(self.dims, pos).map(|index| self.blocks[index])
    }

    /// Returns the replaced block, or `None` when `pos` is outside the world.
    pub fn set(&mut self, pos: IVec3, block: BlockId) -> Option<BlockId> {
        let index = pos_to_index(self.dims, pos)?;
        Some(std::mem::replace(&mut self.blocks[index], block))
    }

    /// Out-of-bounds cells are solid so nothing can leave the world.
    pub fn is_solid(&self, pos: IVec3) -> bool {
        self.get(pos).map_or(true, |block| !block.is_air())
    }

    pub fn fill_layer(&mut self, y: i32, block: BlockId) {
        if !(0..self.dims.height).contains(&y) {
            return;
        }
        for z in 0..self.dims.depth {
            for x in 0..self.dims.width {
                self.set(IVec3::new(x, y, z), block);
            }
        }
    }

    pub fn iter_blocks(&self) -> impl Iterator<Item = (IVec3, BlockId)> + '_ {
        let dims = self.dims;
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.is_air())
            .map(move |(index, block)| (index_to_pos(dims, index), *block))
    }

    pub fn count_non_air(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_air()).count()
    }
}

pub fn pos_to_index(dims: WorldDims, pos: IVec3) -> Option<usize> {
    if !dims.contains(pos) {
        return None;
    }
    let (w, d) = (dims.width as usize, dims.depth as usize);
    Some(pos.x as usize + pos.z as usize * w + pos.y as usize * w * d)
}

pub fn index_to_pos(dims: WorldDims, index: usize) -> IVec3 {
    let (w, d) = (dims.width.max(1) as usize, dims.depth.max(1) as usize);
    let y = index / (w * d);
    let rem = index % (w * d);
    let z = rem / w;
    let x = rem % w;
    IVec3::new(x as i32, y as i32, z as i32)
}
