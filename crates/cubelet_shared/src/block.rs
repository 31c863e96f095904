use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of tiles stacked in the vertical texture strip.
pub const ATLAS_TILE_COUNT: u8 = 5;

#[repr(transparent)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: Self = Self(0);
    pub const GRASS: Self = Self(1);
    pub const DIRT: Self = Self(2);
    pub const STONE: Self = Self(3);
    pub const WOOD: Self = Self(4);
    pub const LEAVES: Self = Self(5);

    pub fn is_air(self) -> bool {
        self == Self::AIR
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockProperties {
    pub name: String,
    pub solid: bool,
    /// Tile index in the vertical strip, counted from the top.
    #[serde(default)]
    pub atlas_index: Option<u8>,
    pub color: [u8; 3],
}

/// Texture transform selecting one tile of the vertical strip.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AtlasUv {
    pub offset: [f32; 2],
    pub repeat: [f32; 2],
}

/// UV offset/repeat for a tile. Texture V grows upward, so tile 0 sits at the
/// highest offset.
pub fn atlas_uv(atlas_index: u8) -> Option<AtlasUv> {
    if atlas_index >= ATLAS_TILE_COUNT {
        return None;
    }
    let tile_height = 1.0 / f32::from(ATLAS_TILE_COUNT);
    let v_offset = f32::from(ATLAS_TILE_COUNT - 1 - atlas_index) * tile_height;
    Some(AtlasUv {
        offset: [0.0, v_offset],
        repeat: [1.0, tile_height],
    })
}

#[derive(Default, Debug, Clone)]
pub struct BlockRegistry {
    properties: Vec<BlockProperties>,
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn register(&mut self, props: BlockProperties) -> BlockId {
        if let Some(existing) = self.by_name.get(props.name.as_str()) {
            return *existing;
        }

        // The default set is tiny; anything past u16 is a programming error upstream.
        let id = BlockId(u16::try_from(self.properties.len()).unwrap_or(u16::MAX));
        self.by_name.insert(props.name.clone(), id);
        self.properties.push(props);
        id
    }

    /// Unknown ids fall back to air.
    pub fn get_properties(&self, id: BlockId) -> Option<&BlockProperties> {
        self.properties
            .get(usize::from(id.0))
            .or_else(|| self.properties.get(usize::from(BlockId::AIR.0)))
    }

    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: BlockId) -> &str {
        self.get_properties(id)
            .map(|props| props.name.as_str())
            .unwrap_or("air")
    }

    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get_properties(id).is_some_and(|props| props.solid)
    }

    /// Blocks in atlas order, top tile first.
    pub fn atlas_tiles(&self) -> Vec<(u8, BlockId, &BlockProperties)> {
        let mut tiles: Vec<_> = self
            .properties
            .iter()
            .enumerate()
            .filter_map(|(idx, props)| {
                let index = props.atlas_index?;
                let id = BlockId(u16::try_from(idx).ok()?);
                Some((index, id, props))
            })
            .collect();
        tiles.sort_by_key(|(index, _, _)| *index);
        tiles
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

pub fn register_default_blocks() -> BlockRegistry {
    fn block(name: &str, atlas_index: Option<u8>, color: [u8; 3]) -> BlockProperties {
        BlockProperties {
            name: name.to_string(),
            solid: atlas_index.is_some(),
            atlas_index,
            color,
        }
    }

    let mut registry = BlockRegistry::new();
    registry.register(block("air", None, [0, 0, 0]));
    registry.register(block("grass", Some(0), [0, 150, 0]));
    registry.register(block("dirt", Some(1), [139, 69, 19]));
    registry.register(block("stone", Some(2), [128, 128, 128]));
    registry.register(block("wood", Some(3), [160, 82, 45]));
    registry.register(block("leaves", Some(4), [0, 100, 0]));
    registry
}

#[cfg(test)]
mod tests {
    use super::{atlas_uv, register_default_blocks, BlockId, ATLAS_TILE_COUNT};

    #[test]
    fn registry_matches_block_constants() {
        let registry = register_default_blocks();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.get_by_name("air"), Some(BlockId::AIR));
        assert_eq!(registry.get_by_name("grass"), Some(BlockId::GRASS));
        assert_eq!(registry.get_by_name("dirt"), Some(BlockId::DIRT));
        assert_eq!(registry.get_by_name("stone"), Some(BlockId::STONE));
        assert_eq!(registry.get_by_name("wood"), Some(BlockId::WOOD));
        assert_eq!(registry.get_by_name("leaves"), Some(BlockId::LEAVES));

        assert!(!registry.is_solid(BlockId::AIR));
        assert!(registry.is_solid(BlockId::STONE));
        assert_eq!(
            registry
                .get_properties(BlockId::LEAVES)
                .and_then(|props| props.atlas_index),
            Some(4)
        );
    }

    #[test]
    fn unknown_ids_resolve_to_air() {
        let registry = register_default_blocks();
        assert_eq!(registry.name(BlockId(999)), "air");
        assert!(!registry.is_solid(BlockId(999)));
    }

    #[test]
    fn registering_a_known_name_returns_existing_id() {
        let mut registry = register_default_blocks();
        let props = registry
            .get_properties(BlockId::DIRT)
            .cloned()
            .expect("dirt registered");
        assert_eq!(registry.register(props), BlockId::DIRT);
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn atlas_uv_counts_tiles_from_the_top() {
        let grass = atlas_uv(0).expect("grass tile");
        assert!((grass.offset[1] - 0.8).abs() < 1e-6);
        assert!((grass.repeat[1] - 0.2).abs() < 1e-6);
        assert_eq!(grass.offset[0], 0.0);
        assert_eq!(grass.repeat[0], 1.0);

        let leaves = atlas_uv(4).expect("leaves tile");
        assert!(leaves.offset[1].abs() < 1e-6);

        assert!(atlas_uv(ATLAS_TILE_COUNT).is_none());
    }

    #[test]
    fn atlas_tiles_are_sorted_by_index() {
        let registry = register_default_blocks();
        let ids: Vec<BlockId> = registry
            .atlas_tiles()
            .into_iter()
            .map(|(_, id, _)| id)
            .collect();
        assert_eq!(
            ids,
            vec![
                BlockId::GRASS,
                BlockId::DIRT,
                BlockId::STONE,
                BlockId::WOOD,
                BlockId::LEAVES
            ]
        );
    }
}
