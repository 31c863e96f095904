use std::env;
use std::path::Path;

use cubelet_shared::block::{register_default_blocks, BlockRegistry, ATLAS_TILE_COUNT};
use image::{Rgba, RgbaImage};

const TILE_SIZE: u32 = 16;

fn main() {
    let output = env::args().nth(1).unwrap_or_else(|| "atlas.png".to_string());

    if let Err(err) = run(Path::new(&output)) {
        eprintln!("atlas_generator error: {err}");
        std::process::exit(1);
    }
}

fn run(output: &Path) -> Result<(), String> {
    let registry = register_default_blocks();
    let atlas = build_atlas(&registry);
    atlas
        .save(output)
        .map_err(|err| format!("failed to write {}: {err}", output.display()))?;

    println!(
        "Wrote {}x{} atlas with {} tiles -> {}",
        atlas.width(),
        atlas.height(),
        registry.atlas_tiles().len(),
        output.display()
    );
    Ok(())
}

/// One tile per atlas index, stacked top to bottom. Indices without a block
/// stay transparent.
fn build_atlas(registry: &BlockRegistry) -> RgbaImage {
    let mut atlas = RgbaImage::new(TILE_SIZE, TILE_SIZE * u32::from(ATLAS_TILE_COUNT));
    for (index, _, props) in registry.atlas_tiles() {
        if index >= ATLAS_TILE_COUNT {
            continue;
        }
        let [r, g, b] = props.color;
        let top = u32::from(index) * TILE_SIZE;
        for y in top..top + TILE_SIZE {
            for x in 0..TILE_SIZE {
                atlas.put_pixel(x, y, Rgba([r, g, b, 255]));
            }
        }
    }
    atlas
}
