//! Procedural terrain synthesis: fractal noise fields, radially blended height
//! samplers, raster heightmaps and biome-driven vertex coloring.
//!
//! Heights come from a [`HeightBlender`] over any number of [`HeightSampler`]s,
//! each wrapping a [`HeightSource`] with a smoothstep falloff. Colors come from
//! a [`ColorClassifier`] that mixes arid and humid gradients by a biome
//! [`NoiseField`]. [`TerrainTileManager`] ties both together over a grid of
//! chunks.

mod async_generation;
mod blend;
mod chunk;
mod error;
mod height_sampler;
mod height_source;
mod noise_field;
mod pipeline;
mod preview;
mod raster;
mod tile_manager;
mod value_noise;

pub mod color;
pub mod seed;

pub use async_generation::{AsyncChunkBuilder, ChunkTask, RebuiltChunk};
pub use blend::{HeightBlender, blend_height};
pub use chunk::{ChunkGrid, ChunkSamples, rebuild_chunk, rebuild_chunk_parallel};
pub use color::{ColorClassifier, ColorGradient, ColorStop, Hsl, Rgb, interpolate_hsl};
pub use error::TerrainError;
pub use height_sampler::HeightSampler;
pub use height_source::{BumpSource, ConstantSource, HeightSource, smootherstep, smoothstep};
pub use noise_field::{NoiseBasis, NoiseConfig, NoiseField, remap_unit};
pub use pipeline::{TerrainPipeline, VertexSample};
pub use preview::{PreviewImage, render_color_preview, render_height_preview};
pub use raster::{RasterHeightSource, RasterPlacement};
pub use tile_manager::{
    BASE_INNER_RADIUS, BASE_OUTER_RADIUS, ChunkKey, TerrainChunk, TerrainTileManager,
};
pub use value_noise::ValueNoise;
