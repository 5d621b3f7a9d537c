#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sprite atlas loading for the Lizard Hook overlay.
//!
//! An atlas is a single texture plus a table of named UV rectangles. Atlases
//! are immutable once built; a configuration change produces a brand new
//! [`SpriteAtlas`] that replaces the previous one wholesale.

mod layout;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use image::{ImageError, RgbaImage};
use lizard_hook_core::{SpriteId, SpriteUv};
use thiserror::Error;

pub use self::layout::{description_sources, AtlasLayout, DescriptionSource};

const BUILTIN_TEXTURE_SIZE: u32 = 64;

/// Errors raised while building an atlas.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// The atlas image could not be decoded.
    #[error("failed to decode atlas image {}", .path.display())]
    Decode {
        /// Path of the image that failed to decode.
        path: PathBuf,
        /// Underlying decoder failure.
        #[source]
        source: ImageError,
    },
    /// An atlas description file exists but could not be read.
    #[error("failed to read atlas description {}", .path.display())]
    Read {
        /// Path of the unreadable description.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// An atlas description could not be parsed.
    #[error("malformed atlas description from {origin}")]
    Parse {
        /// Human readable origin of the description.
        origin: String,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Decoded RGBA8 texture with colour channels premultiplied by alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtlasTexture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl AtlasTexture {
    /// Wraps straight-alpha RGBA8 pixels, premultiplying them in place.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    #[must_use]
    pub fn from_straight_rgba(width: u32, height: u32, mut pixels: Vec<u8>) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height) * 4).ok()?;
        if pixels.len() != expected {
            return None;
        }
        premultiply(&mut pixels);
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut pixels = image.into_raw();
        premultiply(&mut pixels);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Texture width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Texture height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 pixel data in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

fn premultiply(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        let alpha = u16::from(pixel[3]);
        for channel in &mut pixel[..3] {
            *channel = (u16::from(*channel) * alpha / 255) as u8;
        }
    }
}

/// Immutable mapping from sprite names to UV rectangles of one texture.
#[derive(Clone, Debug)]
pub struct SpriteAtlas {
    texture: AtlasTexture,
    uvs: Vec<SpriteUv>,
    names: Vec<String>,
    lookup: HashMap<String, SpriteId>,
    source: Option<PathBuf>,
}

impl SpriteAtlas {
    /// Loads the atlas image at `image_path`, or the built-in atlas when `None`
    /// or when no file exists at that path.
    ///
    /// Decode failures are fatal. Description failures are not: the sources
    /// returned by [`description_sources`] are tried in order and the built-in
    /// layout is used when none of them yields a valid description.
    pub fn load(image_path: Option<&Path>) -> Result<Self, AtlasError> {
        Self::load_with_decoder(image_path, decode_image)
    }

    fn load_with_decoder(
        image_path: Option<&Path>,
        decoder: impl FnOnce(&Path) -> Result<AtlasTexture, AtlasError>,
    ) -> Result<Self, AtlasError> {
        let Some(path) = image_path else {
            return Ok(Self::builtin());
        };
        if !path.exists() {
            tracing::warn!(path = %path.display(), "atlas image not found, using built-in atlas");
            return Ok(Self::builtin());
        }

        let texture = decoder(path)?;
        let layout = AtlasLayout::resolve(&description_sources(Some(path)));
        let mut atlas = Self::from_parts(texture, layout);
        atlas.source = Some(path.to_path_buf());
        tracing::info!(
            path = %path.display(),
            sprites = atlas.len(),
            width = atlas.texture.width(),
            height = atlas.texture.height(),
            "loaded sprite atlas"
        );
        Ok(atlas)
    }

    /// Atlas backed by the generated in-memory texture and the built-in layout.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_parts(builtin_texture(), AtlasLayout::builtin())
    }

    /// Assembles an atlas from an already decoded texture and a layout.
    ///
    /// An empty layout is replaced by a single sprite covering the texture.
    #[must_use]
    pub fn from_parts(texture: AtlasTexture, layout: AtlasLayout) -> Self {
        let layout = if layout.is_empty() {
            AtlasLayout::single_default()
        } else {
            layout
        };

        let mut uvs = Vec::with_capacity(layout.len());
        let mut names = Vec::with_capacity(layout.len());
        let mut lookup = HashMap::with_capacity(layout.len());
        for (name, uv) in layout.into_entries() {
            let id = SpriteId::new(uvs.len() as u32);
            let _ = lookup.insert(name.clone(), id);
            names.push(name);
            uvs.push(uv);
        }

        Self {
            texture,
            uvs,
            names,
            lookup,
            source: None,
        }
    }

    /// Resolves a sprite name to its identifier.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SpriteId> {
        self.lookup.get(name).copied()
    }

    /// UV rectangle of the provided sprite.
    #[must_use]
    pub fn uv(&self, sprite: SpriteId) -> Option<SpriteUv> {
        self.uvs.get(sprite.index()).copied()
    }

    /// Ordered UV table indexed by [`SpriteId`].
    #[must_use]
    pub fn uvs(&self) -> &[SpriteUv] {
        &self.uvs
    }

    /// Name of the provided sprite.
    #[must_use]
    pub fn name(&self, sprite: SpriteId) -> Option<&str> {
        self.names.get(sprite.index()).map(String::as_str)
    }

    /// Number of sprites in the atlas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.uvs.len()
    }

    /// Reports whether the atlas holds no sprites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uvs.is_empty()
    }

    /// Texture the UV rectangles refer to.
    #[must_use]
    pub fn texture(&self) -> &AtlasTexture {
        &self.texture
    }

    /// Image path the atlas was loaded from; `None` for the built-in atlas.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn decode_image(path: &Path) -> Result<AtlasTexture, AtlasError> {
    let image = image::open(path).map_err(|source| AtlasError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(AtlasTexture::from_image(image.to_rgba8()))
}

/// Quadrant texture matching the built-in layout: green, amber, teal, empty.
fn builtin_texture() -> AtlasTexture {
    let half = BUILTIN_TEXTURE_SIZE / 2;
    let image = RgbaImage::from_fn(BUILTIN_TEXTURE_SIZE, BUILTIN_TEXTURE_SIZE, |x, y| {
        match (x < half, y < half) {
            (true, true) => image::Rgba([0x4c, 0xaf, 0x50, 0xff]),
            (false, true) => image::Rgba([0xff, 0xc1, 0x07, 0xff]),
            (true, false) => image::Rgba([0x26, 0xa6, 0x9a, 0xff]),
            (false, false) => image::Rgba([0, 0, 0, 0]),
        }
    });
    AtlasTexture::from_image(image)
}

/// Normalizes an atlas path so equivalent spellings compare equal.
///
/// Existing files are canonicalized; other paths are cleaned lexically.
#[must_use]
pub fn normalize_source(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.components().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn premultiplies_colour_channels() {
        let texture = AtlasTexture::from_straight_rgba(2, 1, vec![200, 100, 50, 128, 9, 9, 9, 0])
            .expect("dimensions match");
        assert_eq!(texture.pixels(), &[100, 50, 25, 128, 0, 0, 0, 0]);
    }

    #[test]
    fn rejects_mismatched_pixel_buffers() {
        assert!(AtlasTexture::from_straight_rgba(2, 2, vec![0; 12]).is_none());
    }

    #[test]
    fn builtin_atlas_exposes_three_named_sprites() {
        let atlas = SpriteAtlas::builtin();
        assert_eq!(atlas.len(), 3);
        assert_eq!(atlas.lookup("\u{1F98E}"), Some(SpriteId::new(0)));
        assert_eq!(atlas.uv(SpriteId::new(1)), Some(SpriteUv::new(0.5, 0.0, 1.0, 0.5)));
        assert_eq!(atlas.source(), None);
        assert_eq!(atlas.texture().width(), BUILTIN_TEXTURE_SIZE);
    }

    #[test]
    fn empty_layout_becomes_single_full_sprite() {
        let texture = AtlasTexture::from_straight_rgba(1, 1, vec![1, 2, 3, 255]).expect("1x1");
        let atlas = SpriteAtlas::from_parts(texture, AtlasLayout::default());
        assert_eq!(atlas.uvs(), &[SpriteUv::full()]);
        assert_eq!(atlas.name(SpriteId::new(0)), Some("\u{1F98E}"));
    }

    #[test]
    fn missing_image_uses_builtin_without_decoding() {
        let calls = Cell::new(0);
        let result = SpriteAtlas::load_with_decoder(
            Some(Path::new("definitely/not/here.png")),
            |_| {
                calls.set(calls.get() + 1);
                Ok(builtin_texture())
            },
        );
        let atlas = result.expect("missing image falls back");
        assert_eq!(atlas.source(), None);
        assert_eq!(atlas.len(), AtlasLayout::builtin().len());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn no_path_yields_builtin_atlas() {
        let atlas = SpriteAtlas::load(None).expect("builtin atlas always loads");
        assert_eq!(atlas.len(), AtlasLayout::builtin().len());
    }

    #[test]
    fn normalize_cleans_redundant_components() {
        let normalized = normalize_source(Path::new("assets/./atlas.png"));
        assert_eq!(normalized, PathBuf::from("assets/atlas.png"));
    }
}
