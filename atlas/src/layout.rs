use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use lizard_hook_core::{SpriteUv, DEFAULT_SPRITE_NAME};
use serde::Deserialize;

use crate::AtlasError;

/// File name searched for next to an atlas image when no adjacent description exists.
const DIRECTORY_DESCRIPTION: &str = "emoji_atlas.json";

/// Place an atlas description may be read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptionSource {
    /// `<image>.json` stored next to the image.
    Adjacent(PathBuf),
    /// Shared description stored in the image's directory.
    Directory(PathBuf),
    /// Layout compiled into the binary.
    Builtin,
}

/// Ordered list of description sources for an atlas image, highest priority first.
#[must_use]
pub fn description_sources(image_path: Option<&Path>) -> Vec<DescriptionSource> {
    let mut sources = Vec::with_capacity(3);
    if let Some(path) = image_path {
        let mut adjacent = path.as_os_str().to_owned();
        adjacent.push(".json");
        sources.push(DescriptionSource::Adjacent(PathBuf::from(adjacent)));

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        sources.push(DescriptionSource::Directory(
            directory.join(DIRECTORY_DESCRIPTION),
        ));
    }
    sources.push(DescriptionSource::Builtin);
    sources
}

/// Named UV rectangles in atlas order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AtlasLayout {
    entries: Vec<(String, SpriteUv)>,
}

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(default)]
    sprites: BTreeMap<String, SpriteUv>,
}

impl AtlasLayout {
    /// Layout used whenever no description file can be found or parsed.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                (
                    DEFAULT_SPRITE_NAME.to_owned(),
                    SpriteUv::new(0.0, 0.0, 0.5, 0.5),
                ),
                ("\u{1F40D}".to_owned(), SpriteUv::new(0.5, 0.0, 1.0, 0.5)),
                ("\u{1F422}".to_owned(), SpriteUv::new(0.0, 0.5, 0.5, 1.0)),
            ],
        }
    }

    pub(crate) fn single_default() -> Self {
        Self {
            entries: vec![(DEFAULT_SPRITE_NAME.to_owned(), SpriteUv::full())],
        }
    }

    /// Parses a `{"sprites": {"<name>": {"u0":..,"v0":..,"u1":..,"v1":..}}}` description.
    ///
    /// Sprites are ordered by name so indices are stable across loads.
    pub fn parse(contents: &str, origin: &str) -> Result<Self, AtlasError> {
        let description: Description =
            serde_json::from_str(contents).map_err(|source| AtlasError::Parse {
                origin: origin.to_owned(),
                source,
            })?;
        Ok(Self {
            entries: description.sprites.into_iter().collect(),
        })
    }

    /// Walks `sources` top-down and returns the first layout that loads.
    pub fn resolve(sources: &[DescriptionSource]) -> Self {
        for source in sources {
            let path = match source {
                DescriptionSource::Adjacent(path) | DescriptionSource::Directory(path) => path,
                DescriptionSource::Builtin => {
                    tracing::debug!("using built-in atlas layout");
                    return Self::builtin();
                }
            };
            if !path.exists() {
                continue;
            }
            match Self::read(path) {
                Ok(layout) => {
                    tracing::debug!(
                        path = %path.display(),
                        sprites = layout.len(),
                        "using atlas description"
                    );
                    return layout;
                }
                Err(error) => {
                    tracing::warn!(%error, "skipping atlas description");
                }
            }
        }
        Self::builtin()
    }

    fn read(path: &Path) -> Result<Self, AtlasError> {
        let contents = fs::read_to_string(path).map_err(|source| AtlasError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Number of sprites described.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the layout describes no sprites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, SpriteUv)> {
        self.entries
    }
}
