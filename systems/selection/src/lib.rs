#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted random choice of the sprite drawn for a new badge.

use std::collections::BTreeMap;

use lizard_hook_atlas::SpriteAtlas;
use lizard_hook_core::SpriteId;
use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};

/// Discrete sprite picker built against one atlas.
///
/// Never empty: when the configured names match nothing the selector spans
/// every atlas sprite uniformly, and an empty atlas yields sprite zero.
#[derive(Clone, Debug)]
pub struct WeightedSelector {
    entries: Vec<(SpriteId, f64)>,
    distribution: Option<WeightedIndex<f64>>,
}

impl WeightedSelector {
    /// Builds a selector from the configured names and weights.
    ///
    /// A non-empty `weighted` table takes precedence over `names`, which are
    /// otherwise picked with equal probability.
    #[must_use]
    pub fn build(atlas: &SpriteAtlas, names: &[String], weighted: &BTreeMap<String, f64>) -> Self {
        if weighted.is_empty() {
            Self::from_entries(
                atlas,
                names
                    .iter()
                    .map(|name| (name.as_str(), 1.0))
                    .collect::<Vec<_>>(),
            )
        } else {
            Self::from_entries(
                atlas,
                weighted
                    .iter()
                    .map(|(name, weight)| (name.as_str(), *weight))
                    .collect::<Vec<_>>(),
            )
        }
    }

    /// Selector spanning every sprite of the atlas with equal weight.
    #[must_use]
    pub fn uniform(atlas: &SpriteAtlas) -> Self {
        let count = u32::try_from(atlas.len()).unwrap_or(u32::MAX);
        let entries = if count == 0 {
            vec![(SpriteId::default(), 1.0)]
        } else {
            (0..count).map(|index| (SpriteId::new(index), 1.0)).collect()
        };
        Self::with_entries(entries)
    }

    fn from_entries(atlas: &SpriteAtlas, candidates: Vec<(&str, f64)>) -> Self {
        let mut entries = Vec::with_capacity(candidates.len());
        for (name, weight) in candidates {
            if !(weight.is_finite() && weight > 0.0) {
                tracing::warn!(sprite = name, weight, "ignoring non-positive sprite weight");
                continue;
            }
            match atlas.lookup(name) {
                Some(sprite) => entries.push((sprite, weight)),
                None => tracing::debug!(sprite = name, "sprite not present in atlas"),
            }
        }

        if entries.is_empty() {
            tracing::debug!("no configured sprite matched; selecting uniformly");
            return Self::uniform(atlas);
        }
        Self::with_entries(entries)
    }

    fn with_entries(entries: Vec<(SpriteId, f64)>) -> Self {
        let distribution = if entries.len() > 1 {
            match WeightedIndex::new(entries.iter().map(|(_, weight)| *weight)) {
                Ok(distribution) => Some(distribution),
                Err(error) => {
                    tracing::warn!(%error, "invalid sprite weights; using first entry");
                    None
                }
            }
        } else {
            None
        };
        Self {
            entries,
            distribution,
        }
    }

    /// Draws one sprite.
    pub fn sample<R>(&self, rng: &mut R) -> SpriteId
    where
        R: Rng + ?Sized,
    {
        let index = self
            .distribution
            .as_ref()
            .map_or(0, |distribution| distribution.sample(rng));
        self.entries
            .get(index)
            .map_or_else(SpriteId::default, |(sprite, _)| *sprite)
    }

    /// Candidate sprites and their weights.
    #[must_use]
    pub fn entries(&self) -> &[(SpriteId, f64)] {
        &self.entries
    }

    /// Number of candidate sprites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the selector holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_table_wins_over_names() {
        let atlas = SpriteAtlas::builtin();
        let names = vec!["\u{1F98E}".to_owned()];
        let weighted = BTreeMap::from([("\u{1F422}".to_owned(), 2.0)]);

        let selector = WeightedSelector::build(&atlas, &names, &weighted);

        assert_eq!(selector.entries(), &[(SpriteId::new(2), 2.0)]);
    }

    #[test]
    fn invalid_weights_are_dropped() {
        let atlas = SpriteAtlas::builtin();
        let weighted = BTreeMap::from([
            ("\u{1F98E}".to_owned(), f64::NAN),
            ("\u{1F40D}".to_owned(), -1.0),
            ("\u{1F422}".to_owned(), 0.5),
        ]);

        let selector = WeightedSelector::build(&atlas, &[], &weighted);

        assert_eq!(selector.entries(), &[(SpriteId::new(2), 0.5)]);
    }
}
