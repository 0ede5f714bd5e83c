//! Category matcher
//!
//! Maps a (style, trait) pair onto one stored category. Categories whose
//! traits mention either label are preferred; the pick among candidates is
//! random. Never returns an empty name.

use persona_common::db::list_categories;
use persona_common::db::models::{CategoryRecord, CategorySource, DEFAULT_CATEGORY};
use persona_common::{Label, StyleLabel, TraitLabel};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Matcher result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedCategory {
    pub name: String,
    pub source: CategorySource,
}

impl MatchedCategory {
    fn default_category() -> Self {
        Self {
            name: DEFAULT_CATEGORY.to_string(),
            source: CategorySource::Default,
        }
    }
}

/// Pick a category from `categories`
///
/// Returns `None` only when there is nothing usable to pick from.
pub fn choose_category<'a, R: Rng + ?Sized>(
    categories: &'a [CategoryRecord],
    style: StyleLabel,
    trait_label: TraitLabel,
    rng: &mut R,
) -> Option<&'a CategoryRecord> {
    let usable: Vec<&CategoryRecord> = categories
        .iter()
        .filter(|c| !c.name.trim().is_empty())
        .collect();

    let labels = [style.as_str(), trait_label.as_str()];
    let preferred: Vec<&CategoryRecord> = usable
        .iter()
        .copied()
        .filter(|c| c.has_affinity(&labels))
        .collect();

    let pool = if preferred.is_empty() { &usable } else { &preferred };
    pool.choose(rng).copied()
}

/// Category matcher over the shared reference table
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    pool: SqlitePool,
}

impl CategoryMatcher {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn match_category<R: Rng + ?Sized>(
        &self,
        style: StyleLabel,
        trait_label: TraitLabel,
        rng: &mut R,
    ) -> MatchedCategory {
        let categories = match list_categories(&self.pool).await {
            Ok(categories) => categories,
            Err(e) => {
                warn!(error = %e, "Category lookup failed, using default category");
                return MatchedCategory::default_category();
            }
        };

        match choose_category(&categories, style, trait_label, rng) {
            Some(record) => {
                debug!(
                    category = %record.name,
                    style = %style,
                    trait_label = %trait_label,
                    "Matched category"
                );
                MatchedCategory {
                    name: record.name.clone(),
                    source: CategorySource::Matched,
                }
            }
            None => {
                debug!("Category store is empty, using default category");
                MatchedCategory::default_category()
            }
        }
    }
}
