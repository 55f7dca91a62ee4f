//! In-memory recipe cache, one LRU map per locale keyed by the raw reel link.
//! Unbounded unless a capacity is configured, so by default entries live for
//! the whole process.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use super::{Locale, RecipeText, ReelLink};

struct PerLocale {
    en: LruCache<ReelLink, RecipeText>,
    ru: LruCache<ReelLink, RecipeText>,
}

impl PerLocale {
    fn slot(&mut self, locale: Locale) -> &mut LruCache<ReelLink, RecipeText> {
        match locale {
            Locale::En => &mut self.en,
            Locale::Ru => &mut self.ru,
        }
    }
}

pub struct RecipeCache {
    inner: Mutex<PerLocale>,
}

impl RecipeCache {
    pub fn unbounded() -> Self {
        Self {
            inner: Mutex::new(PerLocale {
                en: LruCache::unbounded(),
                ru: LruCache::unbounded(),
            }),
        }
    }

    /// Bounds each locale's map to `capacity` reels.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(PerLocale {
                en: LruCache::new(capacity),
                ru: LruCache::new(capacity),
            }),
        }
    }

    /// `None` or zero means unbounded.
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => Self::with_capacity(capacity),
            None => Self::unbounded(),
        }
    }

    pub fn get(&self, locale: Locale, link: &ReelLink) -> Option<RecipeText> {
        let mut cache = self.inner.lock();
        cache.slot(locale).get(link.as_str()).cloned()
    }

    /// Inserts or overwrites. Callers decide whether overwriting is allowed.
    pub fn put(&self, locale: Locale, link: ReelLink, text: RecipeText) {
        let mut cache = self.inner.lock();
        cache.slot(locale).put(link, text);
    }

    pub fn contains(&self, locale: Locale, link: &ReelLink) -> bool {
        let mut cache = self.inner.lock();
        cache.slot(locale).contains(link.as_str())
    }

    /// Total entries across both locales.
    pub fn len(&self) -> usize {
        let cache = self.inner.lock();
        cache.en.len() + cache.ru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecipeCache {
    fn default() -> Self {
        Self::unbounded()
    }
}
