//! LRU cache of rendered page rasters, keyed by page index

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::types::PageData;

pub struct PageCache {
    cache: LruCache<usize, Arc<PageData>>,
}

impl PageCache {
    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, page: usize) -> Option<Arc<PageData>> {
        self.cache.get(&page).cloned()
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.cache.contains(&page)
    }

    /// Insert a page, returning the evicted page index if the cache was full
    pub fn insert(&mut self, data: Arc<PageData>) -> Option<usize> {
        let page = data.page_num;
        match self.cache.push(page, data) {
            Some((evicted, _)) if evicted != page => Some(evicted),
            _ => None,
        }
    }

    /// Clear all cached pages
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use image::RgbImage;

    use super::super::types::Viewport;
    use super::*;

    fn test_page_data(page: usize) -> Arc<PageData> {
        Arc::new(PageData {
            page_num: page,
            image: RgbImage::new(4, 4),
            viewport: Viewport::new([0.0, 0.0, 4.0, 4.0], 1.0),
        })
    }

    #[test]
    fn cache_insert_and_get() {
        let mut cache = PageCache::new(10);
        cache.insert(test_page_data(0));

        assert!(cache.contains(0));
        assert!(cache.get(0).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_lru_eviction_reports_evicted_page() {
        let mut cache = PageCache::new(2);

        assert_eq!(cache.insert(test_page_data(0)), None);
        assert_eq!(cache.insert(test_page_data(1)), None);
        assert_eq!(cache.insert(test_page_data(2)), Some(0));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(0));
        assert!(cache.contains(1));
        assert!(cache.contains(2));
    }

    #[test]
    fn get_keeps_a_page_from_being_evicted() {
        let mut cache = PageCache::new(2);
        cache.insert(test_page_data(0));
        cache.insert(test_page_data(1));

        assert!(cache.get(0).is_some());
        assert_eq!(cache.insert(test_page_data(2)), Some(1));
        assert!(cache.contains(0));
    }

    #[test]
    fn reinserting_a_page_replaces_it() {
        let mut cache = PageCache::new(2);
        cache.insert(test_page_data(3));
        assert_eq!(cache.insert(test_page_data(3)), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_invalidate_all() {
        let mut cache = PageCache::new(10);
        for i in 0..5 {
            cache.insert(test_page_data(i));
        }

        assert_eq!(cache.len(), 5);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        assert_eq!(PageCache::new(0).capacity(), 1);
    }
}
