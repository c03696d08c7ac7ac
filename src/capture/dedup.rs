use std::collections::HashSet;

#[derive(Debug)]
pub struct DedupFilter {
    seen: HashSet<String>,
    capacity: usize,
}

impl DedupFilter {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            capacity,
        }
    }

    pub fn seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn admit(&mut self, url: &str) {
        self.seen.insert(url.to_string());
        self.prune();
    }

    fn prune(&mut self) {
        if self.seen.len() > self.capacity {
            tracing::debug!(
                target: "capture",
                size = self.seen.len(),
                capacity = self.capacity,
                "dedup set over capacity; clearing"
            );
            self.seen.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admitted_urls_are_seen() {
        let mut filter = DedupFilter::new(10);
        assert!(!filter.seen("https://a/1.mp4"));
        filter.admit("https://a/1.mp4");
        assert!(filter.seen("https://a/1.mp4"));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn overflow_clears_everything() {
        let mut filter = DedupFilter::new(3);
        for i in 0..3 {
            filter.admit(&format!("https://a/{i}.mp4"));
        }
        assert_eq!(filter.len(), 3);
        filter.admit("https://a/3.mp4");
        assert!(filter.is_empty());
        assert!(!filter.seen("https://a/0.mp4"));
    }

    #[test]
    fn size_never_exceeds_capacity_after_admission() {
        let mut filter = DedupFilter::new(2_000);
        for i in 0..5_000 {
            filter.admit(&format!("https://cdn.example.com/{i}.ts"));
            assert!(filter.len() <= 2_000);
        }
    }
}
