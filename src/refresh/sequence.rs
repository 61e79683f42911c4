use dashmap::DashMap;

/// Per-resource request counter.
///
/// Each request takes a ticket with [`begin`](Self::begin); its response may
/// only be applied while [`is_latest`](Self::is_latest) still holds.
#[derive(Debug, Default)]
pub struct SequenceGuard {
    latest: DashMap<String, u64>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, resource: &str) -> u64 {
        let mut entry = self.latest.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn is_latest(&self, resource: &str, ticket: u64) -> bool {
        self.latest
            .get(resource)
            .is_some_and(|latest| *latest == ticket)
    }
}
