use crate::github::Repository;

/// Round-robin position over the current repository list.
///
/// The list is dropped after its last repository is processed so that the
/// next tick lists repositories again. Nothing here is persisted.
#[derive(Debug, Default)]
pub struct CrawlCursor {
    repositories: Vec<Repository>,
    next: usize,
    low_quota: bool,
}

impl CrawlCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the next tick has to list repositories first.
    pub fn needs_listing(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Replace the list and point at its first entry.
    pub fn reset(&mut self, repositories: Vec<Repository>) {
        self.repositories = repositories;
        self.next = 0;
    }

    pub fn current(&self) -> Option<&Repository> {
        self.repositories.get(self.next)
    }

    pub fn position(&self) -> usize {
        self.next
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Move past the current repository, discarding the list at its end.
    pub fn advance(&mut self) {
        if self.next + 1 >= self.repositories.len() {
            self.repositories.clear();
            self.next = 0;
        } else {
            self.next += 1;
        }
    }

    /// Mark quota as low. Returns `true` only on the transition into low.
    pub fn enter_low_quota(&mut self) -> bool {
        !std::mem::replace(&mut self.low_quota, true)
    }

    pub fn leave_low_quota(&mut self) {
        self.low_quota = false;
    }

    pub fn is_low_quota(&self) -> bool {
        self.low_quota
    }
}
