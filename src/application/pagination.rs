//! Offset pagination with the clamp-to-last-page policy.

/// 1-based page number requested by a client.
///
/// A missing or non-numeric token resolves to page 1. Explicit numbers,
/// including zero, are passed through for [`PageWindow::resolve`] to clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageToken(pub u64);

impl PageToken {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) => value.trim().parse::<u64>().map(Self).unwrap_or(Self(1)),
            None => Self(1),
        }
    }

    pub fn first() -> Self {
        Self(1)
    }
}

/// Resolved window of a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub offset: u64,
    pub limit: u32,
}

impl PageWindow {
    /// Resolve a requested page against the collection size.
    ///
    /// Out-of-range requests clamp to the nearest valid page: zero and
    /// anything past the end both land on the last page. An empty collection
    /// still has one (empty) page, so callers never see an error here.
    pub fn resolve(total_items: u64, page_size: u32, requested: PageToken) -> Self {
        let limit = page_size.max(1);
        let size = u64::from(limit);
        let total_pages = total_items.div_ceil(size).max(1);
        let number = match requested.0 {
            0 => total_pages,
            n => n.min(total_pages),
        };

        Self {
            number,
            total_pages,
            total_items,
            offset: (number - 1) * size,
            limit,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }
}
