/// Page cursor over a server-side list.
///
/// Pages are 1-based. `total_pages` comes from the server `count`, so an
/// empty list has zero pages and every move is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    total_pages: u32,
    page_size: u32,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            total_pages: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Updates the page count from the server `count` (`ceil(count / page_size)`).
    ///
    /// A page past the new last page is pulled back to it; returns whether
    /// that happened, in which case the caller holds rows for a page that no
    /// longer exists.
    pub fn set_count(&mut self, count: u64) -> bool {
        let pages = count.div_ceil(u64::from(self.page_size));
        self.total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
        let last = self.total_pages.max(1);
        if self.page > last {
            self.page = last;
            return true;
        }
        false
    }

    /// Moves to `page` if it lies in `[1, total_pages]`; returns whether it moved.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page < 1 || page > self.total_pages || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.page.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        self.go_to(self.page.saturating_sub(1))
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Back to the first page, e.g. after the filter changed.
    pub fn rewind(&mut self) {
        self.page = 1;
    }
}
