//! Cumulative "load more" shared by the list panels.
//!
//! While the accumulated size fits under the page cap, "load more" refetches
//! from the start with a larger `first` and the answer replaces the visible
//! rows. Once that size would exceed the cap, the next page is fetched after
//! the last visible cursor and appended instead.

use std::collections::HashSet;

use crate::pagination::{Connection, PageInfo};

/// Row of a list panel, deduplicated by id.
pub trait PanelRow {
    fn row_id(&self) -> &str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadMoreMode {
    /// Refetch from the start; the answer replaces the visible rows
    Refetch,
    /// Fetch after the last visible cursor; the answer is appended
    Append,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub first: u64,
    pub after: Option<String>,
    pub mode: LoadMoreMode,
    /// Where the visible rows ended when the window was issued
    pub previous_end_cursor: String,
    /// Rows expected to be visible once the answer is applied
    pub target_count: u64,
}

#[derive(Clone, Debug)]
pub struct CumulativePages<T> {
    page_size: u64,
    max_page_size: u64,
    visible: Option<Connection<T>>,
}

impl<T: PanelRow> CumulativePages<T> {
    pub fn new(page_size: u64, max_page_size: u64) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            page_size: page_size.clamp(1, max_page_size),
            max_page_size,
            visible: None,
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    pub fn visible(&self) -> Option<&Connection<T>> {
        self.visible.as_ref()
    }

    pub fn visible_count(&self) -> u64 {
        self.visible
            .as_ref()
            .map(|page| page.edges.len() as u64)
            .unwrap_or(0)
    }

    pub fn page_info(&self) -> Option<&PageInfo> {
        self.visible.as_ref().map(|page| &page.page_info)
    }

    pub fn has_more(&self) -> bool {
        self.page_info().map(|info| info.has_next_page).unwrap_or(false)
    }

    /// `None` until a page is loaded, or once everything is visible.
    pub fn next_window(&self, page_size: u64) -> Option<PageWindow> {
        let info = self.page_info()?;
        if !info.has_next_page {
            return None;
        }
        let previous_end_cursor = info.end_cursor.clone()?;
        let page_size = page_size.clamp(1, self.max_page_size);
        let target_count = self.visible_count() + page_size;
        let (first, after, mode) = if target_count <= self.max_page_size {
            (target_count, None, LoadMoreMode::Refetch)
        } else {
            (
                page_size,
                Some(previous_end_cursor.clone()),
                LoadMoreMode::Append,
            )
        };
        Some(PageWindow {
            first,
            after,
            mode,
            previous_end_cursor,
            target_count,
        })
    }

    /// Size of the refetch issued after a row was created from the panel.
    /// Capped, so rows past the cap leave the visible set until loaded again.
    pub fn refetch_after_create_first(&self) -> u64 {
        (self.visible_count() + 1)
            .max(self.page_size)
            .min(self.max_page_size)
    }

    /// Replaces the visible rows with `page`, keeping the first occurrence
    /// of any id.
    pub fn apply_page(&mut self, mut page: Connection<T>) {
        let mut seen = HashSet::new();
        page.edges
            .retain(|edge| seen.insert(edge.node.row_id().to_string()));
        self.visible = Some(page);
    }

    pub fn apply_window(&mut self, window: &PageWindow, page: Connection<T>) {
        match window.mode {
            LoadMoreMode::Refetch => self.apply_page(page),
            LoadMoreMode::Append => self.append(page),
        }
    }

    fn append(&mut self, page: Connection<T>) {
        let Some(visible) = self.visible.as_mut() else {
            self.apply_page(page);
            return;
        };
        let mut seen: HashSet<String> = visible
            .nodes()
            .map(|node| node.row_id().to_string())
            .collect();
        visible.edges.extend(
            page.edges
                .into_iter()
                .filter(|edge| seen.insert(edge.node.row_id().to_string())),
        );
        if page.page_info.end_cursor.is_some() {
            visible.page_info.end_cursor = page.page_info.end_cursor;
        }
        visible.page_info.has_next_page = page.page_info.has_next_page;
        visible.page_info.global_count = page.page_info.global_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageRequest;

    #[derive(Clone, Debug)]
    struct Row(String);

    impl PanelRow for Row {
        fn row_id(&self) -> &str {
            &self.0
        }
    }

    /// Window `[offset, offset + first)` over `total` rows named r0, r1, ...
    fn window(offset: u64, first: u64, total: u64) -> Connection<Row> {
        let all: Vec<Row> = (0..total).map(|n| Row(format!("r{}", n))).collect();
        let mut page = Connection::from_slice(all, PageRequest { first, offset });
        page.page_info.global_count = total;
        page
    }

    fn ids(pages: &CumulativePages<Row>) -> Vec<String> {
        pages
            .visible()
            .map(|page| page.nodes().map(|row| row.0.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn refetches_while_under_the_cap() {
        let mut pages = CumulativePages::new(2, 10);
        assert!(pages.next_window(2).is_none());
        pages.apply_page(window(0, 2, 5));

        let next = pages.next_window(2).expect("more available");
        assert_eq!(next.mode, LoadMoreMode::Refetch);
        assert_eq!(next.first, 4);
        assert_eq!(next.after, None);
        pages.apply_window(&next, window(0, 4, 5));
        assert_eq!(pages.visible_count(), 4);
    }

    #[test]
    fn appends_past_the_cap_until_everything_is_visible() {
        let mut pages = CumulativePages::new(2, 3);
        pages.apply_page(window(0, 2, 7));

        let mut rounds = 0;
        while let Some(next) = pages.next_window(2) {
            rounds += 1;
            assert!(rounds < 10, "load more never settles");
            let offset = match &next.after {
                Some(cursor) => crate::pagination::decode_cursor(cursor).unwrap() + 1,
                None => 0,
            };
            pages.apply_window(&next, window(offset, next.first, 7));
        }

        assert_eq!(pages.visible_count(), 7);
        assert!(!pages.has_more());
        assert_eq!(ids(&pages), vec!["r0", "r1", "r2", "r3", "r4", "r5", "r6"]);
    }

    #[test]
    fn appended_duplicates_are_dropped() {
        let mut pages = CumulativePages::new(2, 2);
        pages.apply_page(window(0, 2, 4));
        let next = pages.next_window(2).expect("more available");
        assert_eq!(next.mode, LoadMoreMode::Append);
        pages.apply_window(&next, window(1, 2, 4));
        assert_eq!(ids(&pages), vec!["r0", "r1", "r2"]);
    }

    #[test]
    fn refetch_after_create_is_capped() {
        let mut pages = CumulativePages::new(2, 3);
        pages.apply_page(window(0, 2, 2));
        assert_eq!(pages.refetch_after_create_first(), 3);
        pages.apply_page(window(0, 3, 3));
        assert_eq!(pages.refetch_after_create_first(), 3);
    }
}
