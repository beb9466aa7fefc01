//! Paginated directory listing
//!
//! The cursor holds one page at a time. Moving forward or backward requests
//! exactly the URL the service put in the held page, so ordering, filters
//! and page size stay whatever the service chose.

use crate::error::Result;
use crate::result::{ApiResult, ApiStatus};
use crate::traits::PageSource;
use crate::types::{ListingPage, Metadata};

/// Page size used when none was requested
pub const DEFAULT_PAGE_SIZE: u32 = 200;

pub const NO_NEXT_PAGE: &str = "no next page";
pub const NO_PREVIOUS_PAGE: &str = "no previous page";

/// Stateful walker over a directory listing
pub struct ListingCursor<'a, S: ?Sized> {
    source: &'a S,
    bucket: String,
    dir_path: String,
    page: Option<ListingPage>,
}

impl<'a, S: PageSource + ?Sized> ListingCursor<'a, S> {
    pub fn new(source: &'a S, bucket: impl Into<String>, dir_path: impl Into<String>) -> Self {
        Self {
            source,
            bucket: bucket.into(),
            dir_path: dir_path.into(),
            page: None,
        }
    }

    /// The page currently held
    pub fn page(&self) -> Option<&ListingPage> {
        self.page.as_ref()
    }

    /// Entries of the page currently held
    pub fn entries(&self) -> &[Metadata] {
        self.page.as_ref().map(|p| p.files.as_slice()).unwrap_or_default()
    }

    /// Fetch the first page
    pub async fn first(&mut self, page_size: u32) -> Result<ApiResult<ListingPage>> {
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        tracing::debug!(bucket = %self.bucket, dir = %self.dir_path, page_size, "Listing first page");
        let result = self
            .source
            .first_page(&self.bucket, &self.dir_path, page_size)
            .await?;
        Ok(self.hold(result))
    }

    /// Fetch the following page.
    ///
    /// Without a held page this is `first(DEFAULT_PAGE_SIZE)`. On the last
    /// page it returns a failed result with [`NO_NEXT_PAGE`].
    pub async fn next(&mut self) -> Result<ApiResult<ListingPage>> {
        if self.page.is_none() {
            return self.first(DEFAULT_PAGE_SIZE).await;
        }
        let Some(url) = self.link(|p| p.next.as_deref()) else {
            return Ok(ApiResult::status_only(ApiStatus::failure(0, NO_NEXT_PAGE)));
        };
        let result = self.source.page_at(&url).await?;
        Ok(self.hold(result))
    }

    /// Fetch the preceding page.
    ///
    /// Without a held page, or on the first page, returns a failed result
    /// with [`NO_PREVIOUS_PAGE`].
    pub async fn previous(&mut self) -> Result<ApiResult<ListingPage>> {
        let Some(url) = self.link(|p| p.previous.as_deref()) else {
            return Ok(ApiResult::status_only(ApiStatus::failure(
                0,
                NO_PREVIOUS_PAGE,
            )));
        };
        let result = self.source.page_at(&url).await?;
        Ok(self.hold(result))
    }

    fn link(&self, pick: impl Fn(&ListingPage) -> Option<&str>) -> Option<String> {
        self.page
            .as_ref()
            .and_then(pick)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }

    /// Replace the held page with a successful result; failures keep the old one
    fn hold(&mut self, result: ApiResult<ListingPage>) -> ApiResult<ListingPage> {
        if result.status.ok
            && let Some(page) = &result.data
        {
            self.page = Some(page.clone());
        }
        result
    }
}

/// Whether a cursor result means the listing has no page in that direction
pub fn is_end_of_listing(status: &ApiStatus) -> bool {
    !status.ok && status.code == 0 && (status.message == NO_NEXT_PAGE || status.message == NO_PREVIOUS_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockPageSource;
    use crate::types::PageInfo;

    fn page(current: u64, next: Option<&str>, previous: Option<&str>) -> ListingPage {
        ListingPage {
            count: 3,
            next: next.map(str::to_string),
            previous: previous.map(str::to_string),
            page: PageInfo {
                current,
                final_page: 2,
            },
            files: vec![Metadata {
                name: format!("item{current}"),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn ok(page: ListingPage) -> Result<ApiResult<ListingPage>> {
        Ok(ApiResult::new(ApiStatus::success(200, ""), Some(page)))
    }

    const PAGE2: &str = "http://h/api/v1/dir/b/d/?limit=2&offset=2";
    const PAGE1: &str = "http://h/api/v1/dir/b/d/?limit=2&offset=0";

    #[tokio::test]
    async fn test_walk_forward_and_back() {
        let mut source = MockPageSource::new();
        source
            .expect_first_page()
            .withf(|bucket, dir, size| bucket == "b" && dir == "d" && *size == 2)
            .times(1)
            .returning(|_, _, _| ok(page(1, Some(PAGE2), None)));
        source
            .expect_page_at()
            .withf(|url| url == PAGE2)
            .times(1)
            .returning(|_| ok(page(2, None, Some(PAGE1))));
        source
            .expect_page_at()
            .withf(|url| url == PAGE1)
            .times(1)
            .returning(|_| ok(page(1, Some(PAGE2), None)));

        let mut cursor = ListingCursor::new(&source, "b", "d");
        assert!(cursor.first(2).await.unwrap().is_ok());
        assert_eq!(cursor.entries()[0].name, "item1");

        assert!(cursor.next().await.unwrap().is_ok());
        assert_eq!(cursor.page().unwrap().page.current, 2);

        let end = cursor.next().await.unwrap();
        assert!(!end.is_ok());
        assert!(is_end_of_listing(&end.status));
        assert_eq!(cursor.page().unwrap().page.current, 2);

        assert!(cursor.previous().await.unwrap().is_ok());
        assert_eq!(cursor.page().unwrap().page.current, 1);

        let start = cursor.previous().await.unwrap();
        assert_eq!(start.message(), NO_PREVIOUS_PAGE);
    }

    #[tokio::test]
    async fn test_next_without_page_fetches_first() {
        let mut source = MockPageSource::new();
        source
            .expect_first_page()
            .withf(|_, _, size| *size == DEFAULT_PAGE_SIZE)
            .times(1)
            .returning(|_, _, _| ok(page(1, None, None)));

        let mut cursor = ListingCursor::new(&source, "b", "d");
        assert!(cursor.next().await.unwrap().is_ok());
        assert!(is_end_of_listing(&cursor.next().await.unwrap().status));
    }

    #[tokio::test]
    async fn test_previous_without_page() {
        let source = MockPageSource::new();
        let mut cursor = ListingCursor::new(&source, "b", "");
        let result = cursor.previous().await.unwrap();
        assert!(is_end_of_listing(&result.status));
        assert!(cursor.page().is_none());
        assert!(cursor.entries().is_empty());
    }

    #[tokio::test]
    async fn test_failed_page_keeps_held_page() {
        let mut source = MockPageSource::new();
        source
            .expect_first_page()
            .returning(|_, _, _| ok(page(1, Some(PAGE2), None)));
        source
            .expect_page_at()
            .returning(|_| Ok(ApiResult::status_only(ApiStatus::failure(404, "gone"))));

        let mut cursor = ListingCursor::new(&source, "b", "d");
        cursor.first(2).await.unwrap();
        let failed = cursor.next().await.unwrap();
        assert_eq!(failed.code(), 404);
        assert!(!is_end_of_listing(&failed.status));
        assert_eq!(cursor.page().unwrap().page.current, 1);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut source = MockPageSource::new();
        source
            .expect_first_page()
            .returning(|_, _, _| Err(crate::Error::Network("timeout".to_string())));

        let mut cursor = ListingCursor::new(&source, "b", "d");
        assert!(cursor.first(10).await.is_err());
    }
}
