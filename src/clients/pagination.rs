//! Lazy walking of paginated collections.
//!
//! STAPI collections are paginated with `rel="next"` links. [`Pages`]
//! requests one page at a time and only moves on when the caller asks for
//! the next one, so at most one request is in flight per walker.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use stapi::clients::Pages;
//! use stapi::models::{Link, Product};
//!
//! let link = Link::new("https://stapi.example.com/products", "products");
//! let products: Vec<Product> = Pages::new(io, link, "products")
//!     .items::<Product>()
//!     .try_collect()
//!     .await?;
//! ```

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::clients::errors::ClientError;
use crate::clients::http_client::StapiIo;
use crate::models::Link;

/// A sequential walk over the pages of a collection.
#[derive(Debug)]
pub struct Pages {
    io: Arc<StapiIo>,
    next: Option<Link>,
    lookup_key: String,
}

impl Pages {
    /// Creates a walker starting at `link`.
    ///
    /// `lookup_key` names the member holding a page's items (`products`,
    /// `features`, `statuses`, ...). A page where that member is absent or
    /// empty ends the walk.
    #[must_use]
    pub fn new(io: Arc<StapiIo>, link: Link, lookup_key: impl Into<String>) -> Self {
        Self {
            io,
            next: Some(link),
            lookup_key: lookup_key.into(),
        }
    }

    /// Returns the name of the member holding a page's items.
    #[must_use]
    pub fn lookup_key(&self) -> &str {
        &self.lookup_key
    }

    /// Fetches the next page, or `None` once the walk has ended.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails. The walk ends after an
    /// error.
    pub async fn next_page(&mut self) -> Result<Option<Value>, ClientError> {
        let Some(link) = self.next.take() else {
            return Ok(None);
        };

        let (page, next) = self.io.fetch_page(&link, &self.lookup_key).await?;
        if page.is_some() {
            self.next = next;
        }
        Ok(page)
    }

    /// Turns the walker into a stream of pages.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, Result<Value, ClientError>> {
        stream::try_unfold(self, |mut pages| async move {
            let page = pages.next_page().await?;
            Ok(page.map(|page| (page, pages)))
        })
        .boxed()
    }

    /// Turns the walker into a stream of the items on each page, decoded
    /// as `T`.
    #[must_use]
    pub fn items<T>(self) -> BoxStream<'static, Result<T, ClientError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let lookup_key = self.lookup_key.clone();
        self.into_stream()
            .and_then(move |mut page| {
                let items = page
                    .get_mut(&lookup_key)
                    .map_or(Value::Array(Vec::new()), Value::take);
                async move { serde_json::from_value::<Vec<T>>(items).map_err(ClientError::from) }
            })
            .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }
}
