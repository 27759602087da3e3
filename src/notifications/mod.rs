//! Paged notification list with infinite scroll.
//!
//! The unread badge comes from the push channel
//! ([`interiora_realtime::NotificationSocket`]); nothing here reads or
//! writes it, so the two can disagree until the next server push.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Id;
use crate::error::Result;
use crate::fetch::{ApiClient, LoadingTracker, RequestOptions};
use crate::pagination::Page;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Id,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

pub struct NotificationFeed {
    api: ApiClient,
    page_size: u32,
    items: Vec<Notification>,
    next_page: u32,
    has_more: bool,
    loading: LoadingTracker,
}

impl NotificationFeed {
    pub fn new(api: ApiClient, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            items: Vec::new(),
            next_page: 1,
            has_more: true,
            loading: LoadingTracker::new(),
        }
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    /// Fetch a page. `reset_list` starts over from page 1 and replaces the
    /// list; otherwise the next page is appended. Dropping the future
    /// leaves the list as it was.
    pub async fn fetch(&mut self, reset_list: bool) -> Result<()> {
        let page = if reset_list { 1 } else { self.next_page };
        let page_data = {
            let _loading = self.loading.begin();
            self.request(page).await?
        };

        if reset_list {
            self.items = page_data.results;
        } else {
            self.items.extend(page_data.results);
        }
        self.has_more = page_data.next.is_some();
        self.next_page = page + 1;
        debug!(page, loaded = self.items.len(), has_more = self.has_more, "notifications fetched");
        Ok(())
    }

    async fn request(&self, page: u32) -> Result<Page<Notification>> {
        let options = RequestOptions::get()
            .query("page", page)
            .query("page_size", self.page_size);
        self.api.send_json("notifications/", options).await
    }

    /// Called when the end-of-list sentinel scrolls into view. Returns
    /// whether a page was fetched.
    pub async fn on_sentinel_visible(&mut self) -> Result<bool> {
        if self.is_loading() || !self.has_more {
            return Ok(false);
        }
        self.fetch(false).await?;
        Ok(true)
    }

    pub async fn mark_read(&mut self, id: Id) -> Result<()> {
        self.api
            .send_empty(&format!("notifications/{}/read/", id), RequestOptions::post())
            .await?;
        if let Some(item) = self.items.iter_mut().find(|n| n.id == id) {
            item.is_read = true;
        }
        Ok(())
    }
}
