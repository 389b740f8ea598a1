use std::future::Future;

use crate::error::AppError;

/// One open document session: a browser instance bound to a single
/// page-load lifecycle.
pub trait Session: Send {
    /// Load `url` in the session.
    fn navigate(&mut self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Scroll the viewport down by `pixels` to trigger lazy loading.
    fn scroll_by(&mut self, pixels: u32) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Return the current rendered document as HTML.
    fn content(&mut self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Tear the session down. Must be called on every path once opened.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Creates sessions. Each call to [`open`](SessionProvider::open) yields a
/// fresh, independent session.
pub trait SessionProvider: Send + Sync + Clone + 'static {
    type Session: Session + 'static;

    fn open(&self) -> impl Future<Output = Result<Self::Session, AppError>> + Send;
}
