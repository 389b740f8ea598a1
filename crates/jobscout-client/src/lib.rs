pub mod backend;
pub mod browser_session;
pub mod http_session;

pub use backend::{BackendProvider, BackendSession};
pub use browser_session::{ChromiumSession, ChromiumSessionProvider, LaunchProfile};
pub use http_session::{HttpSession, HttpSessionProvider};
