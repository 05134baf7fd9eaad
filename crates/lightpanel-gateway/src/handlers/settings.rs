//! Settings page.

use axum::response::Html;

use crate::auth::SessionUser;
use crate::pages;

/// `GET /settings`: the editor page. Requires a session.
pub async fn settings(_user: SessionUser) -> Html<String> {
    Html(pages::settings())
}
