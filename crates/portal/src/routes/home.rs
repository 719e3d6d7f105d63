//! Landing redirect.

use axum::response::Redirect;

use crate::middleware::OptionalUser;
use crate::services::FormStage;

/// Send the caller to the page for their workflow stage.
pub async fn home(OptionalUser(user): OptionalUser) -> Redirect {
    let stage = user.map_or(FormStage::Unauthenticated, |u| u.stage());
    Redirect::to(stage.landing_path())
}
