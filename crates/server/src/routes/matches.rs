use std::sync::{Arc, LazyLock};

use axum::{Extension, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::registry::{MatchId, MatchRegistry, MatchSummary};

static MATCH_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 _-]{1,64}$").expect("valid match name pattern"));

#[derive(Deserialize)]
pub struct CreateMatchRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct CreateMatchResponse {
    pub match_id: MatchId,
}

/// POST /api/matches
pub async fn create_match(
    Extension(registry): Extension<Arc<MatchRegistry>>,
    user: AuthUser,
    Json(req): Json<CreateMatchRequest>,
) -> Result<Json<CreateMatchResponse>, AppError> {
    let name = req.name.trim();
    if !MATCH_NAME_RE.is_match(name) {
        return Err(AppError::BadRequest(
            "Match name must be 1-64 letters, digits, spaces, underscores or dashes".into(),
        ));
    }

    let match_id = registry.create(name);
    tracing::info!(match_id, user = %user.username, "Match opened over HTTP");
    Ok(Json(CreateMatchResponse { match_id }))
}

/// GET /api/matches
pub async fn list_matches(
    Extension(registry): Extension<Arc<MatchRegistry>>,
    _user: AuthUser,
) -> Json<Vec<MatchSummary>> {
    Json(registry.list().await)
}
