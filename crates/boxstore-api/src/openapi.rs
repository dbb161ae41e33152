//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the artifact transfer surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Boxstore Artifact Registry",
        version = "0.3.2",
        description = "Resumable uploads and range-addressable downloads for immutable VM disk-image artifacts, addressed by organization/collection/version/provider/architecture.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::artifacts::upload_artifact,
        crate::routes::artifacts::download_artifact,
        crate::routes::artifacts::delete_artifact,
    ),
    components(schemas(
        crate::routes::artifacts::UploadCompleted,
        crate::routes::artifacts::ChunkAccepted,
        crate::routes::artifacts::ArtifactDeleted,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "artifacts", description = "Artifact upload, download, and deletion")
    )
)]
pub struct ApiDoc;

/// Router serving the generated spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_spec))
}

async fn serve_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
