//! # Artifact Transfer Endpoints
//!
//! The upload/download/delete surface over the storage engine. The five
//! coordinate segments arrive as path parameters, already authorized by
//! the surrounding layers; this module validates them into the coordinate
//! newtypes and drives the engine.
//!
//! ## Transfer modes
//!
//! Upload mode is selected by the chunk-protocol headers `x-chunk-index`
//! and `x-chunk-total` — NOT by transport-level chunked encoding. Both
//! headers present means the body is one numbered chunk; neither means
//! the body is the whole artifact; one without the other is a 400.
//!
//! ## Error asymmetry on downloads
//!
//! Errors found before any response bytes are written become structured
//! JSON failures with an explicit status. Once the body stream has begun,
//! the status is already on the wire: a read failure terminates the
//! connection and is logged by the transport — it cannot rewrite the
//! status, and no buffering layer is added to pretend otherwise.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

use boxstore_core::{
    ArchitectureName, ArtifactCoords, CollectionName, OrganizationId, ProviderName, StorageError,
    VersionTag,
};
use boxstore_storage::{
    chunks, download, paths, upload, DeclaredChecksum, FinalizeMode, MergeOutcome, MetadataUpsert,
    RangeSpec, UploadValidation, ARTIFACT_FILE_NAME,
};

use crate::error::AppError;
use crate::state::AppState;

/// Chunk-protocol header: 0-based index of the chunk in this request.
pub const CHUNK_INDEX_HEADER: &str = "x-chunk-index";
/// Chunk-protocol header: declared total number of chunks.
pub const CHUNK_TOTAL_HEADER: &str = "x-chunk-total";
/// Declared checksum hex value for the assembled artifact.
pub const CHECKSUM_HEADER: &str = "x-checksum";
/// Declared checksum algorithm name.
pub const CHECKSUM_TYPE_HEADER: &str = "x-checksum-type";

const UPLOAD_PATH: &str =
    "/v1/orgs/:org/collections/:collection/versions/:version/providers/:provider/archs/:arch/file/upload";
const DOWNLOAD_PATH: &str =
    "/v1/orgs/:org/collections/:collection/versions/:version/providers/:provider/archs/:arch/file/download";
const FILE_PATH: &str =
    "/v1/orgs/:org/collections/:collection/versions/:version/providers/:provider/archs/:arch/file";

/// Response for a completed upload (both modes).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleted {
    pub message: String,
    /// Final size measured on disk.
    pub file_size: u64,
}

/// Response for an accepted chunk that did not complete the transfer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkAccepted {
    pub message: String,
    /// Chunks currently staged.
    pub received: u64,
    /// Declared total.
    pub total: u64,
}

/// Response for a deleted artifact.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDeleted {
    pub message: String,
}

/// Build the artifact transfer router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(UPLOAD_PATH, post(upload_artifact).put(upload_artifact))
        .route(DOWNLOAD_PATH, get(download_artifact))
        .route(FILE_PATH, delete(delete_artifact))
}

/// Validate the five path segments into coordinates.
fn parse_coords(
    org: String,
    collection: String,
    version: String,
    provider: String,
    arch: String,
) -> Result<ArtifactCoords, AppError> {
    Ok(ArtifactCoords {
        organization: OrganizationId::new(org).map_err(bad_segment)?,
        collection: CollectionName::new(collection).map_err(bad_segment)?,
        version: VersionTag::new(version).map_err(bad_segment)?,
        provider: ProviderName::new(provider).map_err(bad_segment)?,
        architecture: ArchitectureName::new(arch).map_err(bad_segment)?,
    })
}

fn bad_segment(err: boxstore_core::SegmentError) -> AppError {
    AppError::BadRequest(err.to_string())
}

/// Parse the chunk-protocol headers.
///
/// Returns `None` for single-shot mode, `Some((index, total))` for
/// chunked mode. One header without the other, unparseable values,
/// `total == 0`, and `index >= total` are all 400s.
fn chunk_protocol(headers: &HeaderMap) -> Result<Option<(u64, u64)>, AppError> {
    let index = headers.get(CHUNK_INDEX_HEADER);
    let total = headers.get(CHUNK_TOTAL_HEADER);
    match (index, total) {
        (None, None) => Ok(None),
        (Some(index), Some(total)) => {
            let index = header_u64(index, CHUNK_INDEX_HEADER)?;
            let total = header_u64(total, CHUNK_TOTAL_HEADER)?;
            if total == 0 {
                return Err(AppError::BadRequest(format!(
                    "{CHUNK_TOTAL_HEADER} must be at least 1"
                )));
            }
            if index >= total {
                return Err(AppError::BadRequest(format!(
                    "{CHUNK_INDEX_HEADER} {index} out of range for {CHUNK_TOTAL_HEADER} {total}"
                )));
            }
            Ok(Some((index, total)))
        }
        _ => Err(AppError::BadRequest(format!(
            "chunked uploads require both {CHUNK_INDEX_HEADER} and {CHUNK_TOTAL_HEADER}"
        ))),
    }
}

fn header_u64(value: &axum::http::HeaderValue, name: &str) -> Result<u64, AppError> {
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| AppError::BadRequest(format!("{name} must be a non-negative integer")))
}

/// The client-declared values the finalizer validates against.
///
/// A present but non-numeric `Content-Length` is a 400, the same as a
/// malformed chunk header; it is never silently treated as absent.
fn upload_validation(headers: &HeaderMap) -> Result<UploadValidation, AppError> {
    let declared_length = headers
        .get(header::CONTENT_LENGTH)
        .map(|v| header_u64(v, "content-length"))
        .transpose()?;

    // Verification needs both the value and the algorithm name; a lone
    // header is ignored rather than guessed at.
    let checksum = match (
        headers.get(CHECKSUM_HEADER).and_then(|v| v.to_str().ok()),
        headers
            .get(CHECKSUM_TYPE_HEADER)
            .and_then(|v| v.to_str().ok()),
    ) {
        (Some(value), Some(algorithm)) => Some(DeclaredChecksum {
            value: value.to_string(),
            algorithm: algorithm.to_string(),
        }),
        _ => None,
    };

    Ok(UploadValidation {
        declared_length,
        checksum,
    })
}

/// POST|PUT `.../file/upload` — store an artifact, single-shot or chunked.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org}/collections/{collection}/versions/{version}/providers/{provider}/archs/{arch}/file/upload",
    params(
        ("org" = String, Path, description = "Organization"),
        ("collection" = String, Path, description = "Collection"),
        ("version" = String, Path, description = "Version"),
        ("provider" = String, Path, description = "Provider"),
        ("arch" = String, Path, description = "Architecture"),
    ),
    responses(
        (status = 201, description = "Artifact stored", body = UploadCompleted),
        (status = 200, description = "Chunk accepted, transfer still in progress", body = ChunkAccepted),
        (status = 400, description = "Malformed coordinates or headers", body = crate::error::ErrorBody),
        (status = 413, description = "Size ceiling exceeded", body = crate::error::ErrorBody),
        (status = 422, description = "Size or checksum validation failed", body = crate::error::ErrorBody),
    ),
    tag = "artifacts"
)]
pub async fn upload_artifact(
    State(state): State<AppState>,
    Path((org, collection, version, provider, arch)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, AppError> {
    let coords = parse_coords(org, collection, version, provider, arch)?;
    let storage = &state.config.storage;
    let artifact = paths::artifact_path(&storage.root, &coords)?;
    let validation = upload_validation(&headers)?;

    match chunk_protocol(&headers)? {
        None => {
            upload::write_artifact(&artifact, body.into_data_stream()).await?;
            let size =
                upload::finalize(storage, &artifact, FinalizeMode::SingleShot, &validation).await?;
            let record = synchronize_metadata(&state, &coords, &validation, size);
            tracing::info!(%coords, size, downloads = record.download_count, "artifact stored");
            Ok(completed_response(size))
        }
        Some((index, total)) => {
            let staging = paths::staging_dir(&storage.root, &coords)?;
            chunks::write_chunk(&staging, index, body.into_data_stream()).await?;
            tracing::debug!(%coords, chunk = index, total, "chunk staged");

            match chunks::try_merge(&staging, &artifact, total).await? {
                MergeOutcome::Incomplete { missing } => {
                    let received = total.saturating_sub(missing.len() as u64);
                    Ok((
                        StatusCode::OK,
                        Json(ChunkAccepted {
                            message: format!("chunk {index} of {total} accepted"),
                            received,
                            total,
                        }),
                    )
                        .into_response())
                }
                MergeOutcome::AlreadyMerged => Ok((
                    StatusCode::OK,
                    Json(ChunkAccepted {
                        message: "assembly already completed by a concurrent request".to_string(),
                        received: total,
                        total,
                    }),
                )
                    .into_response()),
                MergeOutcome::Merged { .. } => {
                    let size =
                        upload::finalize(storage, &artifact, FinalizeMode::Chunked, &validation)
                            .await?;
                    synchronize_metadata(&state, &coords, &validation, size);
                    tracing::info!(%coords, size, chunks = total, "artifact assembled");
                    Ok(completed_response(size))
                }
            }
        }
    }
}

/// Upsert the metadata record after a successful finalize.
fn synchronize_metadata(
    state: &AppState,
    coords: &ArtifactCoords,
    validation: &UploadValidation,
    size: u64,
) -> boxstore_storage::ArtifactMetadata {
    state.metadata.upsert(
        coords,
        MetadataUpsert {
            file_name: ARTIFACT_FILE_NAME.to_string(),
            checksum: validation.checksum.as_ref().map(|c| c.value.clone()),
            checksum_type: validation.checksum.as_ref().map(|c| c.algorithm.clone()),
            file_size: size,
        },
    )
}

fn completed_response(size: u64) -> Response {
    (
        StatusCode::CREATED,
        Json(UploadCompleted {
            message: "artifact stored".to_string(),
            file_size: size,
        }),
    )
        .into_response()
}

/// GET `.../file/download` — stream artifact bytes, honoring `Range`.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org}/collections/{collection}/versions/{version}/providers/{provider}/archs/{arch}/file/download",
    params(
        ("org" = String, Path, description = "Organization"),
        ("collection" = String, Path, description = "Collection"),
        ("version" = String, Path, description = "Version"),
        ("provider" = String, Path, description = "Provider"),
        ("arch" = String, Path, description = "Architecture"),
    ),
    responses(
        (status = 200, description = "Full artifact bytes"),
        (status = 206, description = "Partial artifact bytes"),
        (status = 404, description = "Artifact absent", body = crate::error::ErrorBody),
        (status = 416, description = "Range not satisfiable; details carry total size", body = crate::error::ErrorBody),
    ),
    tag = "artifacts"
)]
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((org, collection, version, provider, arch)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let coords = parse_coords(org, collection, version, provider, arch)?;
    let artifact = paths::artifact_path(&state.config.storage.root, &coords)?;

    let size = download::measured_size(&artifact)
        .await
        .map_err(|e| not_found_or(e, &coords))?;

    let range = headers
        .get(header::RANGE)
        .map(|value| {
            let value = value
                .to_str()
                .map_err(|_| AppError::RangeNotSatisfiable { size })?;
            RangeSpec::parse(value, size).map_err(AppError::from)
        })
        .transpose()?;

    let response = match range {
        None => {
            let (file, size) = download::open_full(&artifact)
                .await
                .map_err(|e| not_found_or(e, &coords))?;
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .header(header::CONTENT_LENGTH, size)
                .header(header::ACCEPT_RANGES, "bytes")
                .body(Body::from_stream(ReaderStream::new(file)))
                .map_err(|e| AppError::Internal(e.to_string()))?
        }
        Some(spec) => {
            let reader = download::open_range(&artifact, spec)
                .await
                .map_err(|e| not_found_or(e, &coords))?;
            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .header(header::CONTENT_LENGTH, spec.len())
                .header(header::ACCEPT_RANGES, "bytes")
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", spec.start, spec.end, size),
                )
                .body(Body::from_stream(ReaderStream::new(reader)))
                .map_err(|e| AppError::Internal(e.to_string()))?
        }
    };

    // Best-effort usage counter on every successful open; a missing
    // record never fails the download.
    if state.metadata.record_download(&coords).is_none() {
        tracing::warn!(%coords, "download served without a metadata record");
    }

    Ok(response)
}

/// Map a missing-file I/O error to the artifact 404.
fn not_found_or(err: StorageError, coords: &ArtifactCoords) -> AppError {
    match err {
        StorageError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
            AppError::NotFound(format!("artifact {coords} not found"))
        }
        other => other.into(),
    }
}

/// DELETE `.../file` — remove the artifact bytes, staging leftovers, and
/// the metadata record.
#[utoipa::path(
    delete,
    path = "/v1/orgs/{org}/collections/{collection}/versions/{version}/providers/{provider}/archs/{arch}/file",
    params(
        ("org" = String, Path, description = "Organization"),
        ("collection" = String, Path, description = "Collection"),
        ("version" = String, Path, description = "Version"),
        ("provider" = String, Path, description = "Provider"),
        ("arch" = String, Path, description = "Architecture"),
    ),
    responses(
        (status = 200, description = "Artifact deleted", body = ArtifactDeleted),
        (status = 404, description = "Artifact absent", body = crate::error::ErrorBody),
    ),
    tag = "artifacts"
)]
pub async fn delete_artifact(
    State(state): State<AppState>,
    Path((org, collection, version, provider, arch)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
) -> Result<Json<ArtifactDeleted>, AppError> {
    let coords = parse_coords(org, collection, version, provider, arch)?;
    let storage = &state.config.storage;
    let artifact = paths::artifact_path(&storage.root, &coords)?;

    match tokio::fs::remove_file(&artifact).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("artifact {coords} not found")));
        }
        Err(e) => return Err(StorageError::Io(e).into()),
    }

    // Stale staging leftovers go with the artifact; failure is logged.
    let staging = paths::staging_dir(&storage.root, &coords)?;
    if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(%coords, error = %e, "failed to remove staging directory");
        }
    }

    state.metadata.remove(&coords);
    tracing::info!(%coords, "artifact deleted");
    Ok(Json(ArtifactDeleted {
        message: format!("artifact {coords} deleted"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::try_from(*name).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn no_chunk_headers_is_single_shot() {
        assert_eq!(chunk_protocol(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn both_chunk_headers_select_chunked_mode() {
        let headers = header_map(&[("x-chunk-index", "2"), ("x-chunk-total", "5")]);
        assert_eq!(chunk_protocol(&headers).unwrap(), Some((2, 5)));
    }

    #[test]
    fn lone_chunk_header_is_rejected() {
        let headers = header_map(&[("x-chunk-index", "2")]);
        assert!(chunk_protocol(&headers).is_err());
        let headers = header_map(&[("x-chunk-total", "5")]);
        assert!(chunk_protocol(&headers).is_err());
    }

    #[test]
    fn chunk_index_out_of_range_is_rejected() {
        let headers = header_map(&[("x-chunk-index", "5"), ("x-chunk-total", "5")]);
        assert!(chunk_protocol(&headers).is_err());
        let headers = header_map(&[("x-chunk-index", "0"), ("x-chunk-total", "0")]);
        assert!(chunk_protocol(&headers).is_err());
    }

    #[test]
    fn unparseable_chunk_header_is_rejected() {
        let headers = header_map(&[("x-chunk-index", "two"), ("x-chunk-total", "5")]);
        assert!(chunk_protocol(&headers).is_err());
        let headers = header_map(&[("x-chunk-index", "-1"), ("x-chunk-total", "5")]);
        assert!(chunk_protocol(&headers).is_err());
    }

    #[test]
    fn checksum_requires_both_headers() {
        let only_value = header_map(&[("x-checksum", "abcd")]);
        assert!(upload_validation(&only_value).unwrap().checksum.is_none());

        let both = header_map(&[("x-checksum", "abcd"), ("x-checksum-type", "sha256")]);
        let checksum = upload_validation(&both).unwrap().checksum.unwrap();
        assert_eq!(checksum.value, "abcd");
        assert_eq!(checksum.algorithm, "sha256");
    }

    #[test]
    fn declared_length_comes_from_content_length() {
        let headers = header_map(&[("content-length", "1234")]);
        assert_eq!(
            upload_validation(&headers).unwrap().declared_length,
            Some(1234)
        );
        assert_eq!(
            upload_validation(&HeaderMap::new()).unwrap().declared_length,
            None
        );
    }

    #[test]
    fn malformed_content_length_is_rejected_not_ignored() {
        for bad in ["ten", "-5", "1.5"] {
            let headers = header_map(&[("content-length", bad)]);
            assert!(
                matches!(upload_validation(&headers), Err(AppError::BadRequest(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn hostile_segments_fail_coordinate_parsing() {
        let result = parse_coords(
            "..".to_string(),
            "base".to_string(),
            "1.0.0".to_string(),
            "qemu".to_string(),
            "amd64".to_string(),
        );
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
