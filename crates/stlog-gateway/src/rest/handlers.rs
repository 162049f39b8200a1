//! One handler per endpoint: parse, call the backend or the tree head
//! source, wrap the result as a wire item, reply.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use stlog_types::{ConsistencyProofV1, InclusionProofV1, SignedDebugInfoV1, StItem};

use crate::domain::error::GatewayError;
use crate::rest::requests::{
    AddCosignatureRequest, AddEntryRequest, GetConsistencyProofRequest, GetEntriesRequest,
    GetProofByHashRequest,
};
use crate::rest::responses::{AnchorsResponse, GetEntryResponse, ItemResponse};
use crate::service::AppState;

fn json_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, GatewayError> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::BadRequest(format!("invalid json body: {e}")))
}

fn item_response(item: StItem) -> Result<Json<ItemResponse>, GatewayError> {
    let bytes = item.marshal().map_err(GatewayError::Encoding)?;
    Ok(Json(ItemResponse(bytes)))
}

/// `POST add-entry`: queue a checksum leaf, acknowledge with a signed
/// debug statement over the submitted leaf bytes.
pub(crate) async fn add_entry(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ItemResponse>, GatewayError> {
    let request: AddEntryRequest = json_body(&body)?;
    let submission = request.validate(&state.params)?;
    state
        .backend
        .queue_leaf(&submission.leaf, &submission.appendix)
        .await?;

    let signature = state.params.signer.sign(&submission.leaf)?;
    item_response(StItem::SignedDebugInfoV1(SignedDebugInfoV1 {
        log_id: state.params.log_id.clone(),
        message: submission.leaf,
        signature,
    }))
}

/// `POST add-cosignature`: apply one witness cosignature to the candidate
/// tree head.
pub(crate) async fn add_cosignature(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(), GatewayError> {
    let request: AddCosignatureRequest = json_body(&body)?;
    let costh = request.validate()?;
    state.sth_source.add_cosignature(costh)
}

/// `GET get-latest-sth`: sign the backend's latest tree head.
pub(crate) async fn get_latest_sth(
    State(state): State<AppState>,
) -> Result<Json<ItemResponse>, GatewayError> {
    let sth = state.sth_source.latest_sth().await?;
    item_response(StItem::SignedTreeHeadV1(sth))
}

/// `GET get-stable-sth`: the signed head inside the served cosigned head.
pub(crate) async fn get_stable_sth(
    State(state): State<AppState>,
) -> Result<Json<ItemResponse>, GatewayError> {
    let sth = state
        .sth_source
        .stable_sth()
        .ok_or(GatewayError::NoCosignedTreeHead)?;
    item_response(StItem::SignedTreeHeadV1(sth))
}

/// `GET get-cosigned-sth`: the served cosigned head with its witness
/// signatures.
pub(crate) async fn get_cosigned_sth(
    State(state): State<AppState>,
) -> Result<Json<ItemResponse>, GatewayError> {
    let costh = state
        .sth_source
        .cosigned_sth()
        .ok_or(GatewayError::NoCosignedTreeHead)?;
    item_response(StItem::CosignedTreeHeadV1(costh))
}

/// `GET get-entries`: leaves and their appendices for a validated range.
pub(crate) async fn get_entries(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<GetEntryResponse>>, GatewayError> {
    let request = GetEntriesRequest::parse(&query, &state.params)?;
    let leaves = state
        .backend
        .leaves_by_range(request.start, request.end)
        .await?;
    let entries = leaves
        .into_iter()
        .map(GetEntryResponse::from_leaf)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(entries))
}

/// `GET get-proof-by-hash`: inclusion proof for a leaf hash.
pub(crate) async fn get_proof_by_hash(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ItemResponse>, GatewayError> {
    let request = GetProofByHashRequest::parse(&query)?;
    let (leaf_index, path) = state
        .backend
        .inclusion_proof(&request.hash, request.tree_size)
        .await?;
    item_response(StItem::InclusionProofV1(InclusionProofV1 {
        log_id: state.params.log_id.clone(),
        tree_size: request.tree_size as u64,
        leaf_index,
        path,
    }))
}

/// `GET get-consistency-proof`: consistency proof between two tree sizes.
pub(crate) async fn get_consistency_proof(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ItemResponse>, GatewayError> {
    let request = GetConsistencyProofRequest::parse(&query)?;
    let path = state
        .backend
        .consistency_proof(request.first, request.second)
        .await?;
    item_response(StItem::ConsistencyProofV1(ConsistencyProofV1 {
        log_id: state.params.log_id.clone(),
        tree_size1: request.first as u64,
        tree_size2: request.second as u64,
        path,
    }))
}

/// `GET get-anchors`: the configured DER trust anchors.
pub(crate) async fn get_anchors(State(state): State<AppState>) -> Json<AnchorsResponse> {
    Json(AnchorsResponse(state.params.anchors.clone()))
}
