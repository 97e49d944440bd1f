/// HTTP 경계
/// 커맨드/조회 결과를 JSON으로 감싸고 ApiError의 IntoResponse 매핑에 상태 코드를 맡긴다.
// region:    --- Imports
use crate::admin::commands::{
    self as admin, CreateBidCommand, CreateItemCommand, UpdateBidCommand, UpdateItemCommand,
};
use crate::bidding::commands::{handle_place_bid as place_bid, PlaceBidCommand};
use crate::bidding::model::Bid;
use crate::error::ApiError;
use crate::query;
use crate::query::handlers::{AdminBidView, AdminItemView, PublicListing};
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;

// endregion: --- Imports

// region:    --- Public Handlers

/// 공개 상품 목록 조회
pub async fn handle_get_items(
    State((store, ctx)): State<AppState>,
) -> Result<Json<PublicListing>, ApiError> {
    let listing = query::handlers::list_public_items(&store, &ctx.clock).await?;
    Ok(Json(listing))
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State((store, ctx)): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bid = place_bid(cmd, &store, &ctx.clock).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!(
            "입찰이 접수되었습니다. 현재 최고가는 ${}입니다.",
            bid.amount
        ),
        "currentBid": bid.amount,
    })))
}

// endregion: --- Public Handlers

// region:    --- Admin Item Handlers

/// 관리자 상품 목록 조회 (비활성 포함)
pub async fn handle_admin_items(
    State((store, _)): State<AppState>,
) -> Result<Json<Vec<AdminItemView>>, ApiError> {
    Ok(Json(query::handlers::list_admin_items(&store).await?))
}

/// 상품 등록
pub async fn handle_create_item(
    State((store, _)): State<AppState>,
    Json(cmd): Json<CreateItemCommand>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let item = admin::create_item(cmd, &store).await?;
    Ok(Json(serde_json::json!({ "success": true, "item": item })))
}

/// 상품 부분 수정
pub async fn handle_update_item(
    State((store, _)): State<AppState>,
    Path(item_id): Path<i64>,
    Json(cmd): Json<UpdateItemCommand>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let item = admin::update_item(item_id, cmd, &store).await?;
    Ok(Json(serde_json::json!({ "success": true, "item": item })))
}

/// 상품 삭제 (입찰 연쇄 삭제)
pub async fn handle_delete_item(
    State((store, _)): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    admin::delete_item(item_id, &store).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// endregion: --- Admin Item Handlers

// region:    --- Admin Bid Handlers

/// 관리자 입찰 목록 조회 (최신순, 낙찰 표시)
pub async fn handle_admin_bids(
    State((store, _)): State<AppState>,
) -> Result<Json<Vec<AdminBidView>>, ApiError> {
    Ok(Json(query::handlers::list_admin_bids(&store).await?))
}

/// 입찰 직접 등록 (최고가 검증 생략)
pub async fn handle_create_bid(
    State((store, _)): State<AppState>,
    Json(cmd): Json<CreateBidCommand>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bid = admin::create_bid(cmd, &store).await?;
    Ok(Json(serde_json::json!({ "success": true, "bid": bid })))
}

/// 입찰 단건 조회
pub async fn handle_get_bid(
    State((store, _)): State<AppState>,
    Path(bid_id): Path<i64>,
) -> Result<Json<Bid>, ApiError> {
    Ok(Json(admin::get_bid(bid_id, &store).await?))
}

/// 입찰 부분 수정
pub async fn handle_update_bid(
    State((store, _)): State<AppState>,
    Path(bid_id): Path<i64>,
    Json(cmd): Json<UpdateBidCommand>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bid = admin::update_bid(bid_id, cmd, &store).await?;
    Ok(Json(serde_json::json!({ "success": true, "bid": bid })))
}

/// 입찰 삭제
pub async fn handle_delete_bid(
    State((store, _)): State<AppState>,
    Path(bid_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    admin::delete_bid(bid_id, &store).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// endregion: --- Admin Bid Handlers
