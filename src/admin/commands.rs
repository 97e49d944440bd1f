/// 관리자 전용 커맨드
/// 상품/입찰에 대한 무제한 CRUD. 공개 경로와 달리 최고가 초과 검증을 거치지 않는
/// 특권 진입점이며, 같은 저장소를 공유한다. 필드 형식 검증(양수 금액 등)은 그대로 한다.
/// 어떤 수정이 들어와도 낙찰 계산은 읽기 시점마다 다시 하므로 파생 상태가 어긋나지 않는다.
// region:    --- Imports
use crate::bidding::model::{Bid, BidPatch, BidderInfo, Item, ItemPatch, NewItem};
use crate::error::ApiError;
use crate::store::{AuctionStore, SharedStore};
use serde::Deserialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Item Commands

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemCommand {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub starting_bid: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemCommand {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub starting_bid: Option<f64>,
    pub active: Option<bool>,
}

/// 상품 등록. id는 저장소가 새로 부여하고 active는 true로 시작한다.
pub async fn create_item(
    cmd: CreateItemCommand,
    store: &SharedStore,
) -> Result<Item, ApiError> {
    info!("{:<12} --> 상품 등록: {:?}", "Admin", cmd);
    let new = NewItem {
        title: required_text(cmd.title)?,
        description: required_text(cmd.description)?,
        event_date: required_text(cmd.event_date)?,
        starting_bid: required_amount(cmd.starting_bid)?,
    };
    Ok(store.insert_item(new).await?)
}

/// 상품 부분 수정. 전달된 필드만 바뀐다.
pub async fn update_item(
    item_id: i64,
    cmd: UpdateItemCommand,
    store: &SharedStore,
) -> Result<Item, ApiError> {
    info!("{:<12} --> 상품 수정 id: {} {:?}", "Admin", item_id, cmd);
    if let Some(starting_bid) = cmd.starting_bid {
        valid_amount(starting_bid)?;
    }
    let patch = ItemPatch {
        title: cmd.title,
        description: cmd.description,
        event_date: cmd.event_date,
        starting_bid: cmd.starting_bid,
        active: cmd.active,
    };
    store
        .update_item(item_id, patch)
        .await?
        .ok_or_else(item_not_found)
}

/// 상품 삭제. 해당 상품의 입찰 전부가 함께, 전부-아니면-전무로 삭제된다.
pub async fn delete_item(item_id: i64, store: &SharedStore) -> Result<(), ApiError> {
    info!("{:<12} --> 상품 삭제 id: {}", "Admin", item_id);
    if !store.delete_item_cascade(item_id).await? {
        return Err(item_not_found());
    }
    Ok(())
}

// endregion: --- Item Commands

// region:    --- Bid Commands

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateBidCommand {
    pub item_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBidCommand {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub amount: Option<f64>,
}

/// 입찰 직접 등록. 최고가 초과 검증을 하지 않으므로 현재 최고가보다 낮아도 들어간다.
pub async fn create_bid(cmd: CreateBidCommand, store: &SharedStore) -> Result<Bid, ApiError> {
    info!("{:<12} --> 입찰 등록: {:?}", "Admin", cmd);
    let item_id = cmd
        .item_id
        .ok_or_else(|| ApiError::Validation("모든 필드를 입력해야 합니다.".to_string()))?;
    let bidder = BidderInfo {
        name: required_text(cmd.name)?,
        email: required_text(cmd.email)?,
        phone: required_text(cmd.phone)?,
    };
    let amount = required_amount(cmd.amount)?;

    store
        .insert_bid(item_id, bidder, amount)
        .await?
        .ok_or_else(item_not_found)
}

pub async fn get_bid(bid_id: i64, store: &SharedStore) -> Result<Bid, ApiError> {
    store.get_bid(bid_id).await?.ok_or_else(bid_not_found)
}

/// 입찰 부분 수정. 금액 수정으로 낙찰자가 바뀌면 다음 읽기부터 바로 반영된다.
pub async fn update_bid(
    bid_id: i64,
    cmd: UpdateBidCommand,
    store: &SharedStore,
) -> Result<Bid, ApiError> {
    info!("{:<12} --> 입찰 수정 id: {} {:?}", "Admin", bid_id, cmd);
    if let Some(amount) = cmd.amount {
        valid_amount(amount)?;
    }
    let patch = BidPatch {
        bidder_name: cmd.name,
        bidder_email: cmd.email,
        bidder_phone: cmd.phone,
        amount: cmd.amount,
    };
    store
        .update_bid(bid_id, patch)
        .await?
        .ok_or_else(bid_not_found)
}

pub async fn delete_bid(bid_id: i64, store: &SharedStore) -> Result<(), ApiError> {
    info!("{:<12} --> 입찰 삭제 id: {}", "Admin", bid_id);
    if !store.delete_bid(bid_id).await? {
        return Err(bid_not_found());
    }
    Ok(())
}

// endregion: --- Bid Commands

// region:    --- Validation Helpers

fn item_not_found() -> ApiError {
    ApiError::NotFound("상품을 찾을 수 없습니다.".to_string())
}

fn bid_not_found() -> ApiError {
    ApiError::NotFound("입찰을 찾을 수 없습니다.".to_string())
}

fn required_text(value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation(
            "모든 필드를 입력해야 합니다.".to_string(),
        )),
    }
}

fn required_amount(value: Option<f64>) -> Result<f64, ApiError> {
    let amount = value.ok_or_else(|| {
        ApiError::Validation("모든 필드를 입력해야 합니다.".to_string())
    })?;
    valid_amount(amount)?;
    Ok(amount)
}

fn valid_amount(amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation(
            "금액은 0보다 큰 숫자여야 합니다.".to_string(),
        ));
    }
    Ok(())
}

// endregion: --- Validation Helpers
