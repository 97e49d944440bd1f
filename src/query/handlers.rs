/// 읽기 측 파생 조회
/// 낙찰 상태는 절대 캐시하지 않고 호출 시점의 입찰 원장에서 매번 다시 계산한다.
/// 관리자가 입찰을 지우거나 고치면 별도 재계산 단계 없이 다음 읽기부터 반영된다.
// region:    --- Imports
use crate::auction::AuctionClock;
use crate::bidding::model::{winning_bid, Bid, Item};
use crate::error::ApiError;
use crate::store::{AuctionStore, SharedStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

// endregion: --- Imports

// region:    --- Views

/// 공개 목록용 상품 뷰. 낙찰자 이름만 노출하고 연락처는 내보내지 않는다.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicItemView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub starting_bid: f64,
    pub current_bid: f64,
    pub high_bidder_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicListing {
    pub items: Vec<PublicItemView>,
    pub auction_open: bool,
    pub deadline: DateTime<Utc>,
}

/// 현재 최고 입찰. 입찰이 없으면 시작가 폴백이며 bidder_name은 None.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestBid {
    pub amount: f64,
    pub bidder_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminItemView {
    #[serde(flatten)]
    pub item: Item,
    pub current_bid: f64,
    pub high_bidder: Option<Bid>,
    pub total_bid_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBidView {
    pub id: i64,
    pub item_id: i64,
    pub item_title: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub amount: f64,
    pub placed_at: DateTime<Utc>,
    pub is_winning: bool,
}
// endregion: --- Views

// region:    --- Query Handlers

/// 공개 상품 목록. 활성 상품만, 낙찰자 이름만 포함한다.
pub async fn list_public_items(
    store: &SharedStore,
    clock: &AuctionClock,
) -> Result<PublicListing, ApiError> {
    info!("{:<12} --> 공개 상품 목록 조회", "Query");
    let items = store.list_items().await?;
    let by_item = bids_by_item(store).await?;

    let views = items
        .into_iter()
        .filter(|item| item.active)
        .map(|item| {
            let winner = by_item.get(&item.id).and_then(|bids| winning_bid(bids));
            PublicItemView {
                id: item.id,
                title: item.title,
                description: item.description,
                event_date: item.event_date,
                starting_bid: item.starting_bid,
                current_bid: winner.map(|b| b.amount).unwrap_or(item.starting_bid),
                high_bidder_name: winner.map(|b| b.bidder_name.clone()),
            }
        })
        .collect();

    Ok(PublicListing {
        items: views,
        auction_open: clock.is_open(),
        deadline: clock.end_time(),
    })
}

/// 현재 최고 입찰 조회. 입찰이 없으면 시작가 폴백.
pub async fn get_highest(store: &SharedStore, item_id: i64) -> Result<HighestBid, ApiError> {
    info!("{:<12} --> 최고 입찰 조회 id: {}", "Query", item_id);
    let item = store
        .get_item(item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("상품을 찾을 수 없습니다.".to_string()))?;

    Ok(match store.highest_bid(item_id).await? {
        Some(bid) => HighestBid {
            amount: bid.amount,
            bidder_name: Some(bid.bidder_name),
        },
        None => HighestBid {
            amount: item.starting_bid,
            bidder_name: None,
        },
    })
}

/// 관리자 상품 목록. 비활성 상품도 포함하고 낙찰 입찰 전체 레코드를 싣는다.
pub async fn list_admin_items(store: &SharedStore) -> Result<Vec<AdminItemView>, ApiError> {
    info!("{:<12} --> 관리자 상품 목록 조회", "Query");
    let items = store.list_items().await?;
    let by_item = bids_by_item(store).await?;

    Ok(items
        .into_iter()
        .map(|item| {
            let bids = by_item.get(&item.id).map(Vec::as_slice).unwrap_or(&[]);
            let winner = winning_bid(bids);
            AdminItemView {
                current_bid: winner.map(|b| b.amount).unwrap_or(item.starting_bid),
                high_bidder: winner.cloned(),
                total_bid_count: bids.len(),
                item,
            }
        })
        .collect())
}

/// 관리자 입찰 목록. 최신순 정렬, 상품별 낙찰 여부는 매번 다시 계산한다.
pub async fn list_admin_bids(store: &SharedStore) -> Result<Vec<AdminBidView>, ApiError> {
    info!("{:<12} --> 관리자 입찰 목록 조회", "Query");
    let items = store.list_items().await?;
    let titles: HashMap<i64, String> = items.into_iter().map(|i| (i.id, i.title)).collect();
    let by_item = bids_by_item(store).await?;

    // 상품별 단일 낙찰 입찰 id
    let winners: HashMap<i64, i64> = by_item
        .iter()
        .filter_map(|(item_id, bids)| winning_bid(bids).map(|b| (*item_id, b.id)))
        .collect();

    let mut views: Vec<AdminBidView> = by_item
        .into_values()
        .flatten()
        .map(|bid| AdminBidView {
            is_winning: winners.get(&bid.item_id) == Some(&bid.id),
            item_title: titles
                .get(&bid.item_id)
                .cloned()
                .unwrap_or_else(|| "Unknown Item".to_string()),
            id: bid.id,
            item_id: bid.item_id,
            name: bid.bidder_name,
            email: bid.bidder_email,
            phone: bid.bidder_phone,
            amount: bid.amount,
            placed_at: bid.placed_at,
        })
        .collect();

    views.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then_with(|| b.id.cmp(&a.id)));
    Ok(views)
}

async fn bids_by_item(store: &SharedStore) -> Result<HashMap<i64, Vec<Bid>>, ApiError> {
    let mut by_item: HashMap<i64, Vec<Bid>> = HashMap::new();
    for bid in store.all_bids().await? {
        by_item.entry(bid.item_id).or_default().push(bid);
    }
    Ok(by_item)
}

// endregion: --- Query Handlers
