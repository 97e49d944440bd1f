/// 영속성 계약
/// 비딩 엔진은 구체 저장 기술이 아니라 이 트레이트에만 의존한다.
/// 구현체는 두 가지: 플랫 JSON 파일(json)과 PostgreSQL(postgres).
/// 두 구현 모두 상품 단위의 원자적 read-modify-write를 보장해야 한다.
// region:    --- Imports
use crate::bidding::model::{Bid, BidPatch, BidderInfo, Item, ItemPatch, NewItem};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub mod json;
pub mod postgres;

// endregion: --- Imports

// region:    --- Store Error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("저장소 입출력 오류: {0}")]
    Io(#[from] std::io::Error),

    #[error("저장소 직렬화 오류: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
}
// endregion: --- Store Error

// region:    --- Bid Outcome

/// 원자적 입찰 커밋의 결과
#[derive(Debug)]
pub enum BidOutcome {
    /// 커밋 시점의 최고가를 넘어서 수락된 입찰
    Committed(Bid),
    /// 커밋 시점의 최고가 이하라서 거절. current는 그 시점의 최고가.
    Outbid { current: f64 },
    /// 커밋 시점에 상품이 없거나 비활성으로 바뀜
    MissingItem,
}
// endregion: --- Bid Outcome

// region:    --- Auction Store Trait
#[async_trait]
pub trait AuctionStore: Send + Sync {
    // 상품 카탈로그
    async fn list_items(&self) -> Result<Vec<Item>, StoreError>;
    async fn get_item(&self, item_id: i64) -> Result<Option<Item>, StoreError>;
    async fn insert_item(&self, new: NewItem) -> Result<Item, StoreError>;
    async fn update_item(&self, item_id: i64, patch: ItemPatch)
        -> Result<Option<Item>, StoreError>;
    /// 상품과 그 입찰 전부를 하나의 원자적 단위로 삭제. 부분 완료는 허용되지 않는다.
    async fn delete_item_cascade(&self, item_id: i64) -> Result<bool, StoreError>;

    /// 최고가 재검증과 추가를 상품 단위 임계 구역 안에서 수행한다.
    /// 요청 시작 시점이 아니라 커밋 시점의 최고가를 기준으로 판정한다.
    async fn append_bid_if_highest(
        &self,
        item_id: i64,
        bidder: BidderInfo,
        amount: f64,
    ) -> Result<BidOutcome, StoreError>;

    /// 관리자 전용 무검증 삽입. 최고가 검증을 건너뛴다. 상품이 없으면 None.
    async fn insert_bid(
        &self,
        item_id: i64,
        bidder: BidderInfo,
        amount: f64,
    ) -> Result<Option<Bid>, StoreError>;
    async fn get_bid(&self, bid_id: i64) -> Result<Option<Bid>, StoreError>;
    async fn update_bid(&self, bid_id: i64, patch: BidPatch)
        -> Result<Option<Bid>, StoreError>;
    async fn delete_bid(&self, bid_id: i64) -> Result<bool, StoreError>;

    /// 상품의 입찰 전체. 접수 순서(placed_at 오름차순) 기준.
    async fn bids_for_item(&self, item_id: i64) -> Result<Vec<Bid>, StoreError>;
    /// 전체 입찰. 정렬은 보장하지 않으며 읽기 계층이 필요한 순서로 재정렬한다.
    async fn all_bids(&self) -> Result<Vec<Bid>, StoreError>;
    /// 현재 최고 입찰. 입찰이 없으면 None(시작가 폴백은 호출자 몫).
    async fn highest_bid(&self, item_id: i64) -> Result<Option<Bid>, StoreError>;
}

pub type SharedStore = Arc<dyn AuctionStore>;
// endregion: --- Auction Store Trait

// region:    --- Seed Catalog

/// 카탈로그가 비어 있으면 기본 상품을 등록한다. (로터리 클럽 풋볼 티켓 경매)
pub async fn seed_default_items(store: &SharedStore) -> Result<(), StoreError> {
    if !store.list_items().await?.is_empty() {
        return Ok(());
    }

    let defaults = default_items();
    let count = defaults.len();
    for new in defaults {
        store.insert_item(new).await?;
    }
    info!("{:<12} --> 기본 상품 {}건을 등록했습니다.", "Store", count);
    Ok(())
}

fn default_items() -> Vec<NewItem> {
    const DESCRIPTION: &str = "Four Tickets in Section 7 with Parking Pass in Garnet Way";
    let games: [(&str, &str, f64); 6] = [
        ("SC State Bulldogs", "Sept 6 @ 7:00PM", 25.0),
        ("Vanderbilt Commodores", "Sept 13", 50.0),
        ("Kentucky Wildcats", "Sept 27", 75.0),
        ("Oklahoma Sooners", "Oct 18", 100.0),
        ("Alabama Crimson Tide", "Oct 25", 150.0),
        ("Coastal Carolina Chanticleers", "Nov 22", 40.0),
    ];

    games
        .into_iter()
        .map(|(title, event_date, starting_bid)| NewItem {
            title: title.to_string(),
            description: DESCRIPTION.to_string(),
            event_date: event_date.to_string(),
            starting_bid,
        })
        .collect()
}
// endregion: --- Seed Catalog
