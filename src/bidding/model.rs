// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Models

// 경매 상품 모델
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// 표시용 경기 일자 문자열. 로직에는 사용하지 않는다.
    pub event_date: String,
    pub starting_bid: f64,
    pub active: bool,
}

// 입찰 모델
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub item_id: i64,
    pub bidder_name: String,
    pub bidder_email: String,
    pub bidder_phone: String,
    pub amount: f64,
    pub placed_at: DateTime<Utc>,
}

/// 입찰자 연락처 정보
#[derive(Debug, Clone)]
pub struct BidderInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// 새 상품. id는 저장소가 부여하고 active는 기본 true.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub starting_bid: f64,
}

/// 상품 부분 수정. None인 필드는 그대로 둔다.
#[derive(Debug, Default, Clone)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub starting_bid: Option<f64>,
    pub active: Option<bool>,
}

/// 입찰 부분 수정. None인 필드는 그대로 둔다.
#[derive(Debug, Default, Clone)]
pub struct BidPatch {
    pub bidder_name: Option<String>,
    pub bidder_email: Option<String>,
    pub bidder_phone: Option<String>,
    pub amount: Option<f64>,
}

// endregion: --- Models

// region:    --- Winner Derivation

/// 낙찰 후보 선정: 금액 최대, 동률이면 가장 이른 placed_at, 그래도 같으면 낮은 id.
/// 관리자가 임의 금액을 삽입/수정할 수 있으므로 정렬이나 검증을 전제하지 않고
/// 현재 존재하는 입찰 전체에서 매번 다시 계산한다. 승자는 항상 단 하나다.
pub fn winning_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().min_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.placed_at.cmp(&b.placed_at))
            .then_with(|| a.id.cmp(&b.id))
    })
}

// endregion: --- Winner Derivation

// endregion: --- Tests
