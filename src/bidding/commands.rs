/// 입찰 수락 커맨드
/// 전제 조건은 순서대로 검사하며 먼저 실패한 조건이 응답을 결정한다.
/// 1) 마감 2) 필드 3) 상품 존재/활성 4) 최고가 초과
/// 4번은 저장소의 상품 단위 임계 구역 안에서 커밋 시점 값으로 다시 검증된다.
// region:    --- Imports
use crate::auction::AuctionClock;
use crate::bidding::model::{Bid, BidderInfo};
use crate::error::ApiError;
use crate::store::{AuctionStore, BidOutcome, SharedStore};
use serde::Deserialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령. 누락 필드도 마감 검사 뒤에 보고해야 하므로 전 필드가 Option이다.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub item_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub amount: Option<f64>,
}

pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &SharedStore,
    clock: &AuctionClock,
) -> Result<Bid, ApiError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    // 1. 마감 검사. 호출 시점마다 새로 판정한다.
    if !clock.is_open() {
        return Err(ApiError::AuctionClosed);
    }

    // 2. 필드 검증
    let item_id = cmd.item_id.ok_or_else(missing_fields)?;
    let bidder = BidderInfo {
        name: required_text(cmd.name)?,
        email: required_text(cmd.email)?,
        phone: required_text(cmd.phone)?,
    };
    let amount = cmd.amount.ok_or_else(missing_fields)?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation(
            "입찰 금액은 0보다 큰 숫자여야 합니다.".to_string(),
        ));
    }

    // 3. 상품 존재/활성 검사
    match store.get_item(item_id).await? {
        Some(item) if item.active => {}
        _ => {
            return Err(ApiError::NotFound(
                "상품을 찾을 수 없거나 비활성 상태입니다.".to_string(),
            ))
        }
    }

    // 4. 최고가 검증과 추가를 저장소가 하나의 원자적 단위로 수행
    match store.append_bid_if_highest(item_id, bidder, amount).await? {
        BidOutcome::Committed(bid) => {
            info!(
                "{:<12} --> 입찰 수락: 상품 {} 금액 ${}",
                "Command", bid.item_id, bid.amount
            );
            Ok(bid)
        }
        BidOutcome::Outbid { current } => Err(ApiError::BidTooLow { current }),
        // 검사 3과 커밋 사이에 상품이 삭제/비활성화된 경우
        BidOutcome::MissingItem => Err(ApiError::NotFound(
            "상품을 찾을 수 없거나 비활성 상태입니다.".to_string(),
        )),
    }
}

fn missing_fields() -> ApiError {
    ApiError::Validation("모든 필드를 입력해야 합니다.".to_string())
}

fn required_text(value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing_fields()),
    }
}

// endregion: --- Commands
