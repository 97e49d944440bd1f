/// 오류 분류
/// 결정적(호출자 원인) 오류는 사람이 읽을 수 있는 메시지로 그대로 응답하고,
/// 저장소 오류는 로그에만 상세를 남기고 일반 실패로 응답한다. 자동 재시도는 없다.
// region:    --- Imports
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

// region:    --- Api Error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("경매가 종료되어 더 이상 입찰할 수 없습니다.")]
    AuctionClosed,

    #[error("{0}")]
    Validation(String),

    #[error("현재 최고가 ${current}보다 높은 금액으로 입찰해야 합니다.")]
    BidTooLow { current: f64 },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("저장소 처리에 실패했습니다.")]
    Persistence(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::AuctionClosed => (StatusCode::FORBIDDEN, "AUCTION_CLOSED"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
            ApiError::BidTooLow { .. } => (StatusCode::BAD_REQUEST, "LOW_BID"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Persistence(e) => {
                // 상세 원인은 운영자용 로그로만 남긴다.
                error!("{:<12} --> 저장소 오류: {}", "Error", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE")
            }
        };

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": code,
        });
        if let ApiError::BidTooLow { current } = &self {
            body["currentBid"] = serde_json::json!(current);
        }

        (status, Json(body)).into_response()
    }
}
// endregion: --- Api Error
