/// 경매 시계
/// 고정된 마감 시각과 현재 시각만으로 개장 여부를 판정하는 순수 함수.
/// 상태를 저장하지 않으므로 재시작하거나 다시 조회해도 항상 같은 기준으로 판정된다.
// region:    --- Imports
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Auction Clock
#[derive(Debug, Clone, Copy)]
pub struct AuctionClock {
    end_time: DateTime<Utc>,
}

impl AuctionClock {
    pub fn new(end_time: DateTime<Utc>) -> Self {
        Self { end_time }
    }

    /// 경매 마감 시각
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// 현재 시각 기준 개장 여부
    pub fn is_open(&self) -> bool {
        self.is_open_at(Utc::now())
    }

    /// 주어진 시각 기준 개장 여부. 마감 시각과 같으면 이미 종료.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        now < self.end_time
    }
}
// endregion: --- Auction Clock

// endregion: --- Tests
