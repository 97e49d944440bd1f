/// 환경 변수 기반 설정
/// PORT, ADMIN_PASSWORD, AUCTION_END_TIME(RFC 3339), DATA_DIR, DATABASE_URL(선택).
/// 마감 시각은 고정 설정값이며 실행 중 바뀌지 않는다.
// region:    --- Imports
use crate::auction::AuctionClock;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

// endregion: --- Imports

// region:    --- Config

/// 기본 마감 시각 (2024년 8월 29일 오후 2시 EST)
const DEFAULT_END_TIME: &str = "2024-08-29T14:00:00-04:00";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ADMIN_PASSWORD: &str = "duckbid2024";
const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub admin_password: String,
    pub auction_end_time: DateTime<Utc>,
    pub data_dir: PathBuf,
    /// 설정되어 있으면 PostgreSQL 저장소, 없으면 JSON 파일 저장소를 쓴다.
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse::<u16>()?,
            Err(_) => DEFAULT_PORT,
        };

        let admin_password = std::env::var("ADMIN_PASSWORD")
            .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());

        let end_time_raw =
            std::env::var("AUCTION_END_TIME").unwrap_or_else(|_| DEFAULT_END_TIME.to_string());
        let auction_end_time = DateTime::parse_from_rfc3339(&end_time_raw)?.with_timezone(&Utc);

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let database_url = std::env::var("DATABASE_URL").ok();

        Ok(Self {
            port,
            admin_password,
            auction_end_time,
            data_dir,
            database_url,
        })
    }
}

/// 핸들러가 공유하는 애플리케이션 컨텍스트
#[derive(Debug, Clone)]
pub struct AppContext {
    pub clock: AuctionClock,
    pub admin_password: String,
}
// endregion: --- Config
