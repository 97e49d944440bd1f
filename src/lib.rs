pub mod admin;
pub mod auction;
pub mod auth;
pub mod bidding;
pub mod config;
pub mod error;
pub mod handlers;
pub mod query;
pub mod store;

use std::sync::Arc;

/// 라우터 공유 상태: (저장소 핸들, 애플리케이션 컨텍스트)
pub type AppState = (store::SharedStore, Arc<config::AppContext>);
