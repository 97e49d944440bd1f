// region:    --- Imports
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use duckbid::auction::AuctionClock;
use duckbid::config::{AppContext, Config};
use duckbid::store::json::JsonStore;
use duckbid::store::postgres::PostgresStore;
use duckbid::store::{self, SharedStore};
use duckbid::{auth, handlers, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    info!(
        "{:<12} --> 경매 마감 시각: {}",
        "Main", config.auction_end_time
    );

    // 저장소 선택: DATABASE_URL이 있으면 PostgreSQL, 없으면 JSON 파일
    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let pg = PostgresStore::connect(url).await?;
            pg.initialize_schema().await?;
            info!("{:<12} --> PostgreSQL 저장소 초기화 성공", "Main");
            Arc::new(pg)
        }
        None => {
            let json = JsonStore::open(&config.data_dir).await?;
            info!(
                "{:<12} --> JSON 파일 저장소 초기화 성공: {}",
                "Main",
                config.data_dir.display()
            );
            Arc::new(json)
        }
    };

    // 카탈로그가 비어 있으면 기본 상품 등록
    store::seed_default_items(&store).await?;

    let ctx = Arc::new(AppContext {
        clock: AuctionClock::new(config.auction_end_time),
        admin_password: config.admin_password.clone(),
    });
    let state: AppState = (store, ctx);

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 관리자 라우트는 토큰 가드 뒤에 둔다. 인증 발급 경로는 가드 바깥이다.
    let admin_routes = Router::new()
        .route(
            "/items",
            get(handlers::handle_admin_items).post(handlers::handle_create_item),
        )
        .route(
            "/items/:id",
            axum::routing::put(handlers::handle_update_item)
                .delete(handlers::handle_delete_item),
        )
        .route(
            "/bids",
            get(handlers::handle_admin_bids).post(handlers::handle_create_bid),
        )
        .route(
            "/bids/:id",
            get(handlers::handle_get_bid)
                .put(handlers::handle_update_bid)
                .delete(handlers::handle_delete_bid),
        )
        .layer(middleware::from_fn(auth::require_admin));

    // 라우터 설정
    let routes_all = Router::new()
        .route("/api/items", get(handlers::handle_get_items))
        .route("/api/bid", post(handlers::handle_place_bid))
        .route("/api/admin/auth", post(auth::handle_admin_auth))
        .nest("/api/admin", admin_routes)
        .layer(cors)
        .with_state(state);

    // 리스너 생성
    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
