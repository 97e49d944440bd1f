use chrono::{Duration, Utc};
use duckbid::admin::commands as admin;
use duckbid::admin::commands::{
    CreateBidCommand, CreateItemCommand, UpdateBidCommand, UpdateItemCommand,
};
use duckbid::auction::AuctionClock;
use duckbid::bidding::commands::{handle_place_bid, PlaceBidCommand};
use duckbid::bidding::model::Item;
use duckbid::error::ApiError;
use duckbid::query;
use duckbid::store::json::JsonStore;
use duckbid::store::{AuctionStore, SharedStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 테스트마다 격리된 데이터 디렉터리를 쓰는 JSON 저장소 설정
async fn setup(tag: &str) -> SharedStore {
    let dir = std::env::temp_dir().join(format!(
        "duckbid-test-{}-{}-{}",
        tag,
        std::process::id(),
        DIR_COUNTER.fetch_add(1, Ordering::SeqCst),
    ));
    Arc::new(JsonStore::open(&dir).await.expect("저장소 열기 실패"))
}

/// 아직 마감되지 않은 시계
fn open_clock() -> AuctionClock {
    AuctionClock::new(Utc::now() + Duration::hours(2))
}

/// 이미 마감된 시계
fn closed_clock() -> AuctionClock {
    AuctionClock::new(Utc::now() - Duration::hours(2))
}

/// 테스트용 상품 생성
async fn create_test_item(store: &SharedStore, title: &str, starting_bid: f64) -> Item {
    admin::create_item(
        CreateItemCommand {
            title: Some(title.to_string()),
            description: Some("테스트용 상품입니다.".to_string()),
            event_date: Some("Sept 6 @ 7:00PM".to_string()),
            starting_bid: Some(starting_bid),
        },
        store,
    )
    .await
    .expect("상품 등록 실패")
}

fn bid_cmd(item_id: i64, name: &str, amount: f64) -> PlaceBidCommand {
    PlaceBidCommand {
        item_id: Some(item_id),
        name: Some(name.to_string()),
        email: Some(format!("{name}@example.com")),
        phone: Some("803-555-0100".to_string()),
        amount: Some(amount),
    }
}

/// 시작가보다 높은 입찰은 수락되고 현재 최고가가 된다
#[tokio::test]
async fn test_place_bid_accepted() {
    let store = setup("accept").await;
    let clock = open_clock();
    let item = create_test_item(&store, "입찰 테스트 상품", 25.0).await;

    let bid = handle_place_bid(bid_cmd(item.id, "alice", 30.0), &store, &clock)
        .await
        .expect("입찰이 수락되어야 한다");
    assert_eq!(bid.amount, 30.0);

    let highest = query::handlers::get_highest(&store, item.id).await.unwrap();
    assert_eq!(highest.amount, 30.0);
    assert_eq!(highest.bidder_name.as_deref(), Some("alice"));
}

/// 현재 최고가 이하의 입찰은 현재 금액을 담은 메시지와 함께 거절된다
#[tokio::test]
async fn test_low_bid_rejected_with_current_amount() {
    let store = setup("low-bid").await;
    let clock = open_clock();
    let item = create_test_item(&store, "저가 입찰 테스트 상품", 25.0).await;

    handle_place_bid(bid_cmd(item.id, "alice", 30.0), &store, &clock)
        .await
        .unwrap();

    // 시작가(25)보다는 높지만 현재 최고가(30) 이하인 입찰
    let err = handle_place_bid(bid_cmd(item.id, "bob", 28.0), &store, &clock)
        .await
        .expect_err("최고가 이하 입찰은 거절되어야 한다");
    match &err {
        ApiError::BidTooLow { current } => assert_eq!(*current, 30.0),
        other => panic!("BidTooLow가 아닌 오류: {other:?}"),
    }
    assert!(err.to_string().contains("30"));

    // 같은 금액도 거절 (strictly greater)
    let err = handle_place_bid(bid_cmd(item.id, "bob", 30.0), &store, &clock)
        .await
        .expect_err("동일 금액 입찰은 거절되어야 한다");
    assert!(matches!(err, ApiError::BidTooLow { .. }));
}

/// 마감 검사가 가장 먼저다: 필드가 누락된 요청도 마감 후에는 마감 오류로 응답한다
#[tokio::test]
async fn test_closed_auction_rejects_everything_first() {
    let store = setup("closed").await;
    let clock = closed_clock();
    let item = create_test_item(&store, "마감 테스트 상품", 25.0).await;

    let err = handle_place_bid(bid_cmd(item.id, "alice", 100.0), &store, &clock)
        .await
        .expect_err("마감 후 입찰은 거절되어야 한다");
    assert!(matches!(err, ApiError::AuctionClosed));

    // 빈 요청이라도 마감이 먼저 보고된다
    let empty = PlaceBidCommand {
        item_id: None,
        name: None,
        email: None,
        phone: None,
        amount: None,
    };
    let err = handle_place_bid(empty, &store, &clock).await.unwrap_err();
    assert!(matches!(err, ApiError::AuctionClosed));
}

/// 필드 검증: 누락 필드와 0 이하 금액은 ValidationError
#[tokio::test]
async fn test_field_validation() {
    let store = setup("validation").await;
    let clock = open_clock();
    let item = create_test_item(&store, "검증 테스트 상품", 25.0).await;

    let mut missing_name = bid_cmd(item.id, "alice", 30.0);
    missing_name.name = Some("   ".to_string());
    let err = handle_place_bid(missing_name, &store, &clock).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = handle_place_bid(bid_cmd(item.id, "alice", 0.0), &store, &clock)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = handle_place_bid(bid_cmd(item.id, "alice", -5.0), &store, &clock)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

/// 없는 상품/비활성 상품에 대한 입찰은 NotFound
#[tokio::test]
async fn test_unknown_or_inactive_item_rejected() {
    let store = setup("not-found").await;
    let clock = open_clock();

    let err = handle_place_bid(bid_cmd(999, "alice", 30.0), &store, &clock)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let item = create_test_item(&store, "비활성 테스트 상품", 25.0).await;
    admin::update_item(
        item.id,
        UpdateItemCommand {
            active: Some(false),
            ..Default::default()
        },
        &store,
    )
    .await
    .unwrap();

    let err = handle_place_bid(bid_cmd(item.id, "alice", 30.0), &store, &clock)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

/// 명세 시나리오: 시작가 25, A 30 수락, B 28 거절(메시지에 30), C 40 수락,
/// 관리자가 C를 지우면 최고가는 다시 30의 A
#[tokio::test]
async fn test_reference_scenario() {
    let store = setup("scenario").await;
    let clock = open_clock();
    let item = create_test_item(&store, "시나리오 상품", 25.0).await;

    let bid_a = handle_place_bid(bid_cmd(item.id, "A", 30.0), &store, &clock)
        .await
        .unwrap();
    assert_eq!(bid_a.amount, 30.0);

    let err = handle_place_bid(bid_cmd(item.id, "B", 28.0), &store, &clock)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("30"));

    let bid_c = handle_place_bid(bid_cmd(item.id, "C", 40.0), &store, &clock)
        .await
        .unwrap();

    let highest = query::handlers::get_highest(&store, item.id).await.unwrap();
    assert_eq!(highest.amount, 40.0);

    admin::delete_bid(bid_c.id, &store).await.unwrap();

    let highest = query::handlers::get_highest(&store, item.id).await.unwrap();
    assert_eq!(highest.amount, 30.0);
    assert_eq!(highest.bidder_name.as_deref(), Some("A"));

    // 남은 입찰까지 지우면 시작가 폴백
    admin::delete_bid(bid_a.id, &store).await.unwrap();
    let highest = query::handlers::get_highest(&store, item.id).await.unwrap();
    assert_eq!(highest.amount, 25.0);
    assert!(highest.bidder_name.is_none());
}

/// 상품 삭제는 입찰까지 연쇄 삭제하고, 삭제된 입찰 id 조회는 NotFound
#[tokio::test]
async fn test_item_delete_cascades_bids() {
    let store = setup("cascade").await;
    let clock = open_clock();
    let item = create_test_item(&store, "연쇄 삭제 상품", 10.0).await;

    let mut bid_ids = Vec::new();
    for (name, amount) in [("a", 20.0), ("b", 30.0), ("c", 40.0)] {
        let bid = handle_place_bid(bid_cmd(item.id, name, amount), &store, &clock)
            .await
            .unwrap();
        bid_ids.push(bid.id);
    }

    admin::delete_item(item.id, &store).await.unwrap();

    for bid_id in bid_ids {
        let err = admin::get_bid(bid_id, &store).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
    assert!(store.bids_for_item(item.id).await.unwrap().is_empty());

    // 같은 상품을 다시 지우면 NotFound
    let err = admin::delete_item(item.id, &store).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

/// 비활성화하면 공개 목록에서는 즉시 빠지고 관리자 목록에는 이력째 남는다
#[tokio::test]
async fn test_deactivated_item_hidden_from_public_only() {
    let store = setup("deactivate").await;
    let clock = open_clock();
    let item = create_test_item(&store, "비활성화 상품", 25.0).await;
    handle_place_bid(bid_cmd(item.id, "alice", 30.0), &store, &clock)
        .await
        .unwrap();

    admin::update_item(
        item.id,
        UpdateItemCommand {
            active: Some(false),
            ..Default::default()
        },
        &store,
    )
    .await
    .unwrap();

    let public = query::handlers::list_public_items(&store, &clock)
        .await
        .unwrap();
    assert!(public.items.iter().all(|i| i.id != item.id));

    let admin_items = query::handlers::list_admin_items(&store).await.unwrap();
    let view = admin_items
        .iter()
        .find(|v| v.item.id == item.id)
        .expect("관리자 목록에는 남아야 한다");
    assert!(!view.item.active);
    assert_eq!(view.total_bid_count, 1);
    assert_eq!(view.current_bid, 30.0);
}

/// 공개 목록은 낙찰자 이름만 내보내고 연락처는 포함하지 않는다
#[tokio::test]
async fn test_public_listing_shape() {
    let store = setup("public").await;
    let clock = open_clock();
    let item = create_test_item(&store, "공개 목록 상품", 25.0).await;
    handle_place_bid(bid_cmd(item.id, "alice", 30.0), &store, &clock)
        .await
        .unwrap();

    let listing = query::handlers::list_public_items(&store, &clock)
        .await
        .unwrap();
    assert!(listing.auction_open);

    let json = serde_json::to_value(&listing.items[0]).unwrap();
    assert_eq!(json["currentBid"], 30.0);
    assert_eq!(json["highBidderName"], "alice");
    assert!(json.get("bidderEmail").is_none());
    assert!(json.get("bidderPhone").is_none());
}

/// 관리자 입찰 등록은 최고가 검증을 건너뛰고, 낙찰 표시는 읽을 때마다 다시 계산된다
#[tokio::test]
async fn test_admin_bid_bypasses_amount_check() {
    let store = setup("admin-bid").await;
    let clock = open_clock();
    let item = create_test_item(&store, "관리자 입찰 상품", 25.0).await;
    handle_place_bid(bid_cmd(item.id, "alice", 50.0), &store, &clock)
        .await
        .unwrap();

    // 현재 최고가(50)보다 낮은 금액도 관리자 경로로는 들어간다
    let low = admin::create_bid(
        CreateBidCommand {
            item_id: Some(item.id),
            name: Some("manual".to_string()),
            email: Some("manual@example.com".to_string()),
            phone: Some("803-555-0101".to_string()),
            amount: Some(10.0),
        },
        &store,
    )
    .await
    .unwrap();
    assert_eq!(low.amount, 10.0);

    // 낙찰 계산은 정렬/검증을 전제하지 않고 최대값을 올바르게 고른다
    let highest = query::handlers::get_highest(&store, item.id).await.unwrap();
    assert_eq!(highest.amount, 50.0);

    // 관리자가 낮은 입찰을 최고가 위로 수정하면 낙찰자가 즉시 바뀐다
    admin::update_bid(
        low.id,
        UpdateBidCommand {
            amount: Some(75.0),
            ..Default::default()
        },
        &store,
    )
    .await
    .unwrap();
    let highest = query::handlers::get_highest(&store, item.id).await.unwrap();
    assert_eq!(highest.amount, 75.0);
    assert_eq!(highest.bidder_name.as_deref(), Some("manual"));
}

/// 관리자 입찰 목록: 최신순 정렬이고 상품별 낙찰 표시는 정확히 하나다
#[tokio::test]
async fn test_admin_bid_listing_single_winner() {
    let store = setup("winner").await;
    let clock = open_clock();
    let item = create_test_item(&store, "낙찰 표시 상품", 25.0).await;
    handle_place_bid(bid_cmd(item.id, "alice", 40.0), &store, &clock)
        .await
        .unwrap();

    // 관리자 경로로 같은 금액을 한 번 더 넣어 동률을 만든다
    admin::create_bid(
        CreateBidCommand {
            item_id: Some(item.id),
            name: Some("duplicate".to_string()),
            email: Some("dup@example.com".to_string()),
            phone: Some("803-555-0102".to_string()),
            amount: Some(40.0),
        },
        &store,
    )
    .await
    .unwrap();

    let bids = query::handlers::list_admin_bids(&store).await.unwrap();
    assert_eq!(bids.len(), 2);
    // 최신순
    assert!(bids[0].placed_at >= bids[1].placed_at);
    // 동률이어도 낙찰은 단 하나, 먼저 접수된 쪽이다
    let winners: Vec<_> = bids.iter().filter(|b| b.is_winning).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].name, "alice");
}

/// 상품 부분 수정: 전달한 필드만 바뀐다
#[tokio::test]
async fn test_partial_item_update() {
    let store = setup("patch").await;
    let item = create_test_item(&store, "수정 전 제목", 25.0).await;

    let updated = admin::update_item(
        item.id,
        UpdateItemCommand {
            title: Some("수정 후 제목".to_string()),
            ..Default::default()
        },
        &store,
    )
    .await
    .unwrap();

    assert_eq!(updated.title, "수정 후 제목");
    assert_eq!(updated.description, item.description);
    assert_eq!(updated.starting_bid, 25.0);
    assert!(updated.active);
}

/// 동시성: 같은 상품에 대한 동시 입찰에서 낡은 최고가로 둘 다 수락되는 일이 없다
#[tokio::test]
async fn test_concurrent_bidding_same_item() {
    let store = setup("concurrent").await;
    let item = create_test_item(&store, "동시성 테스트 상품", 25.0).await;

    let mut handles = Vec::new();
    for i in 1..=50i64 {
        let store = Arc::clone(&store);
        let amount = 25.0 + (i as f64) * 5.0;
        let item_id = item.id;
        handles.push(tokio::spawn(async move {
            handle_place_bid(
                bid_cmd(item_id, &format!("bidder-{i}"), amount),
                &store,
                &open_clock(),
            )
            .await
        }));
    }

    let mut accepted = 0usize;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(ApiError::BidTooLow { .. }) => {}
            Err(other) => panic!("예상 밖 오류: {other:?}"),
        }
    }

    // 최대 금액 입찰은 평가 시점의 어떤 최고가보다도 크므로 반드시 수락된다
    let highest = query::handlers::get_highest(&store, item.id).await.unwrap();
    assert_eq!(highest.amount, 25.0 + 50.0 * 5.0);

    // 원장은 접수 순서대로 엄격히 증가해야 한다 (수락된 수와도 일치)
    let ledger = store.bids_for_item(item.id).await.unwrap();
    assert_eq!(ledger.len(), accepted);
    assert!(accepted >= 1);
    for pair in ledger.windows(2) {
        assert!(pair[1].amount > pair[0].amount);
        assert!(pair[1].placed_at >= pair[0].placed_at);
    }
}

/// 서로 다른 상품에 대한 동시 입찰은 서로 간섭하지 않는다
#[tokio::test]
async fn test_concurrent_bidding_across_items() {
    let store = setup("concurrent-items").await;
    let item_a = create_test_item(&store, "상품 A", 10.0).await;
    let item_b = create_test_item(&store, "상품 B", 10.0).await;

    let mut handles = Vec::new();
    for i in 1..=20i64 {
        for item_id in [item_a.id, item_b.id] {
            let store = Arc::clone(&store);
            let amount = 10.0 + (i as f64) * 2.0;
            handles.push(tokio::spawn(async move {
                handle_place_bid(
                    bid_cmd(item_id, &format!("bidder-{i}"), amount),
                    &store,
                    &open_clock(),
                )
                .await
            }));
        }
    }
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) | Err(ApiError::BidTooLow { .. }) => {}
            Err(other) => panic!("예상 밖 오류: {other:?}"),
        }
    }

    for item_id in [item_a.id, item_b.id] {
        let highest = query::handlers::get_highest(&store, item_id).await.unwrap();
        assert_eq!(highest.amount, 10.0 + 20.0 * 2.0);
    }
}

/// 관리자 인증: 올바른 비밀번호에만 토큰을 발급한다
#[tokio::test]
async fn test_admin_auth() {
    use axum::extract::State;
    use duckbid::auth::{self, AuthCommand};
    use duckbid::config::AppContext;

    let store = setup("auth").await;
    let ctx = Arc::new(AppContext {
        clock: open_clock(),
        admin_password: "test-password".to_string(),
    });
    let state = (store, ctx);

    let ok = auth::handle_admin_auth(
        State(state.clone()),
        axum::Json(AuthCommand {
            password: Some("test-password".to_string()),
        }),
    )
    .await
    .expect("올바른 비밀번호는 인증되어야 한다");
    assert_eq!(ok.0["token"], auth::ADMIN_TOKEN);

    let err = auth::handle_admin_auth(
        State(state),
        axum::Json(AuthCommand {
            password: Some("wrong".to_string()),
        }),
    )
    .await
    .expect_err("틀린 비밀번호는 거절되어야 한다");
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

/// 플러시 실패 시 입찰은 메모리에도 디스크에도 남지 않는다 (부분 상태 없음)
#[tokio::test]
async fn test_failed_flush_leaves_no_partial_state() {
    let dir = std::env::temp_dir().join(format!(
        "duckbid-test-flush-fail-{}-{}",
        std::process::id(),
        DIR_COUNTER.fetch_add(1, Ordering::SeqCst),
    ));

    let store: SharedStore = Arc::new(JsonStore::open(&dir).await.unwrap());
    let item = create_test_item(&store, "플러시 실패 상품", 25.0).await;

    // 임시 파일 자리를 디렉터리로 막아 bids.json 플러시를 강제로 실패시킨다
    let blocker = dir.join("bids.json.tmp");
    tokio::fs::create_dir_all(&blocker).await.unwrap();

    let err = handle_place_bid(bid_cmd(item.id, "alice", 30.0), &store, &open_clock())
        .await
        .expect_err("플러시가 실패한 입찰은 오류여야 한다");
    assert!(matches!(err, ApiError::Persistence(_)));

    // 메모리 상태가 롤백되어 입찰이 보이지 않는다
    assert!(store.bids_for_item(item.id).await.unwrap().is_empty());
    let highest = query::handlers::get_highest(&store, item.id).await.unwrap();
    assert_eq!(highest.amount, 25.0);
    assert!(highest.bidder_name.is_none());

    // 다시 열어도 디스크에 입찰이 없다
    let reopened: SharedStore = Arc::new(JsonStore::open(&dir).await.unwrap());
    assert!(reopened.bids_for_item(item.id).await.unwrap().is_empty());

    // 장애를 제거하면 같은 입찰이 정상 수락된다 (자동 재시도는 없다)
    tokio::fs::remove_dir(&blocker).await.unwrap();
    let bid = handle_place_bid(bid_cmd(item.id, "alice", 30.0), &store, &open_clock())
        .await
        .expect("장애 제거 후 입찰은 수락되어야 한다");
    assert_eq!(bid.amount, 30.0);
}

/// 저장소를 다시 열어도 상품/입찰/다음 id가 보존된다
#[tokio::test]
async fn test_reopen_preserves_state() {
    let dir = std::env::temp_dir().join(format!(
        "duckbid-test-reopen-{}-{}",
        std::process::id(),
        DIR_COUNTER.fetch_add(1, Ordering::SeqCst),
    ));

    let item_id;
    let first_bid_id;
    {
        let store: SharedStore = Arc::new(JsonStore::open(&dir).await.unwrap());
        let item = create_test_item(&store, "재시작 상품", 25.0).await;
        item_id = item.id;
        let bid = handle_place_bid(bid_cmd(item.id, "alice", 30.0), &store, &open_clock())
            .await
            .unwrap();
        first_bid_id = bid.id;
    }

    let store: SharedStore = Arc::new(JsonStore::open(&dir).await.unwrap());
    let highest = query::handlers::get_highest(&store, item_id).await.unwrap();
    assert_eq!(highest.amount, 30.0);

    // 새 입찰 id는 기존 id와 겹치지 않는다
    let bid = handle_place_bid(bid_cmd(item_id, "bob", 35.0), &store, &open_clock())
        .await
        .unwrap();
    assert!(bid.id > first_bid_id);
}
