/// PostgreSQL 저장소
/// 입찰 수락은 상품 행에 대한 행 잠금(SELECT ... FOR UPDATE) 트랜잭션으로
/// 상품 단위 직렬화를 얻는다. 서로 다른 상품은 서로 다른 행 잠금이므로 병렬로 진행된다.
/// 상품 삭제와 입찰 연쇄 삭제도 하나의 트랜잭션이다.
// region:    --- Imports
use super::{AuctionStore, BidOutcome, StoreError};
use crate::bidding::model::{Bid, BidPatch, BidderInfo, Item, ItemPatch, NewItem};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};

// endregion: --- Imports

// region:    --- Queries
const LIST_ITEMS: &str =
    "SELECT id, title, description, event_date, starting_bid, active FROM items ORDER BY id";

const GET_ITEM: &str =
    "SELECT id, title, description, event_date, starting_bid, active FROM items WHERE id = $1";

/// 상품 단위 임계 구역의 시작점. 같은 상품에 대한 수락은 이 행 잠금에서 직렬화된다.
const LOCK_ITEM: &str =
    "SELECT id, title, description, event_date, starting_bid, active FROM items WHERE id = $1 FOR UPDATE";

const INSERT_ITEM: &str = r#"
    INSERT INTO items (title, description, event_date, starting_bid, active)
    VALUES ($1, $2, $3, $4, TRUE)
    RETURNING id, title, description, event_date, starting_bid, active
"#;

const UPDATE_ITEM: &str = r#"
    UPDATE items SET
        title = COALESCE($2, title),
        description = COALESCE($3, description),
        event_date = COALESCE($4, event_date),
        starting_bid = COALESCE($5, starting_bid),
        active = COALESCE($6, active)
    WHERE id = $1
    RETURNING id, title, description, event_date, starting_bid, active
"#;

const DELETE_ITEM_BIDS: &str = "DELETE FROM bids WHERE item_id = $1";

const DELETE_ITEM: &str = "DELETE FROM items WHERE id = $1 RETURNING id";

/// 낙찰 후보: 금액 최대, 동률이면 이른 placed_at, 그래도 같으면 낮은 id
const HIGHEST_BID: &str = r#"
    SELECT id, item_id, bidder_name, bidder_email, bidder_phone, amount, placed_at
    FROM bids
    WHERE item_id = $1
    ORDER BY amount DESC, placed_at ASC, id ASC
    LIMIT 1
"#;

const INSERT_BID: &str = r#"
    INSERT INTO bids (item_id, bidder_name, bidder_email, bidder_phone, amount, placed_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, item_id, bidder_name, bidder_email, bidder_phone, amount, placed_at
"#;

const GET_BID: &str = r#"
    SELECT id, item_id, bidder_name, bidder_email, bidder_phone, amount, placed_at
    FROM bids
    WHERE id = $1
"#;

const UPDATE_BID: &str = r#"
    UPDATE bids SET
        bidder_name = COALESCE($2, bidder_name),
        bidder_email = COALESCE($3, bidder_email),
        bidder_phone = COALESCE($4, bidder_phone),
        amount = COALESCE($5, amount)
    WHERE id = $1
    RETURNING id, item_id, bidder_name, bidder_email, bidder_phone, amount, placed_at
"#;

const DELETE_BID: &str = "DELETE FROM bids WHERE id = $1 RETURNING id";

const BIDS_FOR_ITEM: &str = r#"
    SELECT id, item_id, bidder_name, bidder_email, bidder_phone, amount, placed_at
    FROM bids
    WHERE item_id = $1
    ORDER BY placed_at ASC, id ASC
"#;

const ALL_BIDS: &str = r#"
    SELECT id, item_id, bidder_name, bidder_email, bidder_phone, amount, placed_at
    FROM bids
"#;
// endregion: --- Queries

// region:    --- Postgres Store
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// 스키마 부트스트랩
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema_sql = include_str!("../sql/01-create-schema.sql");
        for query in schema_sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&self.pool).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AuctionStore for PostgresStore {
    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(sqlx::query_as::<_, Item>(LIST_ITEMS)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_item(&self, item_id: i64) -> Result<Option<Item>, StoreError> {
        Ok(sqlx::query_as::<_, Item>(GET_ITEM)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_item(&self, new: NewItem) -> Result<Item, StoreError> {
        Ok(sqlx::query_as::<_, Item>(INSERT_ITEM)
            .bind(new.title)
            .bind(new.description)
            .bind(new.event_date)
            .bind(new.starting_bid)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_item(
        &self,
        item_id: i64,
        patch: ItemPatch,
    ) -> Result<Option<Item>, StoreError> {
        Ok(sqlx::query_as::<_, Item>(UPDATE_ITEM)
            .bind(item_id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.event_date)
            .bind(patch.starting_bid)
            .bind(patch.active)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_item_cascade(&self, item_id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(DELETE_ITEM_BIDS)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query_scalar::<_, i64>(DELETE_ITEM)
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(deleted.is_some())
    }

    async fn append_bid_if_highest(
        &self,
        item_id: i64,
        bidder: BidderInfo,
        amount: f64,
    ) -> Result<BidOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // 행 잠금 아래에서 존재/활성과 최고가를 다시 확인한다.
        let Some(item) = sqlx::query_as::<_, Item>(LOCK_ITEM)
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(BidOutcome::MissingItem);
        };
        if !item.active {
            tx.rollback().await?;
            return Ok(BidOutcome::MissingItem);
        }

        let current = sqlx::query_as::<_, Bid>(HIGHEST_BID)
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(|b| b.amount)
            .unwrap_or(item.starting_bid);
        if amount <= current {
            tx.rollback().await?;
            return Ok(BidOutcome::Outbid { current });
        }

        let bid = sqlx::query_as::<_, Bid>(INSERT_BID)
            .bind(item_id)
            .bind(bidder.name)
            .bind(bidder.email)
            .bind(bidder.phone)
            .bind(amount)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(BidOutcome::Committed(bid))
    }

    async fn insert_bid(
        &self,
        item_id: i64,
        bidder: BidderInfo,
        amount: f64,
    ) -> Result<Option<Bid>, StoreError> {
        let mut tx = self.pool.begin().await?;
        // 공유 잠금: 동시 연쇄 삭제가 검사와 INSERT 사이에 끼어들지 못하게 한다.
        let exists =
            sqlx::query_scalar::<_, i64>("SELECT id FROM items WHERE id = $1 FOR SHARE")
                .bind(item_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let bid = sqlx::query_as::<_, Bid>(INSERT_BID)
            .bind(item_id)
            .bind(bidder.name)
            .bind(bidder.email)
            .bind(bidder.phone)
            .bind(amount)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(bid))
    }

    async fn get_bid(&self, bid_id: i64) -> Result<Option<Bid>, StoreError> {
        Ok(sqlx::query_as::<_, Bid>(GET_BID)
            .bind(bid_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_bid(
        &self,
        bid_id: i64,
        patch: BidPatch,
    ) -> Result<Option<Bid>, StoreError> {
        Ok(sqlx::query_as::<_, Bid>(UPDATE_BID)
            .bind(bid_id)
            .bind(patch.bidder_name)
            .bind(patch.bidder_email)
            .bind(patch.bidder_phone)
            .bind(patch.amount)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_bid(&self, bid_id: i64) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar::<_, i64>(DELETE_BID)
            .bind(bid_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }

    async fn bids_for_item(&self, item_id: i64) -> Result<Vec<Bid>, StoreError> {
        Ok(sqlx::query_as::<_, Bid>(BIDS_FOR_ITEM)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn all_bids(&self) -> Result<Vec<Bid>, StoreError> {
        Ok(sqlx::query_as::<_, Bid>(ALL_BIDS)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn highest_bid(&self, item_id: i64) -> Result<Option<Bid>, StoreError> {
        Ok(sqlx::query_as::<_, Bid>(HIGHEST_BID)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
// endregion: --- Postgres Store
