/// 플랫 JSON 파일 저장소
/// data 디렉터리의 items.json / bids.json 두 문서를 통째로 읽고 쓴다.
/// 모든 변경은 상태 쓰기 잠금 안에서 검증-수정-플러시를 마치므로
/// 같은 상품에 대한 동시 입찰이 같은 낡은 최고가를 보고 둘 다 수락되는 일이 없다.
/// 플러시는 임시 파일에 쓴 뒤 rename으로 교체하고, 실패하면 메모리 상태를 되돌린다.
// region:    --- Imports
use super::{AuctionStore, BidOutcome, StoreError};
use crate::bidding::model::{winning_bid, Bid, BidPatch, BidderInfo, Item, ItemPatch, NewItem};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::error;

// endregion: --- Imports

const ITEMS_FILE: &str = "items.json";
const BIDS_FILE: &str = "bids.json";

// region:    --- Json Store
#[derive(Debug, Default, Clone)]
struct JsonState {
    items: Vec<Item>,
    /// 상품 id별 입찰 목록. 원본 파일 배치 그대로 접수 순서를 유지한다.
    bids: HashMap<i64, Vec<Bid>>,
    next_bid_id: i64,
}

pub struct JsonStore {
    data_dir: PathBuf,
    state: RwLock<JsonState>,
}

impl JsonStore {
    /// 디렉터리를 준비하고 기존 파일이 있으면 읽어 들인다.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&data_dir).await?;

        let items: Vec<Item> = match tokio::fs::read(data_dir.join(ITEMS_FILE)).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let bids: HashMap<i64, Vec<Bid>> = match tokio::fs::read(data_dir.join(BIDS_FILE)).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        let next_bid_id = bids
            .values()
            .flatten()
            .map(|b| b.id)
            .max()
            .unwrap_or(0)
            + 1;

        Ok(Self {
            data_dir,
            state: RwLock::new(JsonState {
                items,
                bids,
                next_bid_id,
            }),
        })
    }

    /// 임시 파일에 쓰고 rename으로 교체한다. 부분 기록된 문서가 보이지 않게 한다.
    async fn write_file(&self, name: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = self.data_dir.join(name);
        let tmp = self.data_dir.join(format!("{name}.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn persist(&self, state: &JsonState) -> Result<(), StoreError> {
        self.write_file(ITEMS_FILE, serde_json::to_vec_pretty(&state.items)?)
            .await?;
        self.write_file(BIDS_FILE, serde_json::to_vec_pretty(&state.bids)?)
            .await?;
        Ok(())
    }

    /// 플러시까지 성공해야 변경이 확정된다. 실패하면 스냅샷으로 되돌리고
    /// 디스크도 메모리와 다시 맞춘 뒤 원래 오류를 보고한다.
    async fn commit<R>(
        &self,
        state: &mut JsonState,
        snapshot: JsonState,
        result: R,
    ) -> Result<R, StoreError> {
        match self.persist(state).await {
            Ok(()) => Ok(result),
            Err(e) => {
                *state = snapshot;
                // 재기록까지 실패하면 디스크와 메모리가 어긋난 상태다. 운영자가 알아야 한다.
                if let Err(persist_err) = self.persist(state).await {
                    error!(
                        "{:<12} --> 롤백 재기록 실패, 디스크가 메모리보다 뒤처져 있습니다: {}",
                        "Store", persist_err
                    );
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl AuctionStore for JsonStore {
    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.state.read().await.items.clone())
    }

    async fn get_item(&self, item_id: i64) -> Result<Option<Item>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .items
            .iter()
            .find(|i| i.id == item_id)
            .cloned())
    }

    async fn insert_item(&self, new: NewItem) -> Result<Item, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let snapshot = state.clone();

        let id = state.items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        let item = Item {
            id,
            title: new.title,
            description: new.description,
            event_date: new.event_date,
            starting_bid: new.starting_bid,
            active: true,
        };
        state.items.push(item.clone());

        self.commit(state, snapshot, item).await
    }

    async fn update_item(
        &self,
        item_id: i64,
        patch: ItemPatch,
    ) -> Result<Option<Item>, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let Some(idx) = state.items.iter().position(|i| i.id == item_id) else {
            return Ok(None);
        };
        let snapshot = state.clone();

        let item = &mut state.items[idx];
        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(event_date) = patch.event_date {
            item.event_date = event_date;
        }
        if let Some(starting_bid) = patch.starting_bid {
            item.starting_bid = starting_bid;
        }
        if let Some(active) = patch.active {
            item.active = active;
        }
        let updated = item.clone();

        self.commit(state, snapshot, Some(updated)).await
    }

    async fn delete_item_cascade(&self, item_id: i64) -> Result<bool, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if !state.items.iter().any(|i| i.id == item_id) {
            return Ok(false);
        }
        let snapshot = state.clone();

        state.items.retain(|i| i.id != item_id);
        state.bids.remove(&item_id);

        self.commit(state, snapshot, true).await
    }

    async fn append_bid_if_highest(
        &self,
        item_id: i64,
        bidder: BidderInfo,
        amount: f64,
    ) -> Result<BidOutcome, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        // 커밋 시점 재검증: 상품 존재/활성과 최고가를 잠금 안에서 다시 본다.
        let Some(item) = state.items.iter().find(|i| i.id == item_id && i.active) else {
            return Ok(BidOutcome::MissingItem);
        };
        let starting_bid = item.starting_bid;
        let current = state
            .bids
            .get(&item_id)
            .and_then(|bids| winning_bid(bids))
            .map(|b| b.amount)
            .unwrap_or(starting_bid);
        if amount <= current {
            return Ok(BidOutcome::Outbid { current });
        }
        let snapshot = state.clone();

        // 접수 순서 기준 placed_at 단조 비감소 보장 (벽시계 역행 대비)
        let mut placed_at = Utc::now();
        if let Some(last) = state.bids.get(&item_id).and_then(|bids| bids.last()) {
            if placed_at < last.placed_at {
                placed_at = last.placed_at;
            }
        }

        let bid = Bid {
            id: state.next_bid_id,
            item_id,
            bidder_name: bidder.name,
            bidder_email: bidder.email,
            bidder_phone: bidder.phone,
            amount,
            placed_at,
        };
        state.next_bid_id += 1;
        state.bids.entry(item_id).or_default().push(bid.clone());

        self.commit(state, snapshot, BidOutcome::Committed(bid)).await
    }

    async fn insert_bid(
        &self,
        item_id: i64,
        bidder: BidderInfo,
        amount: f64,
    ) -> Result<Option<Bid>, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if !state.items.iter().any(|i| i.id == item_id) {
            return Ok(None);
        }
        let snapshot = state.clone();

        let bid = Bid {
            id: state.next_bid_id,
            item_id,
            bidder_name: bidder.name,
            bidder_email: bidder.email,
            bidder_phone: bidder.phone,
            amount,
            placed_at: Utc::now(),
        };
        state.next_bid_id += 1;
        state.bids.entry(item_id).or_default().push(bid.clone());

        self.commit(state, snapshot, Some(bid)).await
    }

    async fn get_bid(&self, bid_id: i64) -> Result<Option<Bid>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .bids
            .values()
            .flatten()
            .find(|b| b.id == bid_id)
            .cloned())
    }

    async fn update_bid(
        &self,
        bid_id: i64,
        patch: BidPatch,
    ) -> Result<Option<Bid>, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if !state.bids.values().flatten().any(|b| b.id == bid_id) {
            return Ok(None);
        }
        let snapshot = state.clone();
        let Some(bid) = state.bids.values_mut().flatten().find(|b| b.id == bid_id) else {
            return Ok(None);
        };

        if let Some(name) = patch.bidder_name {
            bid.bidder_name = name;
        }
        if let Some(email) = patch.bidder_email {
            bid.bidder_email = email;
        }
        if let Some(phone) = patch.bidder_phone {
            bid.bidder_phone = phone;
        }
        if let Some(amount) = patch.amount {
            bid.amount = amount;
        }
        let updated = bid.clone();

        self.commit(state, snapshot, Some(updated)).await
    }

    async fn delete_bid(&self, bid_id: i64) -> Result<bool, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let Some(item_id) = state
            .bids
            .iter()
            .find(|(_, bids)| bids.iter().any(|b| b.id == bid_id))
            .map(|(item_id, _)| *item_id)
        else {
            return Ok(false);
        };
        let snapshot = state.clone();

        if let Some(bids) = state.bids.get_mut(&item_id) {
            bids.retain(|b| b.id != bid_id);
        }

        self.commit(state, snapshot, true).await
    }

    async fn bids_for_item(&self, item_id: i64) -> Result<Vec<Bid>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .bids
            .get(&item_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn all_bids(&self) -> Result<Vec<Bid>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .bids
            .values()
            .flatten()
            .cloned()
            .collect())
    }

    async fn highest_bid(&self, item_id: i64) -> Result<Option<Bid>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .bids
            .get(&item_id)
            .and_then(|bids| winning_bid(bids))
            .cloned())
    }
}
// endregion: --- Json Store
