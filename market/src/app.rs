//! Block-level engine driving the market module
//!
//! Messages enter through [`MarketApp::apply`] in the order the block assigns
//! them; height-triggered work enters through [`MarketApp::on_height`]. Both
//! operate on the same store and follow the same per-message atomicity.

use chrono::{DateTime, Utc};
use common::error::Result;
use common::model::event::Event;
use common::store::{CommitInfo, MultiStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::genesis::{self, GenesisState};
use crate::handler::handle_msg;
use crate::invariants::{check_all_invariants, InvariantReport};
use crate::keeper::Keeper;
use crate::msgs::MarketMsg;

/// Height and time of the block being executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: i64,
    pub time: DateTime<Utc>,
}

impl BlockHeader {
    pub fn new(height: i64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }
}

/// Result of one message as recorded by the block-execution framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverResult {
    /// Zero on success
    pub code: u32,
    pub codespace: String,
    pub log: String,
    pub events: Vec<Event>,
}

impl DeliverResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl From<Result<Vec<Event>>> for DeliverResult {
    fn from(result: Result<Vec<Event>>) -> Self {
        match result {
            Ok(events) => Self {
                code: 0,
                codespace: String::new(),
                log: String::new(),
                events,
            },
            Err(e) => Self {
                code: e.code(),
                codespace: e.codespace().to_string(),
                log: e.to_string(),
                events: Vec::new(),
            },
        }
    }
}

/// Work done at the end of a block
#[derive(Debug, Clone, Default)]
pub struct EndBlockResult {
    pub events: Vec<Event>,
    pub invariants: Vec<InvariantReport>,
}

impl EndBlockResult {
    /// Whether any invariant reported a broken record
    pub fn is_broken(&self) -> bool {
        self.invariants.iter().any(|report| report.broken)
    }
}

/// The market module wired to its store
pub struct MarketApp {
    store: MultiStore,
    keeper: Keeper,
    header: BlockHeader,
}

impl MarketApp {
    /// Create an engine with the keeper's store mounted
    pub fn new(keeper: Keeper) -> Self {
        let mut store = MultiStore::new();
        store.mount(keeper.store_key().clone());
        Self::with_store(store, keeper)
    }

    /// Create an engine over an existing multi-store
    pub fn with_store(store: MultiStore, keeper: Keeper) -> Self {
        Self {
            store,
            keeper,
            header: BlockHeader::new(0, DateTime::<Utc>::default()),
        }
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    pub fn store(&self) -> &MultiStore {
        &self.store
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn height(&self) -> i64 {
        self.header.height
    }

    /// Load the module's genesis state
    pub fn init_chain(&mut self, genesis: &GenesisState) -> Result<()> {
        let store = self.store.kv_store_mut(self.keeper.store_key())?;
        genesis::init_genesis(&mut self.keeper, store, genesis)
    }

    /// Export the module state
    pub fn export_genesis(&self) -> Result<GenesisState> {
        let store = self.store.kv_store(self.keeper.store_key())?;
        genesis::export_genesis(&self.keeper, store)
    }

    /// Start executing a block
    pub fn begin_block(&mut self, header: BlockHeader) {
        debug!("Begin block {} at {}", header.height, header.time);
        self.header = header;
    }

    /// Apply one message; on error the store is unchanged
    pub fn apply(&mut self, msg: &MarketMsg) -> Result<Vec<Event>> {
        msg.validate_basic()?;
        let height = self.header.height;
        let store = self.store.kv_store_mut(self.keeper.store_key())?;
        handle_msg(&self.keeper, store, height, msg)
    }

    /// Apply one message and record its outcome
    pub fn deliver(&mut self, msg: &MarketMsg) -> DeliverResult {
        let result = self.apply(msg);
        if let Err(e) = &result {
            warn!("Rejected {} from {}: {}", msg.msg_type(), msg.signer(), e);
        }
        DeliverResult::from(result)
    }

    /// Enact the delist requests due at the current height
    pub fn on_height(&mut self) -> Result<Vec<Event>> {
        let height = self.header.height;
        let store = self.store.kv_store_mut(self.keeper.store_key())?;
        self.keeper.enact_due(store, height)
    }

    /// Run every invariant of the module against the current state
    pub fn check_invariants(&self) -> Result<Vec<InvariantReport>> {
        let store = self.store.kv_store(self.keeper.store_key())?;
        Ok(check_all_invariants(store))
    }

    /// Finish the block: enact due delists, then check invariants
    pub fn end_block(&mut self) -> Result<EndBlockResult> {
        let events = self.on_height()?;
        let invariants = self.check_invariants()?;
        let result = EndBlockResult { events, invariants };
        if result.is_broken() {
            warn!("Block {} ends with broken invariants", self.header.height);
        }
        Ok(result)
    }

    /// Persist the block and return the application hash
    pub fn commit(&mut self) -> CommitInfo {
        let info = self.store.commit();
        info!("Block {} committed", self.header.height);
        info
    }
}
