//! Block replay over an in-memory ledger

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bank::{AssetRegistry, BankService, LedgerGenesis};
use chrono::{DateTime, Utc};
use common::error::{Error, Result};
use common::store::CommitInfo;
use market::{upgrade_genesis_state, BlockHeader, DeliverResult, GenesisState, Keeper, MarketApp, MarketConfig, MarketMsg};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Genesis document of the node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeGenesis {
    /// Tokens and balances
    #[serde(default)]
    pub ledger: LedgerGenesis,
    /// Market state; when absent the market starts empty with parameters from the environment
    #[serde(default)]
    pub market: Option<GenesisState>,
}

/// One block of ordered messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub height: i64,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub msgs: Vec<MarketMsg>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    pub halt_on_broken_invariant: bool,
    pub upgrade_genesis: bool,
}

/// Outcome of one block
#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub height: i64,
    pub results: Vec<DeliverResult>,
    pub end_block_events: usize,
    pub broken_invariants: Vec<String>,
    pub app_hash: String,
}

/// Outcome of a whole replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub blocks: Vec<BlockReport>,
    pub last_commit: Option<CommitInfo>,
}

pub struct Replayer {
    app: MarketApp,
    options: ReplayOptions,
}

impl Replayer {
    /// Build the ledger and the market from a genesis document
    pub fn new(genesis: NodeGenesis, options: ReplayOptions) -> Result<Self> {
        let bank = Arc::new(BankService::new());
        let assets = Arc::new(AssetRegistry::new());
        genesis.ledger.apply(&bank, &assets)?;

        let keeper = Keeper::new(bank, assets, MarketConfig::from_env()?);
        let mut app = MarketApp::new(keeper);
        if let Some(state) = genesis.market {
            let state = if options.upgrade_genesis {
                upgrade_genesis_state(state)
            } else {
                state
            };
            app.init_chain(&state)?;
        }

        Ok(Self { app, options })
    }

    pub fn from_files(genesis: &Path, options: ReplayOptions) -> Result<Self> {
        let genesis: NodeGenesis = serde_json::from_slice(&read(genesis)?)?;
        Self::new(genesis, options)
    }

    pub fn app(&self) -> &MarketApp {
        &self.app
    }

    /// Execute one block: messages in order, then delist enactment and invariant checks
    pub fn run_block(&mut self, block: &Block) -> Result<BlockReport> {
        if block.height <= self.app.height() {
            return Err(Error::ConfigurationError(format!(
                "block {} does not follow block {}",
                block.height,
                self.app.height()
            )));
        }

        self.app.begin_block(BlockHeader::new(block.height, block.time));
        let results: Vec<DeliverResult> = block.msgs.iter().map(|msg| self.app.deliver(msg)).collect();
        let end = self.app.end_block()?;

        let broken_invariants: Vec<String> = end
            .invariants
            .iter()
            .filter(|report| report.broken)
            .map(|report| format!("{}: {}", report.name, report.message))
            .collect();
        if !broken_invariants.is_empty() && self.options.halt_on_broken_invariant {
            error!("Halting at block {}: {}", block.height, broken_invariants.join("; "));
            return Err(Error::Internal(format!(
                "broken invariant at height {}: {}",
                block.height,
                broken_invariants.join("; ")
            )));
        }

        let commit = self.app.commit();
        let rejected = results.iter().filter(|result| !result.is_ok()).count();
        info!(
            "Block {}: {} messages, {} rejected, app hash {}",
            block.height,
            results.len(),
            rejected,
            commit.hash
        );
        if !broken_invariants.is_empty() {
            warn!("Block {} continues with broken invariants", block.height);
        }

        Ok(BlockReport {
            height: block.height,
            results,
            end_block_events: end.events.len(),
            broken_invariants,
            app_hash: commit.hash,
        })
    }

    pub fn run(&mut self, blocks: &[Block]) -> Result<ReplayReport> {
        let mut reports = Vec::with_capacity(blocks.len());
        for block in blocks {
            reports.push(self.run_block(block)?);
        }
        let last_commit = reports.last().map(|report| CommitInfo {
            version: self.app.store().version(),
            hash: report.app_hash.clone(),
        });
        Ok(ReplayReport {
            blocks: reports,
            last_commit,
        })
    }

    pub fn run_file(&mut self, path: &Path) -> Result<ReplayReport> {
        let blocks: Vec<Block> = serde_json::from_slice(&read(path)?)?;
        self.run(&blocks)
    }

    pub fn export_genesis(&self) -> Result<GenesisState> {
        self.app.export_genesis()
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::ConfigurationError(format!("cannot read {}: {}", path.display(), e)))
}
