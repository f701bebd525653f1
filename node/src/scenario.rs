//! # Scenario Runner
//!
//! A scenario is a JSON list of entry calls executed in order against a
//! fresh [`MemoryLedger`]:
//!
//! ```json
//! {
//!   "name": "swap",
//!   "steps": [
//!     { "op": "create_account", "name": "alice" },
//!     { "op": "init_coin", "alias": "A", "issuer": "alice",
//!       "module": "coins", "name": "CoinA", "symbol": "CA", "decimals": 6 },
//!     { "op": "faucet", "coin": "A", "to": "alice", "amount": 100, "expect_ok": true }
//!   ]
//! }
//! ```
//!
//! Accounts are given by label (hashed with [`AccountAddress::from_name`]) or
//! as `0x…` hex. Coins are referred to by the alias chosen in `init_coin`;
//! the runner keeps their capabilities so `faucet` can mint test coins.
//!
//! A failing step is recorded and the run continues, unless the step sets
//! `expect_ok`, in which case the whole run aborts.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use uuid::Uuid;

use strongbox_contracts::{EscrowVault, ManagedToken, TokenError};
use strongbox_protocol::coin::{CoinCapabilities, CoinType};
use strongbox_protocol::config::LedgerConfig;
use strongbox_protocol::events::EventRecord;
use strongbox_protocol::identity::AccountAddress;
use strongbox_protocol::ledger::{Ledger, MemoryLedger};

use crate::metrics::RunMetrics;

// ---------------------------------------------------------------------------
// Script format
// ---------------------------------------------------------------------------

/// A batch of entry calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<ScenarioStep>,
}

/// One step plus its run-control flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    #[serde(flatten)]
    pub step: Step,
    /// Abort the run if this step fails.
    #[serde(default)]
    pub expect_ok: bool,
}

impl From<Step> for ScenarioStep {
    fn from(step: Step) -> Self {
        Self {
            step,
            expect_ok: false,
        }
    }
}

/// Every entry point the runner can drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    // --- ledger setup ---
    CreateAccount {
        name: String,
    },
    InitCoin {
        alias: String,
        issuer: String,
        module: String,
        name: String,
        symbol: String,
        decimals: u8,
        #[serde(default)]
        monitor_supply: bool,
    },
    Register {
        account: String,
        coin: String,
    },
    Faucet {
        coin: String,
        to: String,
        amount: u64,
    },

    // --- escrow vault ---
    VaultInitialize {
        depositor: String,
        amount: u64,
        seed: String,
        coin: String,
    },
    VaultCancel {
        caller: String,
        depositor: String,
        seed: String,
        coin: String,
    },
    VaultExchange {
        taker: String,
        depositor: String,
        seed: String,
        owner: String,
        first: String,
        second: String,
    },

    // --- managed token ---
    TokenInitialize {
        admin: String,
        /// Defaults to `admin`.
        #[serde(default)]
        caller: Option<String>,
        name: String,
        symbol: String,
        decimals: u8,
        #[serde(default)]
        monitor_supply: bool,
    },
    TokenRegister {
        account: String,
    },
    TokenMint {
        caller: String,
        recipient: String,
        amount: u64,
    },
    TokenTransfer {
        sender: String,
        recipient: String,
        amount: u64,
    },
    TokenSetFrozen {
        caller: String,
        target: String,
        frozen: bool,
    },
    TokenBurn {
        caller: String,
        amount: u64,
    },
    TokenBurnFrom {
        caller: String,
        target: String,
        amount: u64,
    },
}

impl Step {
    /// The `op` tag, used for logs and metric labels.
    pub fn op(&self) -> &'static str {
        match self {
            Step::CreateAccount { .. } => "create_account",
            Step::InitCoin { .. } => "init_coin",
            Step::Register { .. } => "register",
            Step::Faucet { .. } => "faucet",
            Step::VaultInitialize { .. } => "vault_initialize",
            Step::VaultCancel { .. } => "vault_cancel",
            Step::VaultExchange { .. } => "vault_exchange",
            Step::TokenInitialize { .. } => "token_initialize",
            Step::TokenRegister { .. } => "token_register",
            Step::TokenMint { .. } => "token_mint",
            Step::TokenTransfer { .. } => "token_transfer",
            Step::TokenSetFrozen { .. } => "token_set_frozen",
            Step::TokenBurn { .. } => "token_burn",
            Step::TokenBurnFrom { .. } => "token_burn_from",
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state of one holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: AccountAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub coin_type: CoinType,
    pub balance: u64,
    pub frozen: bool,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub run_id: Uuid,
    pub scenario: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepOutcome>,
    pub balances: Vec<BalanceEntry>,
    pub events: Vec<EventRecord>,
    pub state_root: String,
}

impl Report {
    /// Number of failed steps.
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Executes scenarios. One runner owns one ledger.
pub struct Runner {
    ledger: MemoryLedger,
    escrow: EscrowVault,
    token: Option<ManagedToken>,
    coins: BTreeMap<String, (CoinType, CoinCapabilities)>,
    labels: BTreeMap<AccountAddress, String>,
    metrics: RunMetrics,
}

impl Runner {
    /// A runner over an empty ledger with the given limits.
    pub fn new(config: LedgerConfig, metrics: RunMetrics) -> Self {
        Self {
            ledger: MemoryLedger::with_config(config),
            escrow: EscrowVault::new(),
            token: None,
            coins: BTreeMap::new(),
            labels: BTreeMap::new(),
            metrics,
        }
    }

    /// Runs every step of `scenario` and builds the report.
    pub fn run(&mut self, scenario: &Scenario) -> Result<Report> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, scenario = %scenario.name, steps = scenario.steps.len(), "run started");

        let mut outcomes = Vec::with_capacity(scenario.steps.len());
        for (index, entry) in scenario.steps.iter().enumerate() {
            let op = entry.step.op();
            let events_before = self.ledger.state().event_count();
            let start = Instant::now();
            let result = self.execute(&entry.step);
            let elapsed = start.elapsed();
            let new_events = self.ledger.state().event_count() - events_before;
            self.metrics
                .observe(op, result.is_ok(), elapsed, new_events as u64);

            let outcome = match result {
                Ok(value) => {
                    tracing::debug!(index, op, "step ok");
                    StepOutcome {
                        index,
                        op: op.to_string(),
                        ok: true,
                        result: value,
                        error: None,
                    }
                }
                Err(err) => {
                    if entry.expect_ok {
                        return Err(err).with_context(|| {
                            format!("step {index} ({op}) was expected to succeed")
                        });
                    }
                    tracing::info!(index, op, error = %err, "step rejected");
                    StepOutcome {
                        index,
                        op: op.to_string(),
                        ok: false,
                        result: None,
                        error: Some(format!("{err:#}")),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = Report {
            run_id,
            scenario: scenario.name.clone(),
            started_at,
            steps: outcomes,
            balances: self.balances(),
            events: self.ledger.event_log(),
            state_root: hex::encode(self.ledger.state_root()?),
        };
        tracing::info!(
            %run_id,
            failures = report.failures(),
            state_root = %report.state_root,
            "run finished"
        );
        Ok(report)
    }

    fn execute(&mut self, step: &Step) -> Result<Option<serde_json::Value>> {
        match step {
            Step::CreateAccount { name } => {
                let address = self.account(name)?;
                self.ledger.create_account(address)?;
                Ok(Some(serde_json::json!({ "address": address })))
            }

            Step::InitCoin {
                alias,
                issuer,
                module,
                name,
                symbol,
                decimals,
                monitor_supply,
            } => {
                if self.coins.contains_key(alias) {
                    bail!("coin alias already in use: {alias}");
                }
                let issuer = self.account(issuer)?;
                let coin_type = CoinType::new(issuer, module.as_str(), name.as_str());
                let caps = self.ledger.initialize_coin(
                    &issuer,
                    coin_type.clone(),
                    name,
                    symbol,
                    *decimals,
                    *monitor_supply,
                )?;
                self.coins.insert(alias.clone(), (coin_type.clone(), caps));
                Ok(Some(serde_json::json!({ "coin_type": coin_type })))
            }

            Step::Register { account, coin } => {
                let account = self.account(account)?;
                let coin_type = self.coin(coin)?.clone();
                let opened = self.ledger.register(&account, &coin_type)?;
                Ok(Some(serde_json::json!({ "opened": opened })))
            }

            Step::Faucet { coin, to, amount } => {
                let to = self.account(to)?;
                let (_, caps) = self
                    .coins
                    .get(coin)
                    .ok_or_else(|| anyhow!("unknown coin alias: {coin}"))?;
                self.ledger.mint(&caps.mint, &to, *amount)?;
                Ok(None)
            }

            Step::VaultInitialize {
                depositor,
                amount,
                seed,
                coin,
            } => {
                let depositor = self.account(depositor)?;
                let coin_type = self.coin(coin)?.clone();
                let vault = self.escrow.initialize(
                    &mut self.ledger,
                    &depositor,
                    *amount,
                    seed.as_bytes(),
                    &coin_type,
                )?;
                Ok(Some(serde_json::json!({ "vault": vault })))
            }

            Step::VaultCancel {
                caller,
                depositor,
                seed,
                coin,
            } => {
                let caller = self.account(caller)?;
                let vault = self.vault_id(depositor, seed)?;
                let coin_type = self.coin(coin)?.clone();
                let amount = self
                    .escrow
                    .cancel(&mut self.ledger, &caller, &vault, &coin_type)?;
                Ok(Some(serde_json::json!({ "refunded": amount })))
            }

            Step::VaultExchange {
                taker,
                depositor,
                seed,
                owner,
                first,
                second,
            } => {
                let taker = self.account(taker)?;
                let owner = self.account(owner)?;
                let vault = self.vault_id(depositor, seed)?;
                let first = self.coin(first)?.clone();
                let second = self.coin(second)?.clone();
                let amount = self.escrow.exchange(
                    &mut self.ledger,
                    &taker,
                    &vault,
                    &owner,
                    &first,
                    &second,
                )?;
                Ok(Some(serde_json::json!({ "exchanged": amount })))
            }

            Step::TokenInitialize {
                admin,
                caller,
                name,
                symbol,
                decimals,
                monitor_supply,
            } => {
                let admin = self.account(admin)?;
                let caller = match caller {
                    Some(label) => self.account(label)?,
                    None => admin,
                };
                let token = self.token.get_or_insert_with(|| ManagedToken::new(admin));
                if token.admin() != &admin {
                    bail!("a share token for {} is already deployed", token.admin());
                }
                token.initialize(
                    &mut self.ledger,
                    &caller,
                    name,
                    symbol,
                    *decimals,
                    *monitor_supply,
                )?;
                Ok(Some(serde_json::json!({
                    "coin_type": token.coin_type(),
                    "resource": token.resource_address(),
                })))
            }

            Step::TokenRegister { account } => {
                let account = self.account(account)?;
                let opened = deployed(self.token.as_ref())?
                    .register(&mut self.ledger, &account)?;
                Ok(Some(serde_json::json!({ "opened": opened })))
            }

            Step::TokenMint {
                caller,
                recipient,
                amount,
            } => {
                let caller = self.account(caller)?;
                let recipient = self.account(recipient)?;
                deployed(self.token.as_ref())?
                    .mint(&mut self.ledger, &caller, &recipient, *amount)?;
                Ok(None)
            }

            Step::TokenTransfer {
                sender,
                recipient,
                amount,
            } => {
                let sender = self.account(sender)?;
                let recipient = self.account(recipient)?;
                deployed(self.token.as_ref())?
                    .transfer(&mut self.ledger, &sender, &recipient, *amount)?;
                Ok(None)
            }

            Step::TokenSetFrozen {
                caller,
                target,
                frozen,
            } => {
                let caller = self.account(caller)?;
                let target = self.account(target)?;
                deployed(self.token.as_ref())?
                    .set_frozen(&mut self.ledger, &caller, &target, *frozen)?;
                Ok(None)
            }

            Step::TokenBurn { caller, amount } => {
                let caller = self.account(caller)?;
                deployed(self.token.as_ref())?
                    .burn(&mut self.ledger, &caller, *amount)?;
                Ok(None)
            }

            Step::TokenBurnFrom {
                caller,
                target,
                amount,
            } => {
                let caller = self.account(caller)?;
                let target = self.account(target)?;
                deployed(self.token.as_ref())?
                    .burn_from(&mut self.ledger, &caller, &target, *amount)?;
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Resolution helpers
    // -----------------------------------------------------------------------

    /// Resolves a label or `0x…` hex string to an address, remembering labels.
    fn account(&mut self, label: &str) -> Result<AccountAddress> {
        if label.starts_with("0x") {
            return label
                .parse()
                .with_context(|| format!("invalid account address: {label}"));
        }
        let address = AccountAddress::from_name(label);
        self.labels
            .entry(address)
            .or_insert_with(|| label.to_string());
        Ok(address)
    }

    fn vault_id(&mut self, depositor: &str, seed: &str) -> Result<AccountAddress> {
        let depositor = self.account(depositor)?;
        Ok(AccountAddress::derive_resource(&depositor, seed.as_bytes()))
    }

    fn coin(&self, alias: &str) -> Result<&CoinType> {
        self.coins
            .get(alias)
            .map(|(coin_type, _)| coin_type)
            .ok_or_else(|| anyhow!("unknown coin alias: {alias}"))
    }

    fn balances(&self) -> Vec<BalanceEntry> {
        self.ledger
            .state()
            .holdings()
            .map(|(account, coin_type, store)| BalanceEntry {
                account: *account,
                label: self.labels.get(account).cloned(),
                coin_type: coin_type.clone(),
                balance: store.balance,
                frozen: store.frozen,
            })
            .collect()
    }
}

fn deployed(token: Option<&ManagedToken>) -> Result<&ManagedToken> {
    token.ok_or_else(|| anyhow!(TokenError::NotInitialized))
}

// ---------------------------------------------------------------------------
// Built-in demo
// ---------------------------------------------------------------------------

impl Scenario {
    /// The end-to-end walk-through: a 100-unit vault exchanged 1:1, then a
    /// share token minted, moved, frozen and partly burned. Includes one
    /// deliberately rejected call.
    pub fn demo() -> Self {
        let s = |v: &str| v.to_string();
        let mut steps: Vec<ScenarioStep> = Vec::new();

        for name in ["issuer", "owner", "taker", "admin", "alice", "bob"] {
            steps.push(Step::CreateAccount { name: s(name) }.into());
        }
        for (alias, coin, symbol) in [("A", "CoinA", "CA"), ("B", "CoinB", "CB")] {
            steps.push(
                Step::InitCoin {
                    alias: s(alias),
                    issuer: s("issuer"),
                    module: s("coins"),
                    name: s(coin),
                    symbol: s(symbol),
                    decimals: 6,
                    monitor_supply: true,
                }
                .into(),
            );
            for who in ["owner", "taker"] {
                steps.push(
                    Step::Register {
                        account: s(who),
                        coin: s(alias),
                    }
                    .into(),
                );
            }
        }
        steps.push(
            Step::Faucet {
                coin: s("A"),
                to: s("owner"),
                amount: 100,
            }
            .into(),
        );
        steps.push(
            Step::Faucet {
                coin: s("B"),
                to: s("taker"),
                amount: 100,
            }
            .into(),
        );
        steps.push(
            Step::VaultInitialize {
                depositor: s("owner"),
                amount: 100,
                seed: s("deal-1"),
                coin: s("A"),
            }
            .into(),
        );
        steps.push(
            Step::VaultExchange {
                taker: s("taker"),
                depositor: s("owner"),
                seed: s("deal-1"),
                owner: s("owner"),
                first: s("A"),
                second: s("B"),
            }
            .into(),
        );

        steps.push(
            Step::TokenInitialize {
                admin: s("admin"),
                caller: None,
                name: s("Strongbox Share"),
                symbol: s("SBS"),
                decimals: 6,
                monitor_supply: true,
            }
            .into(),
        );
        for who in ["alice", "bob"] {
            steps.push(Step::TokenRegister { account: s(who) }.into());
        }
        steps.push(
            Step::TokenMint {
                caller: s("admin"),
                recipient: s("alice"),
                amount: 500,
            }
            .into(),
        );
        steps.push(
            Step::TokenMint {
                caller: s("alice"),
                recipient: s("alice"),
                amount: 1_000_000,
            }
            .into(),
        );
        steps.push(
            Step::TokenTransfer {
                sender: s("alice"),
                recipient: s("bob"),
                amount: 200,
            }
            .into(),
        );
        steps.push(
            Step::TokenSetFrozen {
                caller: s("admin"),
                target: s("bob"),
                frozen: true,
            }
            .into(),
        );
        steps.push(
            Step::TokenBurnFrom {
                caller: s("admin"),
                target: s("bob"),
                amount: 50,
            }
            .into(),
        );

        Scenario {
            name: s("demo"),
            steps,
        }
    }
}

/// Parses a scenario from JSON.
pub fn parse_scenario(json: &str) -> Result<Scenario> {
    let scenario: Scenario = serde_json::from_str(json).context("invalid scenario JSON")?;
    if scenario.steps.is_empty() {
        bail!("scenario has no steps");
    }
    Ok(scenario)
}
