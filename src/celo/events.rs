//! Log filters and the poll-window arithmetic behind event triggers.
//!
//! Topics are positional: topic 0 is the event signature hash, the rest are
//! indexed arguments in declaration order. Each position is a wildcard, a
//! single topic, or a list of alternatives.

use alloy::primitives::keccak256;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::abi::{decode_value, AbiType, WORD};
use super::error::{CeloError, CeloResult};
use super::hex::{encode_hex_bytes, from_hex_u64, pad_left, strip_0x, to_hex_quantity};
use super::network::{NetworkProfile, Token};
use super::utils::{canonical_address, validate_address, validate_hash};
use super::EventInfo;

pub const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";

/// Widest block range requested in a single poll step.
pub const MAX_BLOCK_RANGE: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Number(u64),
    Latest,
    Earliest,
    Pending,
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Number(n) => f.write_str(&to_hex_quantity(*n).map_err(|_| fmt::Error)?),
            BlockTag::Latest => f.write_str("latest"),
            BlockTag::Earliest => f.write_str("earliest"),
            BlockTag::Pending => f.write_str("pending"),
        }
    }
}

impl Serialize for BlockTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for BlockTag {
    type Err = CeloError;

    /// Accepts `latest`/`earliest`/`pending`, a decimal number or a hex quantity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(BlockTag::Latest),
            "earliest" => Ok(BlockTag::Earliest),
            "pending" => Ok(BlockTag::Pending),
            _ if strip_0x(s).is_some() => from_hex_u64(s).map(BlockTag::Number),
            _ => s.parse::<u64>().map(BlockTag::Number).map_err(|_| {
                CeloError::invalid_input(format!(
                    "'{}' is not a block number or one of latest, earliest, pending",
                    s
                ))
            }),
        }
    }
}

/// One topic position in a log filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TopicFilter {
    Any,
    One(String),
    AnyOf(Vec<String>),
}

impl TopicFilter {
    /// Checks every topic is a 32-byte hash and lower-cases it.
    pub fn validated(self) -> CeloResult<Self> {
        Ok(match self {
            TopicFilter::Any => TopicFilter::Any,
            TopicFilter::One(topic) => TopicFilter::One(validate_hash(&topic)?),
            TopicFilter::AnyOf(topics) => TopicFilter::AnyOf(
                topics
                    .iter()
                    .map(|t| validate_hash(t))
                    .collect::<CeloResult<_>>()?,
            ),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub from_block: BlockTag,
    pub to_block: BlockTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<TopicFilter>,
}

impl LogFilter {
    pub fn new(from_block: BlockTag, to_block: BlockTag) -> Self {
        Self {
            from_block,
            to_block,
            address: None,
            topics: Vec::new(),
        }
    }

    pub fn address(mut self, address: &str) -> CeloResult<Self> {
        self.address = Some(canonical_address(address)?);
        Ok(self)
    }

    /// Sets topic position `index`, filling earlier positions with wildcards.
    pub fn topic(mut self, index: usize, topic: TopicFilter) -> CeloResult<Self> {
        if index >= 4 {
            return Err(CeloError::invalid_input(format!(
                "logs have at most 4 topics, got position {}",
                index
            )));
        }
        if self.topics.len() <= index {
            self.topics.resize(index + 1, TopicFilter::Any);
        }
        self.topics[index] = topic.validated()?;
        Ok(self)
    }

    /// Drops trailing wildcards, which match the same logs as no entry.
    pub fn normalized(mut self) -> Self {
        while self.topics.last() == Some(&TopicFilter::Any) {
            self.topics.pop();
        }
        self
    }
}

/// Keccak-256 of an event signature, i.e. its topic 0.
pub fn event_topic(signature: &str) -> String {
    let signature: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
    encode_hex_bytes(keccak256(signature.as_bytes()).as_slice())
}

/// An indexed address argument as it appears in a topic.
pub fn address_topic(address: &str) -> CeloResult<String> {
    let address = format!("{:x}", validate_address(address)?);
    Ok(format!("0x{}", pad_left(&address, 2 * WORD)?))
}

/// Log object as returned by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

impl RpcLog {
    pub fn into_event(self) -> CeloResult<EventInfo> {
        let decoded = decode_transfer(&self).unwrap_or_else(|e| {
            warn!("Leaving Transfer-shaped log from {} undecoded: {}", self.address, e);
            None
        });
        Ok(EventInfo {
            address: self.address.to_ascii_lowercase(),
            block_number: self.block_number.as_deref().map(from_hex_u64).transpose()?.unwrap_or_default(),
            log_index: self.log_index.as_deref().map(from_hex_u64).transpose()?.unwrap_or_default(),
            transaction_hash: self.transaction_hash.unwrap_or_default(),
            topics: self.topics,
            data: self.data,
            decoded,
        })
    }
}

/// Decodes an ERC-20 `Transfer` log into `{event, from, to, value}`.
///
/// Returns `None` for any other event.
pub fn decode_transfer(log: &RpcLog) -> CeloResult<Option<serde_json::Value>> {
    if log.topics.len() != 3 || !log.topics[0].eq_ignore_ascii_case(&event_topic(TRANSFER_EVENT)) {
        return Ok(None);
    }
    let from = decode_value(&log.topics[1], AbiType::Address)?;
    let to = decode_value(&log.topics[2], AbiType::Address)?;
    let value = decode_value(&log.data, AbiType::Uint256)?;
    Ok(Some(json!({
        "event": "Transfer",
        "from": from.to_string(),
        "to": to.to_string(),
        "value": value.to_string(),
    })))
}

/// What a poll-based trigger watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// ERC-20 transfers of a known token, optionally narrowed by sender/recipient.
    TokenTransfer {
        token: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// Any event of `event_signature`, e.g. `Transfer(address,address,uint256)`.
    ContractEvent {
        address: String,
        event_signature: String,
    },
    NewBlock,
}

impl Trigger {
    /// Log filter for the blocks `[from_block, to_block]`; `None` for block triggers.
    pub fn log_filter(
        &self,
        profile: &NetworkProfile,
        from_block: u64,
        to_block: u64,
    ) -> CeloResult<Option<LogFilter>> {
        let base = LogFilter::new(BlockTag::Number(from_block), BlockTag::Number(to_block));
        let filter = match self {
            Trigger::TokenTransfer { token, from, to } => {
                let token: Token = token.parse()?;
                let mut filter = base
                    .address(profile.token_address(token)?)?
                    .topic(0, TopicFilter::One(event_topic(TRANSFER_EVENT)))?;
                if let Some(sender) = from {
                    filter = filter.topic(1, TopicFilter::One(address_topic(sender)?))?;
                }
                if let Some(recipient) = to {
                    filter = filter.topic(2, TopicFilter::One(address_topic(recipient)?))?;
                }
                filter
            }
            Trigger::ContractEvent {
                address,
                event_signature,
            } => {
                if !event_signature.contains('(') || !event_signature.ends_with(')') {
                    return Err(CeloError::invalid_input(format!(
                        "'{}' is not an event signature like Name(type1,type2)",
                        event_signature
                    )));
                }
                base.address(address)?
                    .topic(0, TopicFilter::One(event_topic(event_signature)))?
            }
            Trigger::NewBlock => return Ok(None),
        };
        Ok(Some(filter.normalized()))
    }
}

/// Block range one poll step should cover, given the caller's checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollWindow {
    pub from: u64,
    pub to: u64,
}

impl PollWindow {
    /// `[checkpoint + 1, latest]`, capped at [`MAX_BLOCK_RANGE`] blocks.
    ///
    /// Without a checkpoint only the latest block is covered, so a new
    /// trigger never backfills history. `None` when there is nothing new.
    pub fn next(checkpoint: Option<u64>, latest: u64) -> Option<Self> {
        let from = match checkpoint {
            None => latest,
            Some(last) if last >= latest => return None,
            Some(last) => last + 1,
        };
        let to = latest.min(from.saturating_add(MAX_BLOCK_RANGE - 1));
        Some(Self { from, to })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    pub window: Option<PollWindow>,
    pub events: Vec<EventInfo>,
    /// Block numbers seen by a `new_block` trigger.
    pub blocks: Vec<u64>,
    /// Last processed block to hand back on the next poll.
    pub checkpoint: Option<u64>,
}
