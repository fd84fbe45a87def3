//! Query module
//!
//! Read models for balances, history and account summaries.

mod service;

pub use service::{
    AccountProfile, AccountSummary, QueryService, QuerySettings, TransactionHistory,
    DEFAULT_RECENT_ACTIVITY_LIMIT,
};
