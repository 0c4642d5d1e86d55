//! # Flowgate Ledger
//!
//! The host streaming protocol: per-(token, sender, receiver) flows with
//! balance settlement, synchronous lifecycle callbacks into registered
//! apps, and jailing of apps whose callbacks fail.
//!
//! Execution is single-threaded and transactional. Each external entry
//! point ([`MemoryLedger::create_flow`], [`update_flow`](MemoryLedger::update_flow),
//! [`delete_flow`](MemoryLedger::delete_flow)) is one atomic unit of work:
//! the flow mutation and the receiving app's callback complete before the
//! call returns, so no two callbacks for the same (payer, token) ever
//! interleave.
//!
//! ## Key Types
//!
//! - [`FlowApp`] - Callback trait implemented by stream-reactive apps
//! - [`FlowOps`] - In-callback handle an app uses to move its own flows
//! - [`MemoryLedger`] - The in-memory host

pub mod app;
pub mod error;
pub mod ledger;

pub use app::{AppError, CloseReason, FlowApp, FlowOps};
pub use error::{LedgerError, Result};
pub use ledger::{MemoryLedger, DEPOSIT_SECONDS};
