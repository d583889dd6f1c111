//! reqscope - Scoped capture and inspection of outgoing HTTP requests.
//!
//! Wraps an HTTP client so that every outgoing call made during one
//! logical unit of work (typically: one inbound request handled by the
//! host) is captured and bucketed with that unit, ready for display in
//! a debug panel. Units of work running concurrently in the same
//! process never see each other's records.
//!
//! # Features
//!
//! - **Transparent capture**: [`InspectedClient`] keeps the familiar
//!   builder call surface; call sites only swap the client type
//! - **Per-unit isolation**: records travel with execution-context
//!   lineage ([`CallScope`]), not a process-wide list
//! - **Redirect-aware**: the captured record references the first
//!   response of a redirect chain, the caller receives the final one
//! - **Display-ready records**: redacted headers, JSON pretty-printed
//!   bodies, optional call-site stacks — memoized, fail-soft
//! - **Summary stats**: per-unit count and total elapsed time
//!
//! # Quick start
//!
//! ```no_run
//! use reqscope::{InspectConfig, InspectedClient, InspectionPanel};
//!
//! # async fn handle_inbound_request(client: InspectedClient) -> reqscope::Result<()> {
//! // Per unit of work (e.g. per inbound request in your server):
//! let mut panel = InspectionPanel::new();
//! let scope = panel.on_unit_start();
//!
//! scope
//!     .enter(async {
//!         // ... application code; every send is captured ...
//!         let _users = client.get("https://api.example.com/users").send().await?;
//!         Ok::<_, reqscope::Error>(())
//!     })
//!     .await?;
//!
//! panel.on_unit_finish();
//! println!("{}", panel.subtitle()); // "1 request in 42 ms"
//! for call in panel.calls() {
//!     println!("{} {} -> {}", call.method(), call.url(), call.status());
//!     println!("{}", call.response_body_text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Instrumentation never fails the underlying call: transport errors
//! propagate untouched (and leave no record), scope misses drop the
//! record, and undecodable bodies fall back to their raw form.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
mod format;
pub mod panel;
pub mod record;
pub mod scope;
mod stack;

pub use client::{CallBuilder, InspectedClient, ReplyChain, ReqwestTransport, Transport};
pub use config::InspectConfig;
pub use error::{Error, Result};
pub use panel::{InspectionPanel, SummaryStats};
pub use record::{CallOptions, CallRequest, CallResponse, CapturedCall};
pub use scope::{collect, CallScope};
