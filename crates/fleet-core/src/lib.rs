//! Fleet sheet ingestion: cached grid fetching, fixed-offset parsing into a
//! [`FleetSnapshot`], status classification and the aggregates the dashboard
//! shows.

pub mod grid;
pub mod layout;
pub mod snapshot;
pub mod source;
pub mod status;
pub mod summary;

pub use grid::{GridDecodeError, RawGrid};
pub use layout::SheetLayout;
pub use snapshot::{parse_snapshot, parse_snapshot_with, Agent, FleetSnapshot, SessionInfo, SystemStatus};
pub use source::{
    Clock, FetchError, FleetDataSource, GridTransport, SystemClock, TransportError,
    DEFAULT_FRESHNESS,
};
pub use status::{backend_healthy, classify, AgentStatus};
pub use summary::{offline_bucket, online_count, FleetSummary, Severity, DEGRADED_OFFLINE_MAX};
