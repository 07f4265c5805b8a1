//! Device plumbing
//!
//! - [`TransportHandle`]: the serial ownership token every operation holds
//!   while it talks to a device
//! - [`MockDevice`]: an in-memory recorder honouring the whole
//!   [`DeviceTransport`](md_core::DeviceTransport) contract, optionally
//!   persisted to a JSON file
//! - [`regroup`]: group range maintenance after tracks move or disappear

pub mod handle;
pub mod mock;
pub mod regroup;

pub use handle::{TransportGuard, TransportHandle};
pub use mock::{DeviceCall, Faults, ListingFault, MockDevice};
pub use regroup::GroupDef;
