// Base trait and utilities for source-specific adapters
pub mod base;

// Individual adapter implementations
pub mod bank;
pub mod dlc_portal;
pub mod manual;
pub mod post_office;

// Re-export the main components
pub use bank::{BankExportAdapter, BankLayout};
pub use base::{AdapterUtils, RowRejection, SourceAdapter};
pub use dlc_portal::DlcPortalAdapter;
pub use manual::ManualListAdapter;
pub use post_office::PostOfficeAdapter;
