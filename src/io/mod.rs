//! I/O module
//!
//! Handles replay input and output.
//!
//! # Components
//!
//! - `delivery_format` - Recorded delivery lines (`{"signature", "body"}`)
//! - `sync_reader` - Synchronous delivery reader with iterator interface
//! - `async_reader` - Asynchronous delivery reader with batch reading interface
//! - `fixture` - Card, customer, balance and ledger state loaded from JSON
//! - `csv_format` - Ledger export as CSV

pub mod async_reader;
pub mod csv_format;
pub mod delivery_format;
pub mod fixture;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::write_ledger_csv;
pub use delivery_format::{parse_delivery_line, Delivery};
pub use fixture::{load_state, StateFixture};
pub use sync_reader::SyncReader;
