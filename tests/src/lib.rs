//! # Students-for-Students Test Suite
//!
//! Cross-crate flows. Unit tests live next to the code in each crate; this
//! crate drives the assembled services.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs            # Hosted container against a mock server
//!     ├── membership_flows.rs   # Optimistic toggles over HTTP
//!     ├── catalog_flows.rs      # Submission, deletion, favorites over HTTP
//!     └── bus_flows.rs          # Notices and metrics fed from the bus
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sfs-tests
//! cargo test -p sfs-tests integration::membership_flows::
//! ```

pub mod integration;
