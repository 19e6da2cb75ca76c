//! Row storage and the passes that run over it.
//!
//! A file is read by [`ingest`] into a disk-backed [`store::RowStore`]; [`sample_rate`]
//! and [`baseline`] run over the store in place, and [`reduce`] hands the final rows to an
//! [`output::RowSink`].
pub mod baseline;
pub mod ingest;
pub mod output;
pub mod reduce;
pub mod row;
pub mod sample_rate;
pub mod store;
