//! Word-frequency aggregation.
//!
//! Aggregation is a map/combine job: map tasks count tokens over shards of a
//! class's train documents into private tables, and a single combiner on the
//! calling thread merges them. A second job counts train documents per class.

pub mod aggregator;
pub mod config;
pub mod executor;
pub mod metrics;
pub mod part_file;
pub mod table;
pub mod tasks;

pub use aggregator::*;
pub use config::*;
pub use executor::*;
pub use metrics::*;
pub use part_file::*;
pub use table::*;
pub use tasks::*;
