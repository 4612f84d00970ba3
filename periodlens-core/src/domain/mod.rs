//! Domain types for PeriodLens

pub mod dimension;
pub mod key;
pub mod period;
pub mod record;

pub use dimension::{Dimension, UnknownDimension};
pub use key::GroupKey;
pub use period::{PeriodDataset, PeriodLabel, PeriodRole};
pub use record::{RecordBuilder, TransactionRecord};
