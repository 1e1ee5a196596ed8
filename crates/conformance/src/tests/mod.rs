//! One module per conformance property.

pub mod p01_channel_single_flight;
pub mod p05_not_found_distinct;
pub mod p06_record_then_history;
pub mod p08_mirror_retry;
