mod json_store;
mod records;

pub use json_store::{ReconciliationStore, StoreState};
pub use records::{ItemKey, OverrideRecord, ParseKeyError, UnresolvedRecord};
