use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Source of "now" for queue timestamps, leases and run outcomes.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}
