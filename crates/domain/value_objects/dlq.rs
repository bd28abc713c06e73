use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DlqSweepSummary {
    pub processed: i64,
    pub resolved: i64,
    pub retrying: i64,
    pub failed: i64,
}
