use serde::{Deserialize, Serialize};

/// Body of a trigger request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
    /// Arguments forwarded verbatim to the task script.
    #[serde(default)]
    pub args: Vec<String>,
}

impl TriggerRequest {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}
