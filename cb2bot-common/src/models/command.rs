use serde::{Deserialize, Serialize};

/// A custom text command (e.g. `!lurk`) created from chat with `!addcom`.
///
/// `name` is always stored case-folded; lookups fold the incoming name the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCommand {
    pub name: String,
    pub template: String,
    pub requires_elevated: bool,
}

impl StoredCommand {
    pub fn new(name: &str, template: &str, requires_elevated: bool) -> Self {
        Self {
            name: name.to_lowercase(),
            template: template.to_string(),
            requires_elevated,
        }
    }
}
