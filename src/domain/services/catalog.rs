#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;

use crate::domain::models::LlmModelDescriptor;

/// Builds the displayed model list from the server catalog. Inactive and
/// deprecated entries are dropped and the agent is always first, exactly once.
pub fn augment_catalog(models: &[LlmModelDescriptor]) -> Vec<LlmModelDescriptor> {
    let mut res = vec![LlmModelDescriptor::agent()];
    res.extend(
        models
            .iter()
            .filter(|e| return e.is_available() && !e.is_agent())
            .cloned(),
    );

    return res;
}
