use super::KnowledgeBase;
use super::LlmModelDescriptor;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppState {
    pub selected_model: LlmModelDescriptor,
    pub selected_knowledge_base: Option<KnowledgeBase>,
    /// `None` until the catalog has been fetched.
    pub available_models: Option<Vec<LlmModelDescriptor>>,
}

impl Default for AppState {
    fn default() -> AppState {
        return AppState {
            selected_model: LlmModelDescriptor::agent(),
            selected_knowledge_base: None,
            available_models: None,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppAction {
    SetSelectedModel(LlmModelDescriptor),
    SetAvailableModels(Vec<LlmModelDescriptor>),
    SetSelectedKnowledgeBase(Option<KnowledgeBase>),
}
