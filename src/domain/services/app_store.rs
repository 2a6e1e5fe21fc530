#[cfg(test)]
#[path = "app_store_test.rs"]
mod tests;

use anyhow::Result;
use serde::de::DeserializeOwned;

use crate::domain::models::AppAction;
use crate::domain::models::AppState;
use crate::domain::models::KnowledgeBase;
use crate::domain::models::LlmModelDescriptor;
use crate::domain::models::StateStorage;
use crate::domain::models::SELECTED_KNOWLEDGE_BASE_KEY;
use crate::domain::models::SELECTED_MODEL_KEY;

pub fn reduce(state: AppState, action: AppAction) -> AppState {
    match action {
        AppAction::SetSelectedModel(model) => {
            return AppState {
                selected_model: model,
                ..state
            };
        }
        AppAction::SetAvailableModels(models) => {
            // Matched by identifier, the refreshed descriptor replaces the
            // persisted one.
            let selected_model = models
                .iter()
                .find(|e| return e.model == state.selected_model.model)
                .or_else(|| return models.first())
                .cloned()
                .unwrap_or(state.selected_model);

            return AppState {
                selected_model,
                available_models: Some(models),
                ..state
            };
        }
        AppAction::SetSelectedKnowledgeBase(knowledge_base) => {
            return AppState {
                selected_knowledge_base: knowledge_base,
                ..state
            };
        }
    }
}

fn load<T: DeserializeOwned, S: StateStorage>(storage: &S, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(key, error = %err, "Failed to read persisted state");
            return None;
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(val) => return Some(val),
        Err(err) => {
            tracing::warn!(key, error = %err, "Discarding unreadable persisted state");
            return None;
        }
    }
}

/// Holds the app state and mirrors the selected model and knowledge base to
/// storage after every dispatch. The model catalog is never persisted.
pub struct AppStore<S: StateStorage> {
    state: AppState,
    storage: S,
}

impl<S: StateStorage> AppStore<S> {
    pub fn new(storage: S) -> AppStore<S> {
        let mut state = AppState::default();
        if let Some(model) = load::<LlmModelDescriptor, S>(&storage, SELECTED_MODEL_KEY) {
            state.selected_model = model;
        }
        state.selected_knowledge_base =
            load::<KnowledgeBase, S>(&storage, SELECTED_KNOWLEDGE_BASE_KEY);

        return AppStore { state, storage };
    }

    pub fn state(&self) -> &AppState {
        return &self.state;
    }

    pub fn dispatch(&mut self, action: AppAction) -> Result<&AppState> {
        tracing::debug!(action = ?action, "Dispatch");
        self.state = reduce(self.state.clone(), action);
        self.persist()?;

        return Ok(&self.state);
    }

    fn persist(&self) -> Result<()> {
        self.storage.set(
            SELECTED_MODEL_KEY,
            &serde_json::to_string(&self.state.selected_model)?,
        )?;

        match &self.state.selected_knowledge_base {
            Some(knowledge_base) => {
                self.storage.set(
                    SELECTED_KNOWLEDGE_BASE_KEY,
                    &serde_json::to_string(knowledge_base)?,
                )?;
            }
            None => self.storage.remove(SELECTED_KNOWLEDGE_BASE_KEY)?,
        }

        return Ok(());
    }
}
