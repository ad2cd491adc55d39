use refdesk::{OpenAI, Store};
use std::sync::Arc;

#[derive(Debug)]
pub struct State {
    pub store: Store,
    pub openai: OpenAI,
}

#[allow(clippy::module_name_repetitions)]
pub type AppState = Arc<State>;

pub fn create(store: Store) -> AppState {
    Arc::new(State {
        store,
        openai: OpenAI::new(),
    })
}
