//! State repository trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::state::model::ApplicationState;

/// Repository for the singleton application state.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Loads the state, applying field-rename upgrades first.
    ///
    /// Returns `Ok(None)` when nothing is stored yet or the file cannot be parsed.
    async fn load(&self) -> Result<Option<ApplicationState>>;

    /// Schedules a debounced save under the singleton key.
    async fn save(&self, state: &ApplicationState) -> Result<()>;
}
