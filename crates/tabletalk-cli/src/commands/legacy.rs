use anyhow::{Context, Result};
use std::path::Path;
use tabletalk_infrastructure::LocalStore;

pub async fn run(store: &LocalStore, file: &Path) -> Result<()> {
    if store.paths().app_state_file().exists() {
        anyhow::bail!(
            "'{}' already exists; legacy import only runs on an empty data directory",
            store.paths().app_state_file().display()
        );
    }

    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    let state = store.import_legacy(&raw).await?;

    println!(
        "Imported {} project(s) into {}",
        state.project_index.len(),
        store.paths().base().display()
    );
    Ok(())
}
