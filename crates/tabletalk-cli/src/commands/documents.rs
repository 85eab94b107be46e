use anyhow::{Context, Result};
use std::path::Path;
use tabletalk_core::document::DocumentTarget;
use tabletalk_infrastructure::LocalStore;

pub async fn attach(store: &LocalStore, target: DocumentTarget, file: &Path) -> Result<()> {
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("'{}' has no file name", file.display()))?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read '{}'", file.display()))?;

    let mut state = store.boot().await?;
    let document = store
        .attach_document(&mut state, &target, &file_name, &bytes)
        .await?;

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

pub async fn detach(store: &LocalStore, target: DocumentTarget, document_id: &str) -> Result<()> {
    let mut state = store.boot().await?;
    match store.detach_document(&mut state, &target, document_id).await? {
        Some(document) => {
            println!("Removed {} from {}", document.original_file_name, target);
            Ok(())
        }
        None => anyhow::bail!("Document '{}' not found in {}", document_id, target),
    }
}
