use anyhow::Result;
use tabletalk_infrastructure::LocalStore;

pub async fn delete(store: &LocalStore, project_id: &str) -> Result<()> {
    let mut state = store.boot().await?;
    if !state.project_index.iter().any(|p| p.id == project_id) {
        tracing::warn!(project_id = %project_id, "Project not in index, removing its directory anyway");
    }
    store.delete_project(&mut state, project_id).await?;
    println!("Deleted project {}", project_id);
    Ok(())
}
