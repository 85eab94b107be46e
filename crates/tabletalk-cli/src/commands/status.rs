use anyhow::Result;
use tabletalk_infrastructure::LocalStore;

pub async fn run(store: &LocalStore) -> Result<()> {
    let state = store.boot().await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
