use asyncsql::{MySqlClient, PoolConfig, PoolRegistry, Value};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Deserialize, Debug)]
struct App {
    id: i64,
    name: String,
}

fn load_config() -> anyhow::Result<PoolConfig> {
    match std::env::var("ASYNCSQL_CONFIG") {
        Ok(raw) => Ok(PoolConfig::from_json(&serde_json::from_str(&raw)?)?),
        Err(_) => Ok(PoolConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let deadline = config.test_timeout();
    let registry = PoolRegistry::mysql();
    let client = MySqlClient::create_shared_default(&registry, config)?;

    let run = async {
        client
            .execute("CREATE TABLE IF NOT EXISTS app (id BIGINT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(64))")
            .await?;
        let inserted = client
            .update("INSERT INTO app (name) VALUES (?)", &("jason",))
            .await?;
        info!(updated = inserted.updated, keys = ?inserted.keys, "inserted");

        let mut tx = client.connection().await?;
        tx.update("UPDATE app SET name = ? WHERE id = ?", &(Value::from("jason6"), inserted.keys.first().cloned().unwrap_or(Value::Null)))
            .await?;
        tx.commit().await?;
        tx.close().await?;

        let rows = client.query("SELECT id, name FROM app", &()).await?;
        let apps: Vec<App> = rows.map_rows()?;
        println!("{:?}", apps);
        anyhow::Ok(())
    };

    let outcome = tokio::time::timeout(deadline, run).await;
    client.close().await?;
    registry.shutdown().await;
    outcome??;
    Ok(())
}
