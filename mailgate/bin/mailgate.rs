#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = find_config_file()?;
    let config_content = std::fs::read_to_string(&config_path).map_err(|error| {
        anyhow::anyhow!(
            "Failed to read config from {}: {error}",
            config_path.display()
        )
    })?;
    let mailgate: mailgate::controller::Mailgate = ron::from_str(&config_content)?;

    mailgate.run().await
}

/// Find the configuration file using the following precedence:
/// 1. `MAILGATE_CONFIG` environment variable
/// 2. ./mailgate.config.ron (current working directory)
/// 3. /etc/mailgate/mailgate.config.ron (system-wide config)
fn find_config_file() -> anyhow::Result<std::path::PathBuf> {
    if let Ok(env_path) = std::env::var("MAILGATE_CONFIG") {
        let path = std::path::PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "MAILGATE_CONFIG points to non-existent file: {}",
            path.display()
        );
    }

    let default_paths = [
        std::path::PathBuf::from("./mailgate.config.ron"),
        std::path::PathBuf::from("/etc/mailgate/mailgate.config.ron"),
    ];

    for path in &default_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let paths_tried = default_paths
        .iter()
        .map(|path| format!("  - {}", path.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - MAILGATE_CONFIG environment variable\n{paths_tried}"
    )
}
