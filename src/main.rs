use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use treelight::SceneConfig;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Optional path to a JSON scene config.
    let config = match std::env::args().nth(1) {
        Some(path) => match SceneConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(path = %path, error = %err, "could not load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => SceneConfig::default(),
    };

    match treelight::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "viewer exited with an error");
            ExitCode::FAILURE
        }
    }
}
