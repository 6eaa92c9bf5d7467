use tracing_subscriber::EnvFilter;

use leashbreak_runner::config::RunnerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = RunnerConfig::load();
    tracing::info!(mode = ?config.mode, seed = config.seed, "Leashbreak starting");

    let json = leashbreak_runner::run(config)
        .await
        .and_then(|result| leashbreak_runner::result_json(&result));
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "match failed");
            std::process::exit(1);
        },
    }
}
