use minesweeper_server::{build_rocket, config::Settings};
use tracing::info;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    info!("🚀 Starting Minesweeper game server");

    let settings = Settings::from_env();
    info!(
        "📊 Inactivity timeout {}s, cleanup every {}s, mine placement {}, restore on reactivation: {}, journal retention {}s",
        settings.inactivity_timeout.as_secs(),
        settings.cleanup_interval.as_secs(),
        settings.mine_placement,
        settings.restore_on_reactivation,
        settings.journal_retention.as_secs()
    );

    let rocket = build_rocket(settings)?;

    info!("🌐 Server configured with CORS, cleanup task, and routes");
    info!(
        "📡 Endpoints: POST /api/games, GET /api/games/<id>, POST /api/games/<id>/moves, \
         POST /api/games/<id>/moves/signal, POST /api/games/<id>/restart, GET /api/health"
    );

    rocket.launch().await?;
    Ok(())
}
