use std::time::Duration;

use rocket::{
    Orbit, Rocket,
    fairing::{Fairing, Info, Kind},
};
use tokio::time;
use tracing::{debug, info, warn};

use crate::registry::Games;

/// Starts the sweep once Rocket is up and closes every game on shutdown.
pub struct CleanupFairing {
    pub interval: Duration,
}

#[rocket::async_trait]
impl Fairing for CleanupFairing {
    fn info(&self) -> Info {
        Info {
            name: "Cleanup Task",
            kind: Kind::Liftoff | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        if let Some(games) = rocket.state::<Games>() {
            info!("Starting cleanup task for game management");
            tokio::spawn(start_cleanup_task(games.clone(), self.interval));
        } else {
            warn!("Failed to get games state for cleanup task");
        }
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        if let Some(games) = rocket.state::<Games>() {
            info!("Shutting down, closing {} games", games.len());
            games.close_all().await;
        }
    }
}

/// Periodically drops registry entries whose actors have stopped, whether
/// from inactivity or an explicit close, and purges journals past retention.
pub async fn start_cleanup_task(games: Games, interval: Duration) {
    let mut interval = time::interval(interval);

    info!(
        "Started game cleanup task: checking every {}s, inactivity timeout: {}s",
        interval.period().as_secs(),
        games.context().settings.inactivity_timeout.as_secs()
    );

    loop {
        interval.tick().await;
        cleanup_games(&games);
    }
}

fn cleanup_games(games: &Games) {
    let removed_count = games.remove_stopped();

    if removed_count > 0 {
        info!("Cleaned up {} inactive games", removed_count);
    } else {
        debug!("No inactive games to clean up, {} active", games.len());
    }

    let purged_count = games.purge_retired();
    if purged_count > 0 {
        info!("Purged journals of {} retired games", purged_count);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use minesweeper_common::models::Config;

    use super::*;
    use crate::{actor::ActorContext, config::Settings, registry::Registry};

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_expired_games() {
        let settings = Settings {
            inactivity_timeout: Duration::from_secs(10),
            ..Settings::default()
        };
        let games: Games = Arc::new(Registry::new(ActorContext::new(settings)));
        let created = games.create(&Config::default(), None).await.unwrap();
        let handle = games.handle(&created.id).unwrap();

        tokio::spawn(start_cleanup_task(games.clone(), Duration::from_secs(5)));
        handle.stopped().await;
        time::sleep(Duration::from_secs(6)).await;

        assert!(games.is_empty());
    }
}
