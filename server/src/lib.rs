//! Minesweeper game server: one serialized actor per game instance, a
//! registry that routes commands to them by id, and a thin REST gateway.

pub mod actor;
pub mod cleanup;
pub mod config;
pub mod cors;
pub mod data;
pub mod error;
pub mod journal;
pub mod logic;
pub mod registry;
pub mod routes;

use std::sync::Arc;

use rocket::{Build, Rocket, catchers, routes};

use crate::{
    actor::ActorContext,
    cleanup::CleanupFairing,
    config::Settings,
    cors::create_cors,
    registry::{Games, Registry},
};

/// Rocket instance with a registry backed by the system clock, entropy
/// seeds and an in-memory journal.
pub fn build_rocket(settings: Settings) -> Result<Rocket<Build>, rocket_cors::Error> {
    let cleanup_interval = settings.cleanup_interval;
    let cors = create_cors(&settings)?;
    let games: Games = Arc::new(Registry::new(ActorContext::new(settings)));

    Ok(rocket::build()
        .attach(cors)
        .attach(CleanupFairing {
            interval: cleanup_interval,
        })
        .manage(games)
        .mount(
            "/api",
            routes![
                routes::create_game,
                routes::get_game,
                routes::make_move,
                routes::signal_move,
                routes::restart_game,
                routes::health,
            ],
        )
        .register("/", catchers![routes::json_catcher]))
}
