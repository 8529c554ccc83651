pub mod acquisition;
pub mod app;
pub mod clock;
pub mod config;
pub mod demo_data;
pub mod diagnostic;
pub mod endpoints;
pub mod error;
pub mod finishing;
pub mod fpl_payload;
pub mod health;
pub mod http_client;
pub mod logging;
pub mod notify;
pub mod player_luck;
pub mod regression;
pub mod server;
pub mod state;
pub mod stats_cache;
pub mod team_analysis;
pub mod team_luck;
