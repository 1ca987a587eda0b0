mod account;
mod api;
mod bot;
mod config;
mod job;
mod locations;
pub mod ui;

pub use account::Account;
pub use bot::Bot;
pub use config::Config;

pub fn init_logger(default_level: log::LevelFilter) {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(default_level)
        .parse_default_env()
        .init();
}
