pub mod config;
pub mod dos_game;
