pub mod health;
pub mod matches;
pub mod play_ws;
