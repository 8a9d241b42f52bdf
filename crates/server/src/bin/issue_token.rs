//! Mint a development token for a username.
//!
//! Usage: cargo run --bin issue-token -- <username>
//!
//! Signs with JWT_SECRET_KEY and JWT_EXPIRE_HOURS, same as the server.

use chess_server::auth::jwt;
use chess_server::config::Config;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let username = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: issue-token <username>"))?;

    let config = Config::from_env();
    let token = jwt::create_token(&username, &config.jwt_secret, config.jwt_expire_hours)?;

    eprintln!(
        "Token for {username}, valid {} hours:",
        config.jwt_expire_hours
    );
    println!("{token}");
    Ok(())
}
