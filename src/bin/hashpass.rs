//! Print an `INSERT` for a new app_user with an Argon2 password hash.
//!
//! Usage: hashpass <username> <role_id> <password>

use anyhow::{Context, bail};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [username, role_id, password] = args.as_slice() else {
        bail!("usage: hashpass <username> <role_id> <password>");
    };
    let role_id: i16 = role_id.parse().context("role_id must be 0..3")?;
    if !(0..=3).contains(&role_id) {
        bail!("role_id must be 0..3");
    }

    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2 hash error: {e}"))?
        .to_string();

    let username = username.replace('\'', "''");
    println!(
        "INSERT INTO app_user (username, display_name, password_hash, role_id) VALUES ('{username}', '{username}', '{phc}', {role_id});"
    );
    Ok(())
}
