//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use coursehub_core::api::{DEFAULT_ROLE, SignupForm};
use coursehub_core::claims::AccessClaims;
use coursehub_core::client::ApiClient;
use coursehub_core::session::mask_token;

use super::api_error;

#[derive(clap::Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long, default_value = DEFAULT_ROLE)]
    role: String,
    #[arg(long)]
    mobile_no: Option<String>,
    /// Prompted on stdin (with confirmation) when omitted
    #[arg(long, env = "COURSEHUB_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

/// Reads one line from stdin after printing `label`.
fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("read from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn login(
    client: &ApiClient,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };

    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        anyhow::bail!("Username and password are required");
    }

    // A 401 here means bad credentials, not an expired session.
    client
        .login(username, &password)
        .await
        .context("Login failed")?;

    println!("✓ Logged in as {username}");
    Ok(())
}

pub async fn signup(client: &ApiClient, args: SignupArgs) -> Result<()> {
    let (password, confirm_password) = match args.password {
        Some(password) => (password.clone(), password),
        None => (prompt("Password: ")?, prompt("Confirm password: ")?),
    };

    let form = SignupForm {
        username: args.username,
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        password,
        confirm_password,
        role: args.role,
        mobile_no: args.mobile_no,
    };

    client.signup(&form).await.map_err(api_error)?;

    println!("✓ Account created, logged in as {}", form.username.trim());
    Ok(())
}

pub fn logout(client: &ApiClient) {
    let was_logged_in = client.session().is_authenticated();
    client.logout();
    if was_logged_in {
        println!("✓ Logged out");
    } else {
        println!("Not logged in.");
    }
}

pub fn status(client: &ApiClient) {
    let Some(session) = client.session().current() else {
        println!("Not logged in.");
        return;
    };

    println!("Logged in (token: {})", mask_token(&session.access_token));

    let Some(claims) = AccessClaims::decode(&session.access_token) else {
        return;
    };
    if let Some(user_id) = claims.user_id {
        println!("  User ID: {user_id}");
    }
    if let Some(role) = &claims.role {
        println!("  Role:    {role}");
    }
    if let Some(expires_at) = claims.expires_at() {
        let note = if claims.is_expired_at(Utc::now()) {
            " (expired, refreshed on next request)"
        } else {
            ""
        };
        println!("  Expires: {}{note}", expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}
