//! Login, logout and whoami commands

use crate::cli::output::{format_identity, format_json};
use crate::cli::LoginArgs;
use crate::session::SessionController;
use std::io::{self, BufRead, Write};

fn prompt_password() -> io::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Handle `watchtower login`
pub async fn handle_login(
    args: &LoginArgs,
    session: &SessionController,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => prompt_password()?,
    };

    match session.login(&args.username, &password).await {
        Ok(identity) if json => Ok(format_json("user", &identity)?),
        Ok(identity) => Ok(format!("✓ Logged in as {}", format_identity(&identity))),
        Err(e) => Err(session
            .last_error()
            .unwrap_or_else(|| e.user_message())
            .into()),
    }
}

/// Handle `watchtower logout`
pub fn handle_logout(session: &SessionController) -> String {
    session.logout();
    "✓ Logged out".to_string()
}

/// Handle `watchtower whoami`
pub async fn handle_whoami(
    session: &SessionController,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    match session.check_auth().await? {
        Some(identity) if json => Ok(format_json("user", &identity)?),
        Some(identity) => Ok(format_identity(&identity)),
        None => Err("Not logged in. Run `watchtower login <username>` first.".into()),
    }
}
