//! Interactive creation of the Telegram session file.

use std::io::{self, BufRead, Write};

use grammers_client::SignInError;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{get_client_for_init, SessionLock};

/// Word the user must type to replace the current session.
const CONFIRMATION: &str = "YES";

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

pub fn is_confirmed(input: &str) -> bool {
    input.trim() == CONFIRMATION
}

pub async fn run() -> Result<()> {
    let config = Config::new();
    config.require_credentials()?;

    println!(
        r#"
╔═══════════════════════════════════════════════════════════════╗
║  NEW TELEGRAM SESSION                                         ║
╚═══════════════════════════════════════════════════════════════╝

⚠️  This creates a new session for {} in {}.
   Telegram may log out other sessions of this account.
"#,
        config.phone,
        config.session_file()
    );

    let answer = prompt("   Type 'YES' to continue: ")?;
    if !is_confirmed(&answer) {
        println!("\n❌ Cancelled. Session file was not changed.");
        return Ok(());
    }

    let _lock = SessionLock::acquire(&config)?;
    let client = get_client_for_init(&config).await?;

    if client.is_authorized().await? {
        println!("\n✅ {} is already authorized.", config.session_file());
        return Ok(());
    }

    println!("\n🔄 Requesting login code for {}...", config.phone);
    let token = client
        .request_login_code(&config.phone, &config.api_hash)
        .await
        .map_err(|e| Error::TelegramError(format!("Failed to request code: {}", e)))?;

    let code = prompt("📱 Enter the code from Telegram: ")?;

    let user = match client.sign_in(&token, &code).await {
        Ok(user) => user,
        Err(SignInError::PasswordRequired(password_token)) => {
            let hint = password_token.hint().unwrap_or("none").to_string();
            let password = prompt(&format!("🔐 Two-step password (hint: {}): ", hint))?;
            client
                .check_password(password_token, password.as_bytes())
                .await
                .map_err(|e| Error::TelegramError(format!("Failed to check password: {}", e)))?
        }
        Err(e) => return Err(Error::TelegramError(format!("Failed to sign in: {}", e))),
    };

    println!(
        r#"
╔═══════════════════════════════════════════════════════════════╗
║  ✅ SESSION CREATED                                           ║
╚═══════════════════════════════════════════════════════════════╝

  Name: {}
  Username: @{}
  Session file: {}

Keep a backup of the session file; every other command reuses it.
"#,
        user.full_name(),
        user.username().unwrap_or("-"),
        config.session_file()
    );

    Ok(())
}
