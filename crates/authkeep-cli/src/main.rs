//! authkeep - sign in to a remote API from the terminal.
//!
//! Collects credentials, runs them through the session state machine and
//! keeps the resulting token and profile for the next run.

mod cli;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use authkeep_core::auth::SessionStatus;
use authkeep_core::utils::safe_redirect;
use authkeep_core::{
    clear_local_session, ApiClient, Config, CredentialAttacher, Credentials, KeyValueStore,
    Session, SessionManager,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let matches = cli::new().get_matches();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if let Some(backend) = matches.get_one::<String>("store") {
        config.store_backend = backend.parse()?;
    }

    let store = config.open_store()?;
    let attacher = Arc::new(CredentialAttacher::new(store.clone()));

    if let Some(("status", _)) | None = matches.subcommand() {
        return status(store.as_ref(), &attacher);
    }

    let base_url =
        match config.api_base_url(matches.get_one::<String>("api-url").map(String::as_str)) {
            Ok(url) => url,
            Err(e) if matches!(matches.subcommand(), Some(("logout", _))) => {
                warn!(error = %e, "No API URL; clearing the local session only");
                return logout_local(&attacher);
            }
            Err(e) => return Err(e),
        };
    let api = ApiClient::with_timeout(&base_url, attacher, config.request_timeout())
        .context("Failed to build HTTP client")?;
    let manager = SessionManager::new(api);

    match matches.subcommand() {
        Some(("login", sub)) => {
            let identifier = sub.get_one::<String>("identifier").cloned();
            let next = sub.get_one::<String>("next").map(String::as_str);
            login(manager, &mut config, identifier, next).await
        }
        Some(("logout", _)) => logout(manager).await,
        Some(("whoami", _)) => whoami(manager).await,
        other => Err(anyhow::anyhow!(
            "Unknown command: {}",
            other.map(|(name, _)| name).unwrap_or_default()
        )),
    }
}

async fn login(
    manager: SessionManager,
    config: &mut Config,
    identifier: Option<String>,
    next: Option<&str>,
) -> Result<()> {
    let identifier = match identifier {
        Some(identifier) => identifier,
        None => prompt_identifier(config.last_identifier.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let handle = manager.spawn();
    let mut state = handle.subscribe();
    let progress = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            if state.borrow_and_update().status == SessionStatus::Loading {
                eprintln!("Signing in...");
            }
        }
    });

    let result = handle.login(Credentials::new(identifier.trim(), password)).await;
    progress.abort();

    match result {
        Ok(session) => {
            config.last_identifier = Some(identifier.trim().to_string());
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            let name = session
                .user
                .as_ref()
                .map(|u| u.display_name())
                .unwrap_or_else(|| identifier.trim().to_string());
            println!("Signed in as {}", name);
            println!("Continue at {}", safe_redirect(next));
            Ok(())
        }
        Err(e) => {
            let message = handle.current().error.unwrap_or_else(|| e.to_string());
            Err(anyhow::anyhow!(message))
        }
    }
}

fn prompt_identifier(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email or mobile [{}]: ", last),
        None => print!("Email or mobile: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

async fn logout(mut manager: SessionManager) -> Result<()> {
    manager.logout().await;
    info!("Local session cleared");
    println!("Logged out");
    Ok(())
}

/// Logout without a server: drop the stored token and user.
fn logout_local(attacher: &CredentialAttacher) -> Result<()> {
    clear_local_session(attacher).context("Failed to clear local session")?;
    info!("Local session cleared");
    println!("Logged out");
    Ok(())
}

async fn whoami(mut manager: SessionManager) -> Result<()> {
    if !manager.session().is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }
    match manager.fetch_profile().await {
        Ok(session) => {
            if let Some(user) = session.user {
                println!("{}", serde_json::to_string_pretty(user.as_value())?);
            }
            Ok(())
        }
        Err(_) => {
            let session = manager.session();
            if let Some(ref user) = session.user {
                eprintln!("Showing cached profile for {}", user.display_name());
            }
            Err(anyhow::anyhow!(session
                .error
                .clone()
                .unwrap_or_else(|| "Failed to fetch profile".to_string())))
        }
    }
}

fn status(store: &dyn KeyValueStore, attacher: &CredentialAttacher) -> Result<()> {
    let token = attacher.hydrate()?;
    let session = Session::hydrate(store, token);
    print_status(&session);
    Ok(())
}

fn print_status(session: &Session) {
    if session.is_authenticated() {
        let who = session
            .user
            .as_ref()
            .map(|u| u.display_name())
            .unwrap_or_else(|| "unknown user".to_string());
        println!("Logged in as {} (token stored)", who);
    } else {
        println!("Not logged in");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authkeep_core::MemoryStore;

    #[test]
    fn test_logout_local_clears_store() {
        let store = Arc::new(MemoryStore::new());
        store.set("auth_token", "T1").unwrap();
        store.set("auth_user", r#"{"id":1}"#).unwrap();
        let attacher = CredentialAttacher::new(store.clone());
        attacher.hydrate().unwrap();

        logout_local(&attacher).unwrap();

        assert!(store.is_empty());
        let session = Session::hydrate(store.as_ref(), attacher.hydrate().unwrap());
        assert!(!session.is_authenticated());
    }
}
