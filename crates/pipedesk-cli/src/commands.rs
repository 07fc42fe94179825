//! Command dispatch for the pipedesk CLI.
//!
//! Every command builds the same trio: an `ApiClient` for transport, a
//! `SessionManager` that owns the token lifecycle, and a `CrmClient` that
//! reads the token from the manager per request. Commands that need an
//! authenticated session resume and verify the stored one first.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::warn;

use pipedesk_core::api::{ApiClient, CrmClient};
use pipedesk_core::auth::{AuthState, CredentialStore, SessionManager, TokenStore};
use pipedesk_core::config::Config;
use pipedesk_core::models::{NewUser, Role, UserUpdate};

pub async fn run(args: &[String]) -> Result<()> {
    let mut config = Config::load()?;
    let api = ApiClient::new(&config)?;
    let session = SessionManager::new(Arc::new(api.clone()), TokenStore::new(Config::data_dir()?));
    let crm = CrmClient::new(&api, session.clone());

    let command = args[0].as_str();
    let remember = args.iter().any(|arg| arg == "--remember");
    let assume_yes = args.iter().any(|arg| arg == "--yes");
    let operand = args.get(1).filter(|arg| !arg.starts_with("--"));

    match command {
        "login" => login(&mut config, &session, operand.map(String::as_str), remember).await,
        "signup" => signup(&api).await,
        "status" => status(&session).await,
        "logout" => {
            session.logout();
            println!("Signed out");
            Ok(())
        }
        "profile" => {
            require_session(&session).await?;
            profile(&crm).await
        }
        "delete-account" => delete_account(&session, assume_yes).await,
        "watch" => watch(&session).await,
        "list" => {
            let entity = operand.context("Usage: pipedesk list <entity>")?;
            require_session(&session).await?;
            list(&crm, entity).await
        }
        "show" => {
            let entity = operand.context("Usage: pipedesk show <entity> <id>")?;
            let id = parse_id(args.get(2))?;
            require_session(&session).await?;
            show(&crm, entity, id).await
        }
        "remove" => {
            let entity = operand.context("Usage: pipedesk remove <entity> <id>")?;
            let id = parse_id(args.get(2))?;
            require_session(&session).await?;
            remove(&crm, entity, id).await
        }
        "promote" => {
            let id = parse_id(operand)?;
            require_session(&session).await?;
            let user = crm.promote_user(id).await?;
            println!("{} is now {}", user.username, user.role);
            Ok(())
        }
        "disable" => {
            let id = parse_id(operand)?;
            require_session(&session).await?;
            let user = crm.disable_user(id).await?;
            println!("{} disabled", user.username);
            Ok(())
        }
        "enable" => {
            let id = parse_id(operand)?;
            require_session(&session).await?;
            let user = crm.enable_user(id).await?;
            println!("{} enabled", user.username);
            Ok(())
        }
        "gong" => {
            let action = operand.context("Usage: pipedesk gong <register|schema|push>")?;
            require_session(&session).await?;
            gong(&crm, &session, action).await
        }
        other => bail!("Unknown command: {}. Run pipedesk without arguments for usage.", other),
    }
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    arg.context("Missing id argument")?
        .parse()
        .context("Id must be a number")
}

async fn require_session(session: &SessionManager) -> Result<()> {
    if !session.resume().await? {
        bail!("Not signed in. Run `pipedesk login <username>` first.");
    }
    Ok(())
}

// =============================================================================
// Account commands
// =============================================================================

async fn login(
    config: &mut Config,
    session: &SessionManager,
    username: Option<&str>,
    remember: bool,
) -> Result<()> {
    let username = match username {
        Some(name) => name.to_string(),
        None => match config.last_username.clone() {
            Some(last) => prompt_with_default("Username", &last)?,
            None => prompt("Username")?,
        },
    };

    let password = if CredentialStore::has_credentials(&username) {
        CredentialStore::password(&username)?
    } else {
        rpassword::prompt_password("Password: ")?
    };

    let established = session.login(&username, &password).await?;

    if remember {
        if let Err(error) = CredentialStore::store(&username, &password) {
            warn!(%error, "Failed to store credentials");
        }
    }

    config.last_username = Some(username.clone());
    if let Err(error) = config.save() {
        warn!(%error, "Failed to save config");
    }

    match established.role {
        Some(role) => println!("Signed in as {} ({})", username, role),
        None => println!("Signed in as {}", username),
    }
    Ok(())
}

async fn signup(api: &ApiClient) -> Result<()> {
    println!("Create a new account. All fields are required.\n");

    let user = NewUser {
        username: prompt("Username")?,
        email: prompt("Email")?,
        phone: prompt("Phone")?,
        first_name: prompt("First name")?,
        last_name: prompt("Last name")?,
        password: rpassword::prompt_password("Password: ")?,
    };

    api.sign_up(&user).await?;
    println!("Sign-up successful! You can now log in.");
    Ok(())
}

async fn status(session: &SessionManager) -> Result<()> {
    if session.resume().await? {
        println!("Signed in");
        if let Some(user_id) = session.current_user_id() {
            println!("  user id: {}", user_id);
        }
        if let Some(role) = session.current_role() {
            println!("  role:    {}", role);
        }
    } else {
        println!("Signed out");
    }
    Ok(())
}

async fn profile(crm: &CrmClient) -> Result<()> {
    let current = crm.current_user().await?;
    println!("Update profile (enter keeps the current value).\n");

    let update = UserUpdate {
        username: prompt_with_default("Username", &current.username)?,
        email: prompt_with_default("Email", &current.email)?,
        phone: prompt_with_default("Phone", &current.phone)?,
        first_name: prompt_with_default("First name", &current.first_name)?,
        last_name: prompt_with_default("Last name", &current.last_name)?,
        password: None,
        disabled: None,
    };

    crm.update_user(current.id, &update).await?;
    println!("Profile updated successfully");
    Ok(())
}

async fn delete_account(session: &SessionManager, assume_yes: bool) -> Result<()> {
    require_session(session).await?;

    if !assume_yes {
        let answer = prompt("Really delete your account? This cannot be undone [y/N]")?;
        if !answer.eq_ignore_ascii_case("y") {
            println!("Aborted");
            return Ok(());
        }
    }

    session.delete_account().await?;
    println!("Account deleted");
    Ok(())
}

/// Stay resident with the refresh chain running, reporting session
/// transitions until the session ends or the process is interrupted.
async fn watch(session: &SessionManager) -> Result<()> {
    require_session(session).await?;

    // A resumed token has no declared lifetime; renew once now to learn it
    // and start the refresh chain.
    session.refresh().await?;

    let mut rx = session.subscribe();
    println!("Watching session; Ctrl-C to exit.");
    loop {
        if rx.changed().await.is_err() {
            return Ok(());
        }
        let state = rx.borrow().clone();
        match state {
            AuthState::LoggedIn { user_id, .. } => match user_id {
                Some(user_id) => println!("signed in (user {})", user_id),
                None => println!("signed in"),
            },
            AuthState::LoggedOut => {
                println!("signed out - the token could not be renewed");
                return Ok(());
            }
        }
    }
}

// =============================================================================
// Entity commands
// =============================================================================

async fn list(crm: &CrmClient, entity: &str) -> Result<()> {
    match entity {
        "companies" => {
            for company in crm.list_companies().await? {
                println!(
                    "{:>5}  {:<30} {:<20} {}",
                    company.id,
                    company.name,
                    company.industry,
                    company.domain_names()
                );
            }
        }
        "contacts" => {
            for contact in crm.list_contacts().await? {
                println!(
                    "{:>5}  {:<25} {:<30} {}",
                    contact.id,
                    contact.full_name(),
                    contact.email,
                    contact.phone
                );
            }
        }
        "leads" => {
            for lead in crm.list_leads().await? {
                println!(
                    "{:>5}  {:<25} {:<25} {}",
                    lead.id,
                    lead.full_name(),
                    lead.company,
                    lead.status
                );
            }
        }
        "deals" => {
            for deal in crm.list_deals().await? {
                println!(
                    "{:>5}  {:<30} {:>10}  {:<20} {}",
                    deal.id, deal.title, deal.amount, deal.stage, deal.status
                );
            }
        }
        "users" => {
            for user in crm.list_users().await? {
                let flag = if user.disabled { "disabled" } else { "" };
                println!("{:>5}  {:<20} {:<8} {}", user.id, user.username, user.role, flag);
            }
        }
        other => bail!("Unknown entity type: {}", other),
    }
    Ok(())
}

async fn show(crm: &CrmClient, entity: &str, id: i64) -> Result<()> {
    let rendered = match entity {
        "companies" => serde_json::to_string_pretty(&crm.get_company(id).await?)?,
        "contacts" => serde_json::to_string_pretty(&crm.get_contact(id).await?)?,
        "leads" => serde_json::to_string_pretty(&crm.get_lead(id).await?)?,
        "deals" => serde_json::to_string_pretty(&crm.get_deal(id).await?)?,
        "users" => serde_json::to_string_pretty(&crm.get_user(id).await?)?,
        other => bail!("Unknown entity type: {}", other),
    };
    println!("{}", rendered);
    Ok(())
}

async fn remove(crm: &CrmClient, entity: &str, id: i64) -> Result<()> {
    match entity {
        "companies" => crm.delete_company(id).await?,
        "contacts" => crm.delete_contact(id).await?,
        "leads" => crm.delete_lead(id).await?,
        "deals" => crm.delete_deal(id).await?,
        other => bail!("Cannot remove entity type: {}", other),
    }
    println!("Deleted {} {}", entity, id);
    Ok(())
}

// =============================================================================
// Gong integration
// =============================================================================

async fn gong(crm: &CrmClient, session: &SessionManager, action: &str) -> Result<()> {
    // The server enforces this; checking here just gives a friendlier message
    if session.current_role() != Some(Role::Admin) {
        bail!("The Gong integration requires an admin account");
    }

    match action {
        "register" => {
            let response = crm.register_gong_integration().await?;
            println!("Registered integration {}", response.integration_id);
        }
        "schema" => {
            let response = crm.update_gong_schema().await?;
            println!("{}", response.message);
        }
        "push" => {
            let response = crm.push_to_gong().await?;
            println!("{}", response.message);
        }
        other => bail!("Unknown gong action: {}", other),
    }
    Ok(())
}

// =============================================================================
// Prompt helpers
// =============================================================================

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_with_default(label: &str, default: &str) -> Result<String> {
    print!("{} [{}]: ", label, default);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input.to_string())
    }
}
