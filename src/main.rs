//! Taskdeck CLI - register, log in, and manage tasks from the terminal.
//!
//! This binary is the composition root: it wires config, storage, the
//! session store, the credential exchange and the task client together and
//! maps small subcommands onto them.

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskdeck::api::ApiError;
use taskdeck::auth::{password_strength, validate_registration, Navigator};
use taskdeck::models::{
    filter_tasks, LoginCredentials, NewTask, RegisterRequest, StatusFilter, TaskPatch, TaskStatus,
};
use taskdeck::{AuthClient, Config, LocalStore, SessionManager, SessionStore, TaskClient};

/// Default due date offset for new tasks, in days.
const DEFAULT_DUE_DAYS: i64 = 7;

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Navigation signal sink for a CLI: there is nowhere to route to, so the
/// request is just logged.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn to_login(&self) {
        info!("Session ended, next command will require a login");
    }
}

fn usage() -> &'static str {
    "usage: taskdeck <command>\n\
     \n\
     commands:\n\
       register              create an account and log in\n\
       login                 log in and persist the session\n\
       logout                clear the persisted session\n\
       whoami                show the logged-in user\n\
       refresh               exchange the refresh token for a new session\n\
       list [STATUS]         list tasks, optionally TODO|IN_PROGRESS|DONE\n\
       add <title> [due]     create a task (due: YYYY-MM-DD[THH:MM:SS])\n\
       done <id>             mark a task as done\n\
       rm <id>               delete a task"
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        println!("{}", usage());
        return Ok(());
    };

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    let storage = LocalStore::open(Config::data_dir());
    let store = SessionStore::new(storage);
    let exchange = AuthClient::new(&config.api_url)?;
    let mut manager = SessionManager::new(store, exchange, Box::new(CliNavigator));
    let tasks = TaskClient::new(&config.api_url)?;

    match command {
        "register" => register(&mut manager, &mut config).await,
        "login" => login(&mut manager, &mut config).await,
        "logout" => {
            manager.logout();
            println!("Logged out.");
            Ok(())
        }
        "whoami" => {
            match manager.store().current() {
                Some(user) => println!("{} <{}>", user.username, user.email),
                None => println!("Not logged in."),
            }
            Ok(())
        }
        "refresh" => {
            manager.refresh_session().await.context("Refresh failed")?;
            println!("Session refreshed.");
            Ok(())
        }
        "list" => list(&mut manager, &tasks, args.get(2).map(String::as_str)).await,
        "add" => {
            let title = args.get(2).context("add requires a title")?.clone();
            add(&mut manager, &tasks, title, args.get(3).map(String::as_str)).await
        }
        "done" => {
            let id = parse_id(args.get(2))?;
            complete(&mut manager, &tasks, id).await
        }
        "rm" => {
            let id = parse_id(args.get(2))?;
            remove(&mut manager, &tasks, id).await
        }
        _ => {
            println!("{}", usage());
            Ok(())
        }
    }
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    arg.context("a numeric task id is required")?
        .parse()
        .context("task id must be a number")
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        if let Some(d) = default {
            return Ok(d.to_string());
        }
    }
    Ok(input.to_string())
}

async fn register(manager: &mut SessionManager<AuthClient>, config: &mut Config) -> Result<()> {
    let username = prompt("Username", None)?;
    let email = prompt("Email", None)?;
    let password = rpassword::prompt_password("Password: ")?;

    let strength = password_strength(&password);
    if strength < 100 {
        println!("Password strength: {}%", strength);
    }

    let payload = RegisterRequest {
        username,
        email,
        password,
    };
    validate_registration(&payload).context("Invalid registration details")?;

    let user = manager
        .register(payload)
        .await
        .map_err(|e| anyhow::anyhow!(e.message()))?;

    config.last_username = Some(user.username.clone());
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }

    println!("Registered and logged in as {}.", user.username);
    Ok(())
}

async fn login(manager: &mut SessionManager<AuthClient>, config: &mut Config) -> Result<()> {
    let username = prompt("Username", config.last_username.as_deref())?;
    let password = rpassword::prompt_password("Password: ")?;

    let user = manager
        .login(LoginCredentials { username, password })
        .await
        .map_err(|e| anyhow::anyhow!(e.message()))?;

    config.last_username = Some(user.username.clone());
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}.", user.username);
    Ok(())
}

/// Run a task operation with the current access token, refreshing the
/// session and retrying once if the server rejects the token.
async fn with_session<T, F>(
    manager: &mut SessionManager<AuthClient>,
    tasks: &TaskClient,
    op: F,
) -> Result<T>
where
    F: Fn(TaskClient) -> Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>,
{
    anyhow::ensure!(manager.is_authenticated(), "Not logged in. Run `taskdeck login` first.");

    let mut client = tasks.clone();
    client.set_token(manager.access_token());

    match op(client).await {
        Err(e) if e.is_unauthorized() => {
            info!("Access token rejected, refreshing session");
            manager
                .refresh_session()
                .await
                .context("Session expired. Please log in again.")?;

            let mut client = tasks.clone();
            client.set_token(manager.access_token());
            Ok(op(client).await?)
        }
        other => Ok(other?),
    }
}

fn parse_status_filter(arg: Option<&str>) -> Result<StatusFilter> {
    match arg {
        None | Some("ALL") => Ok(StatusFilter::All),
        Some(s) => {
            let status: TaskStatus = serde_json::from_value(serde_json::Value::String(s.to_string()))
                .map_err(|_| anyhow::anyhow!("unknown status {s:?}, expected TODO|IN_PROGRESS|DONE"))?;
            Ok(StatusFilter::Only(status))
        }
    }
}

async fn list(
    manager: &mut SessionManager<AuthClient>,
    tasks: &TaskClient,
    status: Option<&str>,
) -> Result<()> {
    let filter = parse_status_filter(status)?;
    let all = with_session(manager, tasks, |c| Box::pin(async move { c.list().await })).await?;

    let visible = filter_tasks(&all, filter);
    if visible.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    for task in visible {
        println!(
            "{:>4}  {:<12} {:<16} {}",
            task.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            task.status.title(),
            task.due_date.format("%Y-%m-%d %H:%M"),
            task.title
        );
    }
    Ok(())
}

fn parse_due(arg: Option<&str>) -> Result<NaiveDateTime> {
    match arg {
        None => Ok(Local::now().naive_local() + Duration::days(DEFAULT_DUE_DAYS)),
        Some(s) => {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                return Ok(dt);
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("could not parse due date {s:?}"))?;
            date.and_hms_opt(17, 0, 0)
                .context("could not build due time")
        }
    }
}

async fn add(
    manager: &mut SessionManager<AuthClient>,
    tasks: &TaskClient,
    title: String,
    due: Option<&str>,
) -> Result<()> {
    let new_task = NewTask {
        title,
        description: String::new(),
        status: TaskStatus::Todo,
        due_date: parse_due(due)?,
    };

    let created = with_session(manager, tasks, move |c| {
        let new_task = new_task.clone();
        Box::pin(async move { c.create(&new_task).await })
    })
    .await?;

    println!(
        "Created task {} ({}).",
        created.id.unwrap_or_default(),
        created.title
    );
    Ok(())
}

async fn complete(
    manager: &mut SessionManager<AuthClient>,
    tasks: &TaskClient,
    id: i64,
) -> Result<()> {
    let patch = TaskPatch {
        status: Some(TaskStatus::Done),
        ..Default::default()
    };

    let updated = with_session(manager, tasks, move |c| {
        let patch = patch.clone();
        Box::pin(async move { c.update(id, &patch).await })
    })
    .await?;

    println!("Task {} is done.", updated.id.unwrap_or(id));
    Ok(())
}

async fn remove(
    manager: &mut SessionManager<AuthClient>,
    tasks: &TaskClient,
    id: i64,
) -> Result<()> {
    with_session(manager, tasks, move |c| {
        Box::pin(async move { c.delete(id).await })
    })
    .await?;

    println!("Task {} deleted.", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_filters() {
        assert_eq!(parse_status_filter(None).unwrap(), StatusFilter::All);
        assert_eq!(parse_status_filter(Some("ALL")).unwrap(), StatusFilter::All);
        assert_eq!(
            parse_status_filter(Some("IN_PROGRESS")).unwrap(),
            StatusFilter::Only(TaskStatus::InProgress)
        );
        assert!(parse_status_filter(Some("LATER")).is_err());
    }

    #[test]
    fn parses_due_dates() {
        assert_eq!(
            parse_due(Some("2026-03-01T09:30:00")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
        assert_eq!(
            parse_due(Some("2026-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(17, 0, 0)
                .unwrap()
        );
        assert!(parse_due(Some("next tuesday")).is_err());
    }
}
