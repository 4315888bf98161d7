//! Subcommand implementations.
//!
//! Output goes to the supplied writer so the commands can be exercised
//! without a terminal.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use broker_auth::{
    AppRecord, AuthConfig, CredentialAdmin, DefaultPolicy, HookTable, Inconsistency, JsonFileStore,
    NewApplication, OsRandomSource, ReloadController, ReloadHandle,
};

const RULE: &str = "==========================================================";
const THIN_RULE: &str = "----------------------------------------------------------";

fn admin(config: &AuthConfig) -> Result<CredentialAdmin<JsonFileStore, OsRandomSource>> {
    let admin =
        CredentialAdmin::new(JsonFileStore::new(), OsRandomSource::new(), config.key_policy())?;
    Ok(admin)
}

fn credentials_path(config: &AuthConfig) -> Result<&Path> {
    config
        .credentials_path
        .as_deref()
        .context("no credentials file configured (use --auth)")
}

fn print_record(out: &mut impl Write, app: &AppRecord) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(app)?)?;
    Ok(())
}

/// `addapp <name> [key] [secret]`
pub fn add_app(
    out: &mut impl Write,
    config: &AuthConfig,
    name: String,
    key: Option<String>,
    secret: Option<String>,
) -> Result<AppRecord> {
    let path = credentials_path(config)?;
    let request = NewApplication { name, key, secret };

    let app = admin(config)?
        .add_application(path, request)
        .with_context(|| format!("failed to add app to {}", path.display()))?;

    writeln!(out, "{}", RULE)?;
    writeln!(out, "created app [{} - {}]", app.name, app.key)?;
    writeln!(out, "{}", THIN_RULE)?;
    print_record(out, &app)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)?;
    Ok(app)
}

/// `rmapp <key>`
pub fn remove_app(
    out: &mut impl Write,
    config: &AuthConfig,
    key: &str,
) -> Result<Option<AppRecord>> {
    let path = credentials_path(config)?;
    let removed = admin(config)?
        .remove_application(path, key)
        .with_context(|| format!("failed to remove app from {}", path.display()))?;

    match &removed {
        Some(app) => writeln!(out, "[rmapp] removed app [{} - {}]", app.name, app.key)?,
        None => writeln!(out, "[rmapp] no app with key `{}` removed", key)?,
    }
    writeln!(out)?;
    Ok(removed)
}

/// `list`: every app without its secret
pub fn list_apps(out: &mut impl Write, config: &AuthConfig) -> Result<usize> {
    let path = credentials_path(config)?;
    let apps = admin(config)?
        .list_applications(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    for app in &apps {
        writeln!(out, "{:>6}  {:<24}  {}", app.id, app.key, app.name)?;
    }
    writeln!(out, "{} app(s)", apps.len())?;
    Ok(apps.len())
}

/// `check`: parse the file and report registry inconsistencies.
///
/// Returns the number of problems found.
pub fn check(out: &mut impl Write, config: &AuthConfig) -> Result<usize> {
    let path = credentials_path(config)?;
    let registry = admin(config)?
        .load_from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let problems = registry.inconsistencies();
    for problem in &problems {
        match problem {
            Inconsistency::KeyMismatch { map_key, record_key } => writeln!(
                out,
                "entry `{}` holds a record with key `{}`",
                map_key, record_key
            )?,
            Inconsistency::IdNotBelowNext { key, id, next_id } => writeln!(
                out,
                "app `{}` has id {} but the next id is {}",
                key, id, next_id
            )?,
        }
    }
    writeln!(
        out,
        "{}: {} app(s), next id {}, {} problem(s)",
        path.display(),
        registry.len(),
        registry.next_id(),
        problems.len()
    )?;
    Ok(problems.len())
}

/// `watch`: install the credentials into a hook table, reload on SIGHUP and
/// run until Ctrl-C.
pub async fn run_watch(config: &AuthConfig) -> Result<()> {
    let hooks = Arc::new(HookTable::new(DefaultPolicy::Allow));
    let controller = ReloadController::new(
        config.credentials_path.clone(),
        JsonFileStore::new(),
        hooks.clone(),
    )
    .with_metrics(hooks.metrics().clone());

    controller
        .install_initial()
        .context("failed to load credentials")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reload, task) = controller.spawn(shutdown_rx.clone());

    if config.reload_on_sighup {
        arm_sighup(reload, shutdown_rx)?;
    }

    info!("Watching credentials. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    shutdown_tx.send(true).ok();
    task.await.context("reload controller panicked")?;

    let metrics = hooks.metrics().snapshot();
    info!(
        reloads_succeeded = metrics.reloads_succeeded,
        reloads_failed = metrics.reloads_failed,
        "Stopped"
    );
    Ok(())
}

#[cfg(unix)]
fn arm_sighup(reload: ReloadHandle, shutdown: watch::Receiver<bool>) -> Result<()> {
    broker_auth::spawn_sighup_listener(reload, shutdown)
        .context("failed to install SIGHUP handler")?;
    Ok(())
}

#[cfg(not(unix))]
fn arm_sighup(_reload: ReloadHandle, _shutdown: watch::Receiver<bool>) -> Result<()> {
    tracing::warn!("SIGHUP reload is not available on this platform");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AuthConfig {
        AuthConfig {
            credentials_path: Some(dir.path().join("auth.json")),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_then_remove() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut out = Vec::new();

        let app = add_app(&mut out, &config, "acme".into(), Some("acme".into()), None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("created app [acme - acme]"));
        assert!(text.contains(&app.secret));

        let mut out = Vec::new();
        remove_app(&mut out, &config, "acme").unwrap();
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("[rmapp] removed app [acme - acme]"));

        let mut out = Vec::new();
        assert!(remove_app(&mut out, &config, "acme").unwrap().is_none());
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("no app with key `acme` removed"));
    }

    #[test]
    fn test_duplicate_add_fails() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut out = Vec::new();

        add_app(&mut out, &config, "acme".into(), Some("acme".into()), None).unwrap();
        let err =
            add_app(&mut out, &config, "again".into(), Some("acme".into()), None).unwrap_err();
        assert!(format!("{:#}", err).contains("already exists"));
    }

    #[test]
    fn test_list_hides_secrets() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut sink = Vec::new();
        let app =
            add_app(&mut sink, &config, "acme".into(), None, Some("topsecret".into())).unwrap();

        let mut out = Vec::new();
        assert_eq!(list_apps(&mut out, &config).unwrap(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&app.key));
        assert!(!text.contains("topsecret"));
    }

    #[test]
    fn test_check_reports_problems() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::write(
            config.credentials_path.as_ref().unwrap(),
            r#"{"idx": 1000, "apps": {"a": {"name": "a", "id": 1000, "key": "b", "secret": "s"}}}"#,
        )
        .unwrap();

        let mut out = Vec::new();
        assert_eq!(check(&mut out, &config).unwrap(), 2);
    }

    #[test]
    fn test_zero_key_length_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = AuthConfig {
            key_length: 0,
            ..config_in(&dir)
        };
        let mut out = Vec::new();

        assert!(add_app(&mut out, &config, "acme".into(), None, None).is_err());
        assert!(!config.credentials_path.as_ref().unwrap().exists());
    }

    #[test]
    fn test_missing_path_is_reported() {
        let config = AuthConfig::default();
        let mut out = Vec::new();
        assert!(list_apps(&mut out, &config).is_err());
    }
}
