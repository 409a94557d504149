use crate::OutputFormat;
use chatstore::config::{ChatStoreConfig, default_config_path, default_database_path, write_config};
use chatstore::ui::{self, Icons, message_line, providers_table, section, stats_table, success};
use chatstore::{BackendRegistry, ChatStore, Route, SessionLabels};
use std::path::Path;

pub fn run_init(store: &ChatStore<'_>, route: &Route) -> anyhow::Result<()> {
    let location = store.init_schema(route)?;
    success(&format!("Initialized chat history DB at: {}", location));
    Ok(())
}

pub fn run_append(store: &ChatStore<'_>, route: &Route, user: &str, role: &str, content: &str) -> anyhow::Result<()> {
    store.append_message(user, role, content, route)?;
    success(&format!("Saved {} message for {}", role, user));
    Ok(())
}

pub fn run_history(
    store: &ChatStore<'_>,
    route: &Route,
    user: &str,
    limit: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let history = store.get_history(user, limit, route)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        ui::warn(&format!("No messages for {}", user));
        return Ok(());
    }

    section(&format!("History for {} ({} messages)", user, history.len()));
    for message in &history {
        message_line(message);
    }
    Ok(())
}

pub fn run_session_show(store: &ChatStore<'_>, route: &Route, user: &str, format: OutputFormat) -> anyhow::Result<()> {
    let session = store.get_session_state(user, route)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    let missing = ui::dim("-");
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| missing.clone());
    let (state, incident_type, emotion, updated_at) = (
        show(&session.state),
        show(&session.incident_type),
        show(&session.emotion),
        show(&session.updated_at),
    );

    section(&format!("{} Session for {}", Icons::PERSON, session.user_id));
    println!(
        "{}",
        stats_table(&[
            ("state", state.as_str()),
            ("incident_type", incident_type.as_str()),
            ("emotion", emotion.as_str()),
            ("updated_at", updated_at.as_str()),
        ])
    );
    if session.is_empty() {
        ui::info("Note", "no session stored yet");
    }
    Ok(())
}

pub fn run_session_set(store: &ChatStore<'_>, route: &Route, user: &str, labels: &SessionLabels) -> anyhow::Result<()> {
    store.set_session_state(user, labels, route)?;
    success(&format!("Session state updated for {}", user));
    Ok(())
}

pub fn run_providers(registry: &BackendRegistry, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        let data = serde_json::json!({
            "default": registry.default_name(),
            "providers": registry.list(),
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    ui::header("Registered providers");
    println!("{}", providers_table(&registry.handles()));
    ui::summary_row("Default:", &registry.default_name());
    Ok(())
}

pub fn run_write_config(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let config = ChatStoreConfig {
        database: Some(default_database_path().display().to_string()),
        default_provider: None,
        providers: Default::default(),
    };
    write_config(&path, &config, force)?;
    success(&format!("Wrote config to {}", path.display()));
    Ok(())
}
