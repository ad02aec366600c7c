use anyhow::{Result, bail};
use chrono::{DateTime, Local};

use sts_core::session::SessionStats;

use super::Context;

fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

pub async fn list(ctx: &Context, limit: usize) -> Result<()> {
    let app = ctx.open().await?;
    let store = app.store();
    let sessions = store.get_recent_sessions(limit);
    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }

    let active = store.active_session_id();
    for session in sessions {
        let stats = SessionStats::compute(&session, None);
        let marker = if active.as_deref() == Some(session.session_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}  {}  {}/{} voiced  v{}  {}",
            marker,
            session.session_id,
            if session.screenplay_name.is_empty() {
                "(untitled)"
            } else {
                session.screenplay_name.as_str()
            },
            stats.assigned,
            stats.total,
            session.version_id,
            format_timestamp(session.last_updated)
        );
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let app = ctx.open().await?;
    let Some(session) = app.store().session(id) else {
        bail!("Session not found: {}", id);
    };
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

pub async fn delete(ctx: &Context, id: &str) -> Result<()> {
    let app = ctx.open().await?;
    if !app.store().delete_session(id) {
        bail!("Session not found: {}", id);
    }
    app.persist().await?;
    println!("Deleted session {}", id);
    Ok(())
}

pub async fn prune(ctx: &Context) -> Result<()> {
    let app = ctx.open().await?;
    app.persist().await?;
    let retention = app.persistence().retention();
    println!(
        "{} session(s) kept (max {}, max age {}h)",
        app.store().sessions().len(),
        retention.max_sessions,
        ctx.config.max_session_age_hours
    );
    Ok(())
}
