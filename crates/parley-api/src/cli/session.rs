//! Store-only CLI commands: history, sessions, clear.
//!
//! These talk to the session store directly and never need a model API key.

use anyhow::{Result, bail};
use console::style;

use parley_core::chat::session::normalize_session_id;
use parley_core::chat::store::SessionStore;
use parley_infra::store::SessionBackend;
use parley_types::chat::{ChatMessage, ChatRole};

/// Print the messages of one session in chronological order.
///
/// # Examples
///
/// ```bash
/// parley history session_3f1c..._1718000000000
/// parley history widget-1 --json
/// ```
pub async fn show_history(store: &SessionBackend, session_id: &str, json: bool) -> Result<()> {
    let session_id = require_session_id(session_id)?;
    let messages = store
        .find_session(session_id)
        .await
        .inspect_err(|e| {
            tracing::error!(session_id, operation = "history", error = %e, "Failed to load session");
        })?
        .map(|s| s.messages)
        .unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No messages in session '{}'",
            style("i").blue().bold(),
            style(session_id).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    for message in &messages {
        print_message(message);
    }
    println!();
    Ok(())
}

/// Trim an id given on the command line; blank or over-long ids are rejected.
fn require_session_id(raw: &str) -> Result<&str> {
    match normalize_session_id(Some(raw))? {
        Some(id) => Ok(id),
        None => bail!("Session ID must not be blank"),
    }
}

fn print_message(message: &ChatMessage) {
    let time = message.timestamp.format("%Y-%m-%d %H:%M:%S");
    let who = match message.role {
        ChatRole::User => style("you").green().bold(),
        ChatRole::Assistant => style("assistant").magenta().bold(),
    };
    println!("  {} {}", style(time).dim(), who);
    for line in message.content.lines() {
        println!("    {line}");
    }
}

/// List session summaries, most recently updated first.
pub async fn list_sessions(store: &SessionBackend, json: bool) -> Result<()> {
    let summaries = store.list_summaries().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!();
        println!("  {} No sessions stored yet", style("i").blue().bold());
        println!();
        return Ok(());
    }

    println!();
    for summary in &summaries {
        println!(
            "  {}  {} messages  {}",
            style(&summary.session_id).cyan(),
            summary.message_count,
            style(format!(
                "updated {}",
                summary.updated_at.format("%Y-%m-%d %H:%M")
            ))
            .dim()
        );
    }
    println!();
    Ok(())
}

/// Delete one session, or every session when `session_id` is `None`.
pub async fn clear(store: &SessionBackend, session_id: Option<&str>, json: bool) -> Result<()> {
    let session_id = session_id.map(require_session_id).transpose()?;
    let removed = match session_id {
        Some(id) => store.delete_session(id).await.map(u64::from),
        None => store.delete_all().await,
    }
    .inspect_err(|e| {
        tracing::error!(session_id = ?session_id, operation = "clear", error = %e, "Failed to clear sessions");
    })?;
    tracing::info!(session_id = ?session_id, removed, "Cleared sessions from CLI");

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!();
        println!(
            "  {} Removed {} session{}",
            style("✓").green().bold(),
            removed,
            if removed == 1 { "" } else { "s" }
        );
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_infra::memory::MemorySessionStore;

    async fn seeded() -> SessionBackend {
        let store = SessionBackend::Memory(MemorySessionStore::new());
        store
            .append_messages(
                "s1",
                &[ChatMessage::user("hi"), ChatMessage::assistant("hello")],
                Utc::now(),
            )
            .await
            .unwrap();
        store
            .append_messages("s2", &[ChatMessage::user("yo")], Utc::now())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_clear_single_session() {
        let store = seeded().await;
        clear(&store, Some("s1"), true).await.unwrap();
        assert!(store.find_session("s1").await.unwrap().is_none());
        assert!(store.find_session("s2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_all_sessions() {
        let store = seeded().await;
        clear(&store, None, true).await.unwrap();
        assert!(store.list_summaries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_trims_session_id() {
        let store = seeded().await;
        clear(&store, Some("  s1 "), true).await.unwrap();
        assert!(store.find_session("s1").await.unwrap().is_none());
        assert!(store.find_session("s2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_blank_id_is_rejected_not_clear_all() {
        let store = seeded().await;
        let err = clear(&store, Some("   "), true).await.unwrap_err();
        assert!(err.to_string().contains("must not be blank"));
        assert_eq!(store.list_summaries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_overlong_session_id_is_rejected() {
        let store = seeded().await;
        let long_id = "x".repeat(129);

        let err = show_history(&store, &long_id, true).await.unwrap_err();
        assert!(err.to_string().contains("at most 128"));

        let err = clear(&store, Some(&long_id), true).await.unwrap_err();
        assert!(err.to_string().contains("at most 128"));
        assert_eq!(store.list_summaries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_history_trims_session_id() {
        let store = seeded().await;
        show_history(&store, " s1\t", true).await.unwrap();
        assert!(show_history(&store, "  ", true).await.is_err());
    }

    #[tokio::test]
    async fn test_history_and_list_succeed_for_unknown_session() {
        let store = SessionBackend::Memory(MemorySessionStore::new());
        show_history(&store, "ghost", false).await.unwrap();
        list_sessions(&store, true).await.unwrap();
    }
}
