//! One-shot exchange from the command line.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Run one exchange and print the reply (or the whole outcome as JSON).
///
/// Ctrl+C cancels the model call; nothing is stored in that case.
pub async fn send_message(
    state: &AppState,
    session_id: Option<&str>,
    message: &str,
    json: bool,
) -> Result<()> {
    let cancel = state.shutdown.child_token();
    let outcome = tokio::select! {
        result = state.chat_service.handle_exchange(session_id, message, &cancel) => result?,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            anyhow::bail!("interrupted");
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    println!("  {}", outcome.assistant_message.content);
    println!();
    println!(
        "  {} {}",
        style("session").dim(),
        style(&outcome.session_id).cyan()
    );
    println!();
    Ok(())
}
