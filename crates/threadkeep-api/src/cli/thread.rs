//! Local thread commands: print, inspect and clear a thread's messages.

use crate::state::AppState;

/// Print every message of a thread as a JSON array.
pub async fn print_messages(state: &AppState, thread_id: &str) -> anyhow::Result<()> {
    let handle = state.locator.resolve(thread_id).await?;
    let messages = handle.get_messages().await?;

    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}

/// Show message count and the storage unit's file path.
pub async fn inspect_thread(state: &AppState, thread_id: &str, json: bool) -> anyhow::Result<()> {
    let path = state.locator.factory().unit_path(thread_id);
    let handle = state.locator.resolve(thread_id).await?;
    let count = handle.message_count().await?;

    if json {
        let info = serde_json::json!({
            "thread_id": thread_id,
            "message_count": count,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", console::style("Thread").bold(), console::style(thread_id).cyan());
    println!("  {:<10} {}", console::style("Messages").dim(), count);
    println!("  {:<10} {}", console::style("File").dim(), path.display());
    println!();
    Ok(())
}

/// Empty a thread. The thread stays usable.
pub async fn clear_thread(
    state: &AppState,
    thread_id: &str,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let handle = state.locator.resolve(thread_id).await?;
    let removed = handle.message_count().await?;
    handle.clear().await?;

    tracing::info!(thread_id, removed, "cleared thread");

    if json {
        let out = serde_json::json!({ "thread_id": thread_id, "removed": removed });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if !quiet {
        println!(
            "  {} Cleared {} message(s) from '{}'",
            console::style("✓").green().bold(),
            removed,
            console::style(thread_id).cyan()
        );
    }
    Ok(())
}
