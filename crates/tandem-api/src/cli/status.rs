//! `tandem status` -- storage counters at a glance.

use comfy_table::{Table, presets::UTF8_FULL};

use crate::state::AppState;

/// Print row counts for the main tables.
pub async fn status(state: &AppState) -> anyhow::Result<()> {
    let users: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db_pool.reader)
        .await?;
    let live_chats: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM chats WHERE status IN ('request_pending', 'active')",
    )
    .fetch_one(&state.db_pool.reader)
    .await?;
    let unread: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE is_read = 0")
        .fetch_one(&state.db_pool.reader)
        .await?;
    let active_bookings: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE status = 'active'")
            .fetch_one(&state.db_pool.reader)
            .await?;

    println!();
    println!(
        "  {} Tandem storage at {}",
        console::style("📊").bold(),
        console::style(state.data_dir.display()).cyan()
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Resource", "Count"]);
    table.add_row(vec!["Users".to_string(), users.0.to_string()]);
    table.add_row(vec!["Live chats".to_string(), live_chats.0.to_string()]);
    table.add_row(vec!["Unread notifications".to_string(), unread.0.to_string()]);
    table.add_row(vec!["Active bookings".to_string(), active_bookings.0.to_string()]);
    println!("{table}");

    Ok(())
}
