use anyhow::Result;
use cadence_core::store::TaskStore;

use crate::cli::ShowCommand;
use crate::util::resolve_task;
use crate::views::table::display_task_details;

pub async fn show_task(store: &impl TaskStore, command: ShowCommand) -> Result<()> {
    let task = resolve_task(store, &command.id).await?;
    display_task_details(&task);
    Ok(())
}
