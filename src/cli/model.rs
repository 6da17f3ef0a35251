//! Exists and delete command handlers.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::di::FromRef;
use crate::services::SyncService;

use super::App;

impl App {
    pub async fn run_exists(&self, config: Config, tag: &str) -> Result<()> {
        let ctx = Context::connect(config).await?;
        let exists = SyncService::from_ref(&ctx).exists(tag).await?;
        println!("{}: {}", tag, if exists { "present" } else { "absent" });
        Ok(())
    }

    pub async fn run_delete(&self, config: Config, tag: &str) -> Result<()> {
        let ctx = Context::connect(config).await?;
        SyncService::from_ref(&ctx).delete(tag).await?;
        tracing::info!(tag, "Deleted model");
        println!("Deleted {}", tag);
        Ok(())
    }
}
