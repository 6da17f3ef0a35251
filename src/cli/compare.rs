//! Compare command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::di::FromRef;
use crate::models::SimilarityScore;
use crate::services::SimilarityService;

use super::App;

impl App {
    pub async fn run_compare(&self, config: Config, tag_a: &str, tag_b: &str) -> Result<()> {
        let ctx = Context::connect(config).await?;
        compare(&ctx, tag_a, tag_b).await
    }
}

/// Scores two stored models and prints the result.
pub(super) async fn compare(ctx: &Context, tag_a: &str, tag_b: &str) -> Result<()> {
    let result = SimilarityService::from_ref(ctx).score(tag_a, tag_b).await?;
    println!("{}", format_score(tag_a, tag_b, &result));
    Ok(())
}

fn format_score(tag_a: &str, tag_b: &str, result: &SimilarityScore) -> String {
    format!(
        "{} vs {}\n  structural: {:.4}\n  children:   {:.4}\n  score:      {:.4}",
        tag_a, tag_b, result.structural, result.children, result.score
    )
}
