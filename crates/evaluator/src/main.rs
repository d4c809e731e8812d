use std::sync::Arc;

use anyhow::Context;
use fonteval_core::prompts::PromptCatalog;
use fonteval_core::types::Evaluator;
use fonteval_evaluator::config::EvaluatorConfig;
use fonteval_evaluator::preview::PreviewLoader;
use fonteval_evaluator::remote_store::HttpFeedbackStore;
use fonteval_evaluator::session::EvaluationSession;
use fonteval_recommend::client::RecommendationClient;
use fonteval_recommend::events::RecommendationEvent;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: fonteval-evaluator <username> <prompt-number|prompt-text>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fonteval_evaluator=info,fonteval_recommend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Arguments ---
    let mut args = std::env::args().skip(1);
    let username = args.next().context(USAGE)?;
    let prompt_arg = args.collect::<Vec<_>>().join(" ");
    anyhow::ensure!(!prompt_arg.trim().is_empty(), USAGE);

    let catalog = PromptCatalog::default();
    let prompt = match prompt_arg.trim().parse::<u32>() {
        Ok(id) => catalog
            .get(id)
            .with_context(|| format!("no prompt #{id}; the catalog has {}", catalog.len()))?
            .to_string(),
        Err(_) => prompt_arg,
    };

    // --- Configuration ---
    let config = EvaluatorConfig::from_env();
    tracing::info!(
        endpoint = %config.recommendation_endpoint,
        feedback_api = %config.feedback_api_url,
        "Loaded evaluator configuration",
    );

    // --- Session ---
    let store = Arc::new(HttpFeedbackStore::new(&config.feedback_api_url)?);
    let client =
        RecommendationClient::http(config.recommendation_endpoint.clone(), config.client_config());
    let session = EvaluationSession::new(Evaluator::new(username), catalog, client, store);

    let mut events = session.subscribe();
    let progress_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(RecommendationEvent::Progress { request_id, percent }) => {
                    tracing::info!(request_id, percent, "Loading recommendations");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress events skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let candidates = session
        .select_prompt(&prompt)
        .await
        .with_context(|| format!("loading recommendations for '{prompt}'"))?;
    progress_handle.abort();

    // --- Previews ---
    let previews = PreviewLoader::new(config.preview_config());
    let statuses =
        futures::future::join_all(candidates.iter().map(|c| previews.probe(c))).await;

    // --- Output ---
    let prompt_id = session
        .catalog()
        .prompt_id(&prompt)
        .map(|id| format!("#{id} "))
        .unwrap_or_default();
    println!("{prompt_id}{prompt}");
    println!();
    for (candidate, preview) in candidates.iter().zip(statuses) {
        let marker = if candidate.is_top_pick() { '*' } else { ' ' };
        println!(
            "{marker} {:>2}. {} {} ({}) key={} preview={:?}",
            candidate.rank,
            candidate.family_name,
            candidate.style_name,
            candidate.foundry_name,
            candidate.font_key(),
            preview,
        );
    }

    let summary = session.summary().await?;
    println!();
    println!(
        "rated {}/{} ({}%): good {} ({}%), average {} ({}%), bad {} ({}%)",
        summary.evaluated,
        summary.total_candidates,
        summary.progress_percent,
        summary.good.count,
        summary.good.percent,
        summary.average.count,
        summary.average.percent,
        summary.bad.count,
        summary.bad.percent,
    );
    for rating in &summary.ratings {
        let reason = if rating.record.reason.is_empty() {
            String::new()
        } else {
            format!(" ({})", rating.record.reason)
        };
        println!("  {} - {}{reason}", rating.record.family_name, rating.record.score);
    }

    Ok(())
}
