//! PostgreSQL-backed tests. They need `DATABASE_URL` and are ignored by
//! default: run with `cargo test -p fonteval-db -- --ignored`.

use fonteval_core::prompts::PromptCatalog;
use fonteval_core::rating::RatingRecord;
use fonteval_core::score::Score;
use fonteval_db::models::font_score::{ClientMetadata, CreateFontScore};
use fonteval_db::pg_store::PgFeedbackStore;
use fonteval_db::repositories::FontScoreRepo;
use fonteval_db::FeedbackStore;
use sqlx::PgPool;

fn record(user: &str, prompt: &str, key: &str, score: Score, reason: &str) -> RatingRecord {
    RatingRecord {
        prompt_id: None,
        prompt_name: prompt.into(),
        font_key: key.into(),
        family_name: format!("Family {key}"),
        score,
        reason: reason.into(),
        username: user.into(),
        email: String::new(),
        timestamp: chrono::Utc::now(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn test_health_check(pool: PgPool) {
    fonteval_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn test_upsert_keeps_one_row_per_slot(pool: PgPool) {
    let store = PgFeedbackStore::new(pool.clone(), PromptCatalog::default());
    let r = record("alice", "fonts from helvetica", "k1", Score::GoodMatch, "");

    assert!(store.upsert(&r).await.unwrap().is_new);
    assert!(!store.upsert(&r).await.unwrap().is_new);

    let rerated = record("alice", "fonts from helvetica", "k1", Score::BadMatch, "too narrow");
    store.upsert(&rerated).await.unwrap();

    let feedback = store.list_for_user("alice").await.unwrap();
    let ratings = &feedback["fonts from helvetica"];
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].score, Score::BadMatch);
    assert_eq!(ratings[0].reason, "too narrow");
    assert_eq!(ratings[0].prompt_id, Some(1));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn test_reads_are_partitioned_by_user(pool: PgPool) {
    let store = PgFeedbackStore::new(pool, PromptCatalog::default());
    store
        .upsert(&record("alice", "p", "k1", Score::GoodMatch, ""))
        .await
        .unwrap();
    store
        .upsert(&record("bob", "p", "k2", Score::AverageMatch, "ok-ish"))
        .await
        .unwrap();

    let bob = store.list_for_user("bob").await.unwrap();
    assert_eq!(bob["p"].len(), 1);
    assert_eq!(bob["p"][0].font_key, "k2");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn test_delete_prompt_scoped_to_user(pool: PgPool) {
    let store = PgFeedbackStore::new(pool, PromptCatalog::default());
    store.upsert(&record("alice", "p", "k1", Score::GoodMatch, "")).await.unwrap();
    store.upsert(&record("alice", "p", "k2", Score::GoodMatch, "")).await.unwrap();
    store.upsert(&record("bob", "p", "k1", Score::GoodMatch, "")).await.unwrap();

    assert_eq!(store.delete_prompt("alice", "p").await.unwrap(), 2);
    assert!(store.list_for_user("alice").await.unwrap().is_empty());
    assert_eq!(store.list_for_user("bob").await.unwrap()["p"].len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn test_delete_by_id_requires_owner(pool: PgPool) {
    let input = CreateFontScore {
        prompt: "p".into(),
        font_family: "Gotham".into(),
        font_style: Some("Book".into()),
        font_md5: "g1".into(),
        foundry: Some("Hoefler".into()),
        score: "good".into(),
        reason: None,
        username: "alice".into(),
        font_data: None,
        user_session: Some("s-1".into()),
        screen_resolution: Some("1920x1080".into()),
        timezone: Some("Europe/Berlin".into()),
    };
    let meta = ClientMetadata {
        ip_address: Some("127.0.0.1".into()),
        user_agent: Some("tests".into()),
    };
    let (row, inserted) = FontScoreRepo::upsert(&pool, &input, &meta).await.unwrap();
    assert!(inserted);
    assert_eq!(row.ip_address.as_deref(), Some("127.0.0.1"));

    assert!(!FontScoreRepo::delete_by_id(&pool, "bob", row.id).await.unwrap());
    assert!(FontScoreRepo::delete_by_id(&pool, "alice", row.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn test_stats(pool: PgPool) {
    let store = PgFeedbackStore::new(pool.clone(), PromptCatalog::default());
    store.upsert(&record("alice", "p", "k1", Score::GoodMatch, "")).await.unwrap();
    store.upsert(&record("alice", "p", "k2", Score::BadMatch, "no")).await.unwrap();
    store.upsert(&record("alice", "q", "k1", Score::GoodMatch, "")).await.unwrap();
    store.upsert(&record("bob", "p", "k9", Score::GoodMatch, "")).await.unwrap();

    let stats = FontScoreRepo::stats(&pool, "alice").await.unwrap();
    assert_eq!(stats.total_scores, 3);
    assert_eq!(stats.unique_prompts, 2);
    assert_eq!(stats.unique_fonts, 2);
    let good = stats
        .score_distribution
        .iter()
        .find(|b| b.score == "good")
        .unwrap();
    assert_eq!(good.count, 2);
    assert_eq!(stats.recent_scores.len(), 3);
}
