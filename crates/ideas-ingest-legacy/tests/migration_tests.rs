use ideas_ingest_legacy::legacy::{parse_detailed, parse_summary};
use ideas_ingest_legacy::transform::{DEFAULT_REQUIRED_SKILLS, DEFAULT_TARGET_AUDIENCE, SYSTEM_USER_ID};
use ideas_ingest_legacy::*;
use ideas_model::{BusinessModel, Category, IdeaStatus, InvestmentRange, MarketSize, TimeToStart};
use ideas_storage::{IdeaFilter, IdeaStore, StoreConfig, StoreError};
use proptest::prelude::*;

fn summary(id: u64, category: &str, investment: &str) -> SummaryIdea {
    SummaryIdea {
        id: Some(id),
        title: format!("Summary idea {id}"),
        description: Some("A short pitch".to_string()),
        category: Some(category.to_string()),
        investment_amount: Some(investment.to_string()),
        time_to_market: Some("1-2 years".to_string()),
        tags: vec!["wearables".to_string(), "clinics".to_string()],
        ..Default::default()
    }
}

fn detailed(id: u64, category: &str, investment: &str) -> DetailedIdea {
    DetailedIdea {
        id: Some(id),
        title: format!("Detailed idea {id}"),
        detailed_description: Some("A long pitch".to_string()),
        category: Some(category.to_string()),
        investment: Some(investment.to_string()),
        time_to_market: Some("1-2 years".to_string()),
        market_analysis: None,
        challenges: Some(TextOrList::List(vec![
            "Funding".to_string(),
            "Competition".to_string(),
        ])),
        tags: vec!["wearables".to_string()],
        ..Default::default()
    }
}

fn sample_batch() -> LegacyBatch {
    LegacyBatch {
        summary: vec![summary(1, "HealthTech", "₹1.2 Cr"), summary(2, "Fintech", "5L")],
        detailed: vec![detailed(101, "Agritech", "25 lakhs")],
    }
}

#[test]
fn test_healthtech_ai_startup_is_healthcare() {
    let got = normalize_category(Some("AI-powered healthtech startup"));
    assert_eq!(got.value, Category::Healthcare);
}

#[test]
fn test_one_point_two_crore_is_the_fifty_lakh_bucket() {
    assert_eq!(
        normalize_investment(Some("₹1.2 Cr")).value,
        InvestmentRange::FiftyLakhsToOneCrore
    );
}

#[test]
fn test_missing_time_to_market_defaults_to_three_to_six_months() {
    let mut record = summary(1, "Tech", "5L");
    record.time_to_market = None;
    let out = transform(&LegacyIdea::Summary(record));
    assert_eq!(out.idea.time_to_start, TimeToStart::ThreeToSixMonths);
    assert!(out.fallbacks.time_to_start);
}

#[test]
fn test_detailed_challenges_list_is_joined() {
    let out = transform(&LegacyIdea::Detailed(detailed(7, "Tech", "5L")));
    assert_eq!(out.idea.challenges, "Funding, Competition");
}

#[test]
fn test_both_shapes_agree_on_normalized_labels() {
    let s = transform(&LegacyIdea::Summary(summary(1, "Healthcare AI", "50 lakh")));
    let d = transform(&LegacyIdea::Detailed(detailed(2, "Healthcare AI", "50 lakh")));

    assert_eq!(s.idea.category, d.idea.category);
    assert_eq!(s.idea.investment_range, d.idea.investment_range);
    assert_eq!(s.idea.time_to_start, d.idea.time_to_start);
    assert_eq!(s.idea.market_size, d.idea.market_size);

    assert_eq!(s.idea.category, Category::Healthcare);
    assert_eq!(s.idea.investment_range, InvestmentRange::TwentyFiveToFiftyLakhs);
    assert_eq!(s.idea.market_size, MarketSize::Global);
}

#[test]
fn test_summary_records_get_placeholders() {
    let out = transform(&LegacyIdea::Summary(summary(3, "Food", "2L")));
    let idea = out.idea;
    assert_eq!(idea.original_id, Some(3));
    assert!(idea.is_static_idea);
    assert_eq!(idea.status, IdeaStatus::Published);
    assert_eq!(idea.uploaded_by, SYSTEM_USER_ID);
    assert_eq!(idea.business_model, BusinessModel::B2C);
    assert_eq!(idea.target_audience, DEFAULT_TARGET_AUDIENCE);
    assert_eq!(idea.required_skills, DEFAULT_REQUIRED_SKILLS);
    assert_eq!(idea.key_features, vec!["wearables", "clinics"]);
    assert!(idea.validate().is_ok());
}

#[test]
fn test_detailed_records_keep_their_own_fields() {
    let mut record = detailed(9, "Energy", "10 lakh");
    record.market_analysis = Some(MarketAnalysis {
        target_audience: Some("Rooftop owners".to_string()),
        market_size: Some("International".to_string()),
    });
    record.business_model = Some("SaaS".to_string());
    record.revenue_streams = Some(TextOrList::Text("Installation fees".to_string()));
    record.required_skills = Some(TextOrList::List(vec!["Electrical".to_string()]));
    record.views = Some(40);
    record.likes = Some(4);

    let idea = transform(&LegacyIdea::Detailed(record)).idea;
    assert_eq!(idea.target_audience, "Rooftop owners");
    assert_eq!(idea.market_size, MarketSize::International);
    assert_eq!(idea.business_model, BusinessModel::Subscription);
    assert_eq!(idea.revenue_streams, vec!["Installation fees"]);
    assert_eq!(idea.required_skills, vec!["Electrical"]);
    assert_eq!(idea.description, "A long pitch");
    assert_eq!((idea.views, idea.likes), (40, 4));
}

#[test]
fn test_key_features_are_capped_at_five_tags() {
    let mut record = summary(4, "Tech", "5L");
    record.tags = (0..8).map(|i| format!("tag {i}")).collect();
    let idea = transform(&LegacyIdea::Summary(record)).idea;
    assert_eq!(idea.key_features.len(), 5);
    assert_eq!(idea.tags.len(), 8);
}

#[tokio::test]
async fn test_empty_tags_are_rejected_by_the_store() {
    let mut record = summary(5, "Tech", "5L");
    record.tags.clear();
    let idea = transform(&LegacyIdea::Summary(record)).idea;
    assert!(idea.key_features.is_empty());

    let store = IdeaStore::connect(StoreConfig::in_memory()).await.unwrap();
    let err = store.insert_ideas(vec![idea]).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidBatchRecord { index: 0, .. }));
    assert_eq!(store.count_ideas(&IdeaFilter::default()), 0);
}

#[tokio::test]
async fn test_invalid_record_fails_the_run_and_keeps_previous_ideas() {
    let store = IdeaStore::connect(StoreConfig::in_memory()).await.unwrap();
    run_migration(&store, &sample_batch()).await.unwrap();

    let mut broken = sample_batch();
    broken.detailed[0].tags.clear();
    let err = run_migration(&store, &broken).await.unwrap_err();
    assert!(matches!(err, MigrationError::InvalidRecord { index: 2, .. }));
    assert!(!err.is_connection());
    assert_eq!(store.count_ideas(&IdeaFilter::static_ideas()), 3);
}

#[tokio::test]
async fn test_repeated_original_id_fails_the_run() {
    let store = IdeaStore::connect(StoreConfig::in_memory()).await.unwrap();
    let mut batch = sample_batch();
    batch.detailed[0].id = Some(1);

    let err = run_migration(&store, &batch).await.unwrap_err();
    assert!(matches!(err, MigrationError::DuplicateOriginalId(1)));
    assert_eq!(store.count_ideas(&IdeaFilter::default()), 0);
}

#[tokio::test]
async fn test_migration_is_idempotent() {
    let store = IdeaStore::connect(StoreConfig::in_memory()).await.unwrap();

    let first = run_migration(&store, &sample_batch()).await.unwrap();
    assert_eq!(first.deleted, 0);
    assert_eq!(first.inserted, 3);
    assert_eq!((first.summary_records, first.detailed_records), (2, 1));

    let second = run_migration(&store, &sample_batch()).await.unwrap();
    assert_eq!(second.deleted, 3);
    assert_eq!(second.inserted, 3);
    assert_eq!(store.count_ideas(&IdeaFilter::static_ideas()), 3);
}

#[tokio::test]
async fn test_migration_leaves_community_ideas_alone() {
    let store = IdeaStore::connect(StoreConfig::in_memory()).await.unwrap();
    let mut community = transform(&LegacyIdea::Summary(summary(50, "Tech", "5L"))).idea;
    community.original_id = None;
    community.is_static_idea = false;
    store.insert_idea(community).await.unwrap();

    run_migration(&store, &sample_batch()).await.unwrap();
    run_migration(&store, &sample_batch()).await.unwrap();
    assert_eq!(store.count_ideas(&IdeaFilter::default()), 4);
}

#[tokio::test]
async fn test_fallbacks_are_counted() {
    let store = IdeaStore::connect(StoreConfig::in_memory()).await.unwrap();
    let mut batch = sample_batch();
    batch.summary[1].category = Some("Something unheard of".to_string());
    batch.summary[1].investment_amount = None;

    let report = run_migration(&store, &batch).await.unwrap();
    assert_eq!(report.fallbacks.category, 1);
    assert_eq!(report.fallbacks.investment_range, 1);
    // no record in the batch carries a market size
    assert_eq!(report.fallbacks.market_size, 3);
}

#[tokio::test]
async fn test_files_on_disk_are_read_and_parse_errors_abort() {
    let dir = tempfile::tempdir().unwrap();
    let summary_path = dir.path().join("ideas.json");
    let detailed_path = dir.path().join("detailed.json");
    std::fs::write(
        &summary_path,
        r#"{ "1": { "title": "Tiffin service", "description": "Home food", "category": "Food",
                    "investmentAmount": "2L", "timeToMarket": "1 month", "tags": ["meals"] } }"#,
    )
    .unwrap();
    std::fs::write(&detailed_path, "[]").unwrap();

    let store = IdeaStore::connect(StoreConfig::in_memory()).await.unwrap();
    let files = LegacyFiles::new(&summary_path, &detailed_path);
    let report = run_migration(&store, &files).await.unwrap();
    assert_eq!(report.inserted, 1);

    std::fs::write(&detailed_path, "[{").unwrap();
    let err = run_migration(&store, &files).await.unwrap_err();
    assert!(matches!(err, MigrationError::Legacy(LegacyError::Parse { .. })));
    assert_eq!(store.count_ideas(&IdeaFilter::static_ideas()), 1);

    let missing = LegacyFiles::new(dir.path().join("nope.json"), &detailed_path);
    let err = run_migration(&store, &missing).await.unwrap_err();
    assert!(matches!(err, MigrationError::Legacy(LegacyError::Read { .. })));
}

#[test]
fn test_parsers_are_reexported_through_the_legacy_module() {
    assert!(parse_summary(b"{}").unwrap().is_empty());
    assert!(parse_detailed(b"[]").unwrap().is_empty());
}

proptest! {
    #[test]
    fn test_health_keyword_always_beats_technology(prefix in "[a-z ]{0,12}", suffix in "[a-z ]{0,12}") {
        let input = format!("{prefix}ai health software{suffix}");
        prop_assert_eq!(normalize_category(Some(&input)).value, Category::Healthcare);
    }

    #[test]
    fn test_normalizers_are_deterministic(input in ".{0,40}") {
        prop_assert_eq!(normalize_category(Some(&input)), normalize_category(Some(&input)));
        prop_assert_eq!(normalize_investment(Some(&input)), normalize_investment(Some(&input)));
        prop_assert_eq!(normalize_timeline(Some(&input)), normalize_timeline(Some(&input)));
        prop_assert_eq!(normalize_market_size(Some(&input)), normalize_market_size(Some(&input)));
    }

    #[test]
    fn test_key_features_stay_within_bounds(tags in proptest::collection::vec("[a-z]{1,8}", 1..12)) {
        let record = SummaryIdea {
            id: Some(1),
            title: "t".to_string(),
            description: Some("d".to_string()),
            tags,
            ..Default::default()
        };
        let idea = transform(&LegacyIdea::Summary(record)).idea;
        prop_assert!(!idea.key_features.is_empty());
        prop_assert!(idea.key_features.len() <= 5);
    }
}
