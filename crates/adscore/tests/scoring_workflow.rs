use adscore::scoring::{
    ClampPolicy, MatchFormula, ScoreRejection, ScoreRequest, ScoringConfig, ScoringEngine,
};
use adscore::sources::{DataSnapshot, SourceLoader};
use adscore::taxonomy::AdType;
use std::io::Cursor;

const POPULATION: &str = "\
respondent,短视频类–情感关系联结,短视频类–城市公共空间,图文类–温馨感动
r1,0.9,0.2,0.6
r2,0.7,,0.4
r3,0.8,0.4,
";

const CONTENT: &str = "\
广告类型,情感关系联结,城市公共空间,温馨感动
短视频类,0.6,0.5,
图文类,0.3,0.1,0.9
";

fn loaded_snapshot() -> DataSnapshot {
    SourceLoader::from_readers(Cursor::new(POPULATION), Cursor::new(CONTENT))
        .expect("fixture sources load")
}

fn request_from_json(body: serde_json::Value) -> ScoreRequest {
    serde_json::from_value(body).expect("request payload parses")
}

#[test]
fn short_video_theme_with_missing_preference_scores_neutral() {
    let request = request_from_json(serde_json::json!({
        "ad_type": "短视频类",
        "base_score": 100,
        "alpha": 0.5,
        "dimensions": { "主题": [ { "tag": "情感关系联结", "weight": 1.0 } ] }
    }));
    let engine = ScoringEngine::new(ScoringConfig {
        formula: MatchFormula::Preference,
        ..ScoringConfig::default()
    });

    let outcome = engine
        .score(&DataSnapshot::empty(), &request)
        .expect("request scores");

    assert_eq!(outcome.breakdown.match_value, 0.5);
    assert_eq!(outcome.breakdown.k, 1.0);
    assert!((outcome.breakdown.final_percent() - 100.0).abs() < 1e-9);
    assert!(outcome.used_default());
    assert_eq!(outcome.ad_type, AdType::ShortVideo);
}

#[test]
fn each_formula_reads_its_own_table() {
    let snapshot = loaded_snapshot();
    let request = ScoreRequest::new("短视频类")
        .with_selection("主题", "情感关系联结", 0.5)
        .with_selection("场景", "城市公共空间", 1.0);

    let score_with = |formula| {
        ScoringEngine::new(ScoringConfig {
            formula,
            ..ScoringConfig::default()
        })
        .score(&snapshot, &request)
        .expect("request scores")
        .breakdown
        .match_value
    };

    // expression: (0.6×0.5 + 0.5×1.0) / 2 dimensions
    assert!((score_with(MatchFormula::Expression) - 0.4).abs() < 1e-12);
    // preference means: 0.8 and 0.3
    assert!((score_with(MatchFormula::Preference) - (0.8 * 0.5 + 0.3) / 2.0).abs() < 1e-12);
    // blended: per-dimension weighted average of preference × expression
    let blended = (0.8 * 0.6 + 0.3 * 0.5) / 2.0;
    assert!((score_with(MatchFormula::Blended) - blended).abs() < 1e-12);
}

#[test]
fn unparsable_expression_cells_fall_back_to_half() {
    let snapshot = loaded_snapshot();
    assert_eq!(snapshot.expression("短视频类", "温馨感动"), Some(0.5));
    assert_eq!(snapshot.preference("图文类", "温馨感动"), Some(0.5));
    assert_eq!(snapshot.preferences().get("respondent"), None);
}

#[test]
fn unit_clamp_caps_final_score() {
    let engine = ScoringEngine::new(ScoringConfig {
        clamp: ClampPolicy::Unit,
        ..ScoringConfig::default()
    });
    let request = ScoreRequest::new("图文类")
        .with_alpha(1.0)
        .with_selection("情绪唤起", "温馨感动", 4.0);

    let outcome = engine
        .score(&loaded_snapshot(), &request)
        .expect("request scores");
    assert!((outcome.breakdown.match_value - 3.6).abs() < 1e-12);
    assert!(outcome.breakdown.k > 1.0);
    assert_eq!(outcome.breakdown.final_percent(), 100.0);
    assert!(outcome.breakdown.clamped);
}

#[test]
fn missing_ad_type_and_empty_dimensions_are_rejected() {
    let engine = ScoringEngine::default();
    let snapshot = loaded_snapshot();

    let missing = request_from_json(serde_json::json!({
        "dimensions": { "主题": [ { "tag": "情感关系联结", "weight": 1.0 } ] }
    }));
    let error = engine.score(&snapshot, &missing).expect_err("no ad type");
    assert_eq!(error, ScoreRejection::MissingAdType);
    assert!(error.to_string().contains("ad type"));

    let empty = request_from_json(serde_json::json!({
        "ad_type": "短视频类",
        "dimensions": { "主题": [], "场景": [] }
    }));
    let error = engine.score(&snapshot, &empty).expect_err("no tags");
    assert_eq!(error, ScoreRejection::NoTagsSelected);
    assert!(error.to_string().contains("tag"));
}

#[test]
fn derivation_trace_lists_each_dimension() {
    let request = ScoreRequest::new("短视频类")
        .with_selection("场景", "城市公共空间", 1.0)
        .with_selection("主题", "情感关系联结", 0.5);

    let outcome = ScoringEngine::default()
        .score(&loaded_snapshot(), &request)
        .expect("request scores");

    assert_eq!(
        outcome.formula_detail(),
        "主题: 情感关系联结(value:0.600×weight:0.50) = 0.300\n\
         场景: 城市公共空间(value:0.500×weight:1.00) = 0.500\n"
    );
}
