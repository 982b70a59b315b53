use crate::infra::{parse_selection, SelectionArg};
use adscore::config::AppConfig;
use adscore::error::AppError;
use adscore::scoring::{
    MatchFormula, ScoreOutcome, ScoreRequest, ScoringEngine, DEFAULT_ALPHA, DEFAULT_BASE_SCORE,
};
use adscore::sources::{DataSnapshot, SourceLoader};
use adscore::taxonomy::AdType;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct TaxonomyArgs {
    /// Only print this ad type (e.g. 短视频类)
    #[arg(long)]
    pub(crate) ad_type: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Ad type label, e.g. 短视频类
    #[arg(long)]
    pub(crate) ad_type: String,
    /// Tag selection as DIMENSION=TAG[:WEIGHT]; repeat for more tags
    #[arg(long = "select", value_parser = parse_selection, required = true)]
    pub(crate) selections: Vec<SelectionArg>,
    /// Base score as a percentage
    #[arg(long, default_value_t = DEFAULT_BASE_SCORE)]
    pub(crate) base_score: f64,
    /// Sensitivity of the final score to the match value
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub(crate) alpha: f64,
    /// Override the configured match formula (expression, preference, blended)
    #[arg(long)]
    pub(crate) formula: Option<MatchFormula>,
    /// Directory containing the population and content CSV files
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) fn run_taxonomy(args: TaxonomyArgs) -> Result<(), AppError> {
    let ad_types: Vec<AdType> = match args.ad_type.as_deref() {
        Some(label) => match AdType::from_label(label) {
            Some(ad_type) => vec![ad_type],
            None => {
                println!("Unknown ad type: {label}");
                return Ok(());
            }
        },
        None => AdType::ordered().to_vec(),
    };

    for ad_type in ad_types {
        if !ad_type.has_taxonomy() {
            println!("{ad_type} (catalogue only, not scorable)");
            continue;
        }
        println!("{ad_type}");
        for spec in ad_type.dimension_specs() {
            println!("  {}: {}", spec.name, spec.tags.join(", "));
        }
    }
    Ok(())
}

fn build_request(args: &ScoreArgs) -> ScoreRequest {
    args.selections.iter().fold(
        ScoreRequest::new(args.ad_type.clone())
            .with_base_score(args.base_score)
            .with_alpha(args.alpha),
        |request, SelectionArg { dimension, selection }| {
            request.with_selection(dimension.clone(), selection.tag.clone(), selection.weight)
        },
    )
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = args.data_dir.clone() {
        config.data.dir = dir;
    }
    if let Some(formula) = args.formula {
        config.scoring.formula = formula;
    }

    let paths = config.data.source_paths();
    let snapshot = match SourceLoader::from_paths(&paths) {
        Ok(snapshot) => {
            println!("Data source: {}", config.scoring.formula.data_source());
            snapshot
        }
        Err(err) => {
            println!(
                "Data source: default lookup value {} ({err})",
                config.scoring.default_value
            );
            DataSnapshot::empty()
        }
    };

    let engine = ScoringEngine::new(config.scoring);
    let outcome = engine.score(&snapshot, &build_request(&args))?;
    render_outcome(&outcome);
    Ok(())
}

fn render_outcome(outcome: &ScoreOutcome) {
    let breakdown = &outcome.breakdown;
    println!("Ad type: {} (formula: {})", outcome.ad_type, outcome.formula);
    println!("\nDerivation");
    print!("{}", outcome.formula_detail());
    if outcome.used_default() {
        println!("(* default value used for missing lookup)");
    }
    println!("\nBase score:  {:.2}", breakdown.base_percent());
    println!("Match value: {:.4}", breakdown.match_value);
    println!("k:           {:.4}", breakdown.k);
    println!("Final score: {:.2}", breakdown.final_percent());
    if breakdown.clamped {
        println!("(final score clamped to 0-100)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::scratch_dir;
    use adscore::scoring::{ScoreRejection, TagSelection};

    #[test]
    fn request_collects_selections_by_dimension() {
        let args = ScoreArgs {
            ad_type: "中长视频类".to_string(),
            selections: vec![
                parse_selection("主题=情感关系联结:0.6").expect("selection"),
                parse_selection("主题=社会洞察关怀:0.4").expect("selection"),
                parse_selection("调性=温暖治愈").expect("selection"),
            ],
            base_score: 90.0,
            alpha: 0.8,
            formula: None,
            data_dir: None,
        };

        let request = build_request(&args);
        assert_eq!(request.ad_type.as_deref(), Some("中长视频类"));
        assert_eq!(request.base_score, 90.0);
        assert_eq!(request.alpha, 0.8);
        assert_eq!(request.dimensions.get("主题").map(<[_]>::len), Some(2));
        assert_eq!(
            request.dimensions.get("调性"),
            Some([TagSelection::new("温暖治愈", 1.0)].as_slice())
        );
    }

    #[test]
    fn rejected_requests_fail_the_command() {
        let args = ScoreArgs {
            ad_type: "电视类".to_string(),
            selections: vec![parse_selection("主题=情感关系联结").expect("selection")],
            base_score: DEFAULT_BASE_SCORE,
            alpha: DEFAULT_ALPHA,
            formula: None,
            data_dir: Some(scratch_dir()),
        };

        let error = run_score(args).expect_err("unknown ad type");
        assert!(matches!(
            error,
            AppError::Score(ScoreRejection::UnknownAdType(_))
        ));
        assert!(error.to_string().contains("电视类"));
    }
}
