//! Integration tests for the pipeline.
//!
//! These tests verify that the dedup passes and filters work together the
//! way a generation run drives them.

use catalog::{Candidate, CollectionRecord, EnrichedResult, MediaType, MemberTitle};
use pipeline::filters::*;
use pipeline::{DedupIndex, Filter, FilterPipeline};
use sources::ExclusionSet;

fn lineage() -> ExclusionSet {
    let mut heat = MemberTitle::new("Heat", Some(1995));
    heat.external_id = Some("949".to_string());

    let root = CollectionRecord::new(1, "Crime", MediaType::Movie)
        .with_members(vec![heat, MemberTitle::new("Thief", Some(1981))]);
    let child = CollectionRecord::new(2, "Crime: 90s", MediaType::Movie)
        .with_parent(1)
        .with_members(vec![MemberTitle::new("Ronin", Some(1998))]);

    ExclusionSet::from_lineage(&[child, root])
}

/// Stand-in for the metadata backend: the TMDB id is derived from the title
fn enrich(candidate: &Candidate, rating: f32) -> EnrichedResult {
    let mut result = EnrichedResult::from_candidate(candidate);
    result.external_id = Some(match candidate.title.to_lowercase().as_str() {
        "heat (director's cut)" => "949".to_string(),
        "se7en" | "seven" => "807".to_string(),
        other => format!("id:{}", other),
    });
    result.rating = Some(rating);
    result
}

#[test]
fn test_generation_stages_together() {
    let exclusions = lineage();
    let filters = FilterPipeline::new()
        .add_filter(ExcludedTitleFilter)
        .add_filter(MinimumRatingFilter::new(7.0));
    let mut dedup = DedupIndex::new();

    let batch = vec![
        (Candidate::new("Ronin", Some(1998), MediaType::Movie), 7.3),
        (Candidate::new("Collateral", Some(2004), MediaType::Movie), 7.6),
        (Candidate::new("collateral", Some(2004), MediaType::Movie), 7.6),
        (Candidate::new("Heat (Director's Cut)", Some(1995), MediaType::Movie), 8.3),
        (Candidate::new("Se7en", Some(1995), MediaType::Movie), 8.4),
        (Candidate::new("Seven", Some(1995), MediaType::Movie), 8.4),
        (Candidate::new("Takers", Some(2010), MediaType::Movie), 6.2),
    ];

    let mut accepted = Vec::new();
    let mut enriched_calls = 0;
    for (candidate, rating) in batch {
        let key = candidate.key();
        if exclusions.contains_key(&key) || !dedup.first_sighting(&key) {
            continue;
        }
        enriched_calls += 1;
        let result = enrich(&candidate, rating);
        if filters.admits(&result, &exclusions) && dedup.try_accept(&result) {
            accepted.push(result);
        }
    }

    // Ronin and the second Collateral never reach enrichment
    assert_eq!(enriched_calls, 5);

    let titles: Vec<&str> = accepted.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Collateral", "Se7en"]);
    assert_eq!(dedup.accepted(), 2);

    for result in &accepted {
        assert!(!exclusions.contains_key(&result.key()));
        assert!(result.rating.is_some_and(|r| r >= 7.0));
    }
}

#[test]
fn test_filter_order_and_names() {
    let exclusions = lineage();
    let pipeline = FilterPipeline::for_generation(Some(7.5));
    assert_eq!(pipeline.len(), 2);

    let results: Vec<EnrichedResult> = [("Heat", 8.3), ("Manhunter", 7.2), ("Miami Vice", 6.0), ("Public Enemies", 7.6)]
        .iter()
        .map(|(title, rating)| enrich(&Candidate::new(*title, None, MediaType::Movie), *rating))
        .collect();

    let admitted: Vec<&str> = results
        .iter()
        .filter(|r| pipeline.admits(r, &exclusions))
        .map(|r| r.title.as_str())
        .collect();

    assert_eq!(admitted, vec!["Public Enemies"]);
    assert!(!ExcludedTitleFilter.keep(&results[0], &exclusions));
    assert_eq!(MinimumRatingFilter::new(7.5).name(), "MinimumRatingFilter");
}
