// Property and scenario tests for the recommendation engine
//
// Covers the scoring bounds, eligibility filtering and the end-to-end
// generation scenarios against the in-memory store.

use lemoteur::{
    confidence, eligible_programs, EngineError, GradeAverage, LearnerProfile, MemoryStore,
    Program, RecommendationGenerator, RecommendationStatus, Track,
};
use proptest::prelude::*;

fn profile(id: i64, track: Track, avg: f64) -> LearnerProfile {
    LearnerProfile {
        id,
        track,
        grade_average: GradeAverage::new(avg).unwrap(),
    }
}

fn program(id: i64, track: Track, min: f64) -> Program {
    Program {
        id,
        name: format!("Program {}", id),
        required_track: track,
        minimum_average: GradeAverage::new(min).unwrap(),
    }
}

fn track_strategy() -> impl Strategy<Value = Track> {
    prop::sample::select(Track::ALL.to_vec())
}

fn grade_strategy() -> impl Strategy<Value = f64> {
    // Quarter-point grades keep the arithmetic exact.
    (300u32..=400).prop_map(|q| q as f64 / 4.0)
}

proptest! {
    #[test]
    fn confidence_stays_within_60_and_95(min in grade_strategy(), extra in 0u32..=100) {
        let avg = (min + extra as f64 / 4.0).min(100.0);
        let score = confidence(&profile(1, Track::Stem, avg), &program(1, Track::Stem, min));
        prop_assert!(score.value() >= 60.0);
        prop_assert!(score.value() <= 95.0);
    }

    #[test]
    fn exact_threshold_scores_60(min in grade_strategy()) {
        let score = confidence(&profile(1, Track::Abm, min), &program(1, Track::Abm, min));
        prop_assert_eq!(score.value(), 60.0);
    }

    #[test]
    fn confidence_is_monotonic_in_grade(min in grade_strategy(), a in 0u32..=100, b in 0u32..=100) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let avg_lo = (min + lo as f64 / 4.0).min(100.0);
        let avg_hi = (min + hi as f64 / 4.0).min(100.0);
        let p = program(1, Track::Humss, min);
        let s_lo = confidence(&profile(1, Track::Humss, avg_lo), &p);
        let s_hi = confidence(&profile(1, Track::Humss, avg_hi), &p);
        prop_assert!(s_lo.value() <= s_hi.value());
        if avg_hi - min >= 17.5 {
            prop_assert_eq!(s_hi.value(), 95.0);
        }
    }

    #[test]
    fn filter_excludes_mismatches_and_orders_descending(
        learner_track in track_strategy(),
        avg in grade_strategy(),
        catalog in prop::collection::vec((track_strategy(), grade_strategy()), 0..20),
    ) {
        let programs: Vec<Program> = catalog
            .iter()
            .enumerate()
            .map(|(i, (track, min))| program(i as i64, *track, *min))
            .collect();
        let learner = profile(1, learner_track, avg);
        let eligible = eligible_programs(&learner, &programs);

        for p in &eligible {
            prop_assert_eq!(p.required_track, learner_track);
            prop_assert!(p.minimum_average.value() <= avg);
        }
        for pair in eligible.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(a.minimum_average.value() >= b.minimum_average.value());
            if a.minimum_average == b.minimum_average {
                prop_assert!(a.id < b.id);
            }
        }
        let expected = programs
            .iter()
            .filter(|p| p.required_track == learner_track && p.minimum_average.value() <= avg)
            .count();
        prop_assert_eq!(eligible.len(), expected);
    }
}

#[test]
fn scenario_a_stem_learner_gets_single_recommendation() {
    let mut store = MemoryStore::new();
    store.add_profile(profile(1, Track::Stem, 90.0));
    store.add_program(program(1, Track::Stem, 75.0));
    store.add_program(program(2, Track::Stem, 92.0));
    store.add_program(program(3, Track::Abm, 80.0));

    let report = RecommendationGenerator::new(&mut store).generate(1).unwrap();
    assert_eq!(report.count, 1);
    assert_eq!(report.recommendations[0].course_id, 1);
    // 60 + (90 - 75) * 2
    assert_eq!(report.recommendations[0].confidence_score.value(), 90.0);
}

#[test]
fn scenario_b_exact_threshold_scores_base() {
    let mut store = MemoryStore::new();
    store.add_profile(profile(1, Track::Humss, 80.0));
    store.add_program(program(1, Track::Humss, 80.0));

    let report = RecommendationGenerator::new(&mut store).generate(1).unwrap();
    assert_eq!(report.count, 1);
    assert_eq!(report.recommendations[0].confidence_score.value(), 60.0);
    assert_eq!(
        store.recommendations()[0].reasoning,
        "Student meets requirements with GWA of 80 (required: 80) and matching strand (HUMSS)."
    );
}

#[test]
fn scenario_c_no_eligible_programs_is_reported() {
    let mut store = MemoryStore::new();
    store.add_profile(profile(1, Track::Tvl, 76.0));
    store.add_program(program(1, Track::Stem, 75.0));

    let err = RecommendationGenerator::new(&mut store).generate(1).unwrap_err();
    assert_eq!(err, EngineError::NoEligiblePrograms { profile_id: 1 });
    assert!(store.recommendations().is_empty());
}

#[test]
fn scenario_d_repeated_generation_duplicates_pending_records() {
    let mut store = MemoryStore::new();
    store.add_profile(profile(1, Track::Stem, 88.0));
    store.add_program(program(1, Track::Stem, 75.0));
    store.add_program(program(2, Track::Stem, 85.0));

    let first = RecommendationGenerator::new(&mut store).generate(1).unwrap();
    let second = RecommendationGenerator::new(&mut store).generate(1).unwrap();

    assert_eq!(first.count, 2);
    assert_eq!(second.count, 2);
    assert_eq!(store.recommendations().len(), 4);
    assert!(store
        .recommendations()
        .iter()
        .all(|r| r.status == RecommendationStatus::Pending));

    let first_ids: Vec<i64> = first.recommendations.iter().map(|r| r.recommendation_id).collect();
    let second_ids: Vec<i64> = second.recommendations.iter().map(|r| r.recommendation_id).collect();
    assert!(first_ids.iter().all(|id| !second_ids.contains(id)));
}
