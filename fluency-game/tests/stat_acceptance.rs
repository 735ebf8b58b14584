use fluency_game::{
    City, Direction, MatchTable, Outcome, PenaltyConfig, PenaltyKickEngine, RollSource,
};
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 10_000;
const TOLERANCE: f64 = 0.015;

fn rate(count: usize) -> f64 {
    let count = u32::try_from(count).expect("count fits u32");
    let total = u32::try_from(SAMPLE_SIZE).expect("sample size fits u32");
    f64::from(count) / f64::from(total)
}

fn play<R: RollSource>(engine: &mut PenaltyKickEngine<R>, aim: Direction, hold_ms: f64) {
    engine.reset();
    engine.advance();
    engine.sample(aim);
    engine.advance();
    engine.tick(hold_ms);
    engine.advance();
}

#[test]
fn keeper_guess_rate_tracks_save_probability() {
    let table = MatchTable::default();
    for city in City::ALL {
        let p = table.save_probability(city);
        let mut engine = PenaltyKickEngine::seeded(table.penalty_config(city), 0xC0FFEE);
        let mut guessed = 0usize;
        let mut saved_when_guessed = 0usize;
        let mut saved_when_wrong = 0usize;
        for trial in 0..SAMPLE_SIZE {
            let aim = Direction::ALL[trial % 3];
            play(&mut engine, aim, 400.0);
            let result = engine.result().expect("resolved");
            if result.keeper_guessed {
                guessed += 1;
                if result.outcome == Outcome::Saved {
                    saved_when_guessed += 1;
                }
            } else if result.outcome == Outcome::Saved {
                saved_when_wrong += 1;
            }
        }
        let observed = rate(guessed);
        assert!(
            (observed - p).abs() <= TOLERANCE,
            "{city}: guess rate {observed:.4} drifted from {p:.2}"
        );
        assert_eq!(saved_when_guessed, guessed, "{city}: correct guess must save");
        assert_eq!(saved_when_wrong, 0, "{city}: wrong guess must concede");
        assert_eq!(engine.rolls().draws(), u64::try_from(SAMPLE_SIZE).expect("fits"));
    }
}

#[test]
fn wrong_guess_never_dives_centre() {
    let mut engine = PenaltyKickEngine::seeded(PenaltyConfig::with_save_probability(0.0), 5);
    for trial in 0..SAMPLE_SIZE {
        let aim = Direction::ALL[trial % 3];
        play(&mut engine, aim, 700.0);
        let result = engine.result().expect("resolved");
        assert_ne!(result.keeper, Direction::Centre);
        assert_eq!(result.keeper, aim.wrong_guess_dive());
        assert_eq!(result.outcome, Outcome::Goal);
    }
}

#[test]
fn power_stays_in_unit_interval_for_any_commit_time() {
    let mut engine = PenaltyKickEngine::seeded(PenaltyConfig::with_save_probability(0.2), 77);
    let mut hold = 0.0;
    while hold < 6_000.0 {
        play(&mut engine, Direction::Right, hold);
        let result = engine.result().expect("resolved");
        assert!((0.0..=1.0).contains(&result.power), "power {} at {hold}", result.power);
        assert!((600..=1_000).contains(&result.flight_ms));
        hold += 13.7;
    }
}
