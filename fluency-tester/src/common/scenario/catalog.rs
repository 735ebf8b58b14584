use anyhow::{Result, ensure};

use fluency_game::{City, Direction, QuizRating, Screen, flight_duration_ms};

use crate::common::scenario::TestScenario;
use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{GameTester, InputMode, SimulationPlan, SimulationSummary};

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::simulation(
            "Smoke Test",
            SimulationPlan::new(GameplayStrategy::Centre)
                .with_input(InputMode::Direct)
                .with_expectation(smoke_expectation),
        )
        .with_key("smoke"),
        TestScenario::simulation(
            "Full Tournament",
            SimulationPlan::new(GameplayStrategy::Random).with_expectation(champion_expectation),
        )
        .with_key("full-tournament"),
        TestScenario::simulation(
            "Keeper Model",
            SimulationPlan::new(GameplayStrategy::Corners).with_expectation(keeper_expectation),
        )
        .with_key("keeper-model"),
        TestScenario::simulation(
            "Power Bar and Flight Time",
            SimulationPlan::new(GameplayStrategy::Random).with_expectation(power_expectation),
        )
        .with_key("power-bar"),
        TestScenario::simulation(
            "Quiz Timeouts",
            SimulationPlan::new(GameplayStrategy::Idle).with_expectation(quiz_timeout_expectation),
        )
        .with_key("quiz-timeouts"),
        TestScenario::simulation(
            "Deterministic Replay",
            SimulationPlan::new(GameplayStrategy::Random).with_expectation(replay_expectation),
        )
        .with_key("deterministic-replay"),
        TestScenario::simulation(
            "Retry After Save",
            SimulationPlan::new(GameplayStrategy::Corners).with_expectation(retry_expectation),
        )
        .with_key("retry-flow"),
        TestScenario::simulation(
            "Screen Flow",
            SimulationPlan::new(GameplayStrategy::Random).with_expectation(screen_flow_expectation),
        )
        .with_key("screen-flow"),
    ]
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.champion(), "centre run should finish as champion");
    ensure!(
        summary.session.screen == Screen::Exit,
        "run should end on exit, found {}",
        summary.session.screen
    );
    for city in City::ALL {
        let score = summary.quiz_scores.get(&city).copied().unwrap_or_default();
        ensure!(
            score.rating() == QuizRating::Perfect && score.total == 3,
            "{city} quiz scored {score}"
        );
    }
    Ok(())
}

fn champion_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.champion(), "run gave up in {:?}", summary.gave_up_in);
    for city in City::ALL {
        let record = summary.session.records.get(&city).copied().unwrap_or_default();
        ensure!(record.goals == 1, "{city} recorded {} goals", record.goals);
        ensure!(
            record.attempts == record.goals + record.saves,
            "{city} attempts {} != goals + saves",
            record.attempts
        );
        let last = summary.shots_in(city).last();
        ensure!(
            last.is_some_and(|shot| shot.result.outcome.is_goal()),
            "{city} did not end on a goal"
        );
    }
    Ok(())
}

fn keeper_expectation(summary: &SimulationSummary) -> Result<()> {
    for shot in &summary.shots {
        let result = &shot.result;
        if result.keeper_guessed {
            ensure!(
                result.keeper == result.shooter && !result.outcome.is_goal(),
                "{} #{}: keeper read the shot but conceded",
                shot.city,
                shot.attempt + 1
            );
        } else {
            ensure!(
                result.keeper != Direction::Centre,
                "{} #{}: wrong-guess dive stayed central",
                shot.city,
                shot.attempt + 1
            );
            ensure!(
                result.outcome.is_goal(),
                "{} #{}: keeper guessed wrong but saved",
                shot.city,
                shot.attempt + 1
            );
        }
        ensure!(
            (result.save_roll < shot.save_probability) == result.keeper_guessed,
            "{} #{}: roll {:.3} against p {:.2} disagrees with guess",
            shot.city,
            shot.attempt + 1,
            result.save_roll,
            shot.save_probability
        );
    }
    Ok(())
}

fn power_expectation(summary: &SimulationSummary) -> Result<()> {
    for shot in &summary.shots {
        let result = &shot.result;
        ensure!(
            (0.0..=1.0).contains(&result.power),
            "power {} out of range",
            result.power
        );
        ensure!(
            result.flight_ms == flight_duration_ms(result.power),
            "flight {}ms does not match power {:.3}",
            result.flight_ms,
            result.power
        );
        ensure!(
            (600..=1000).contains(&result.flight_ms),
            "flight {}ms outside the reachable window",
            result.flight_ms
        );
    }
    Ok(())
}

fn quiz_timeout_expectation(summary: &SimulationSummary) -> Result<()> {
    for city in City::ALL {
        let score = summary.quiz_scores.get(&city).copied().unwrap_or_default();
        ensure!(score.correct == 0, "{city} scored {score} without answering");
        ensure!(
            score.rating() == QuizRating::Poor,
            "{city} rated {}",
            score.rating()
        );
    }
    // quiz results never change keeper odds
    champion_expectation(summary)
}

fn replay_expectation(summary: &SimulationSummary) -> Result<()> {
    let plan = SimulationPlan::new(summary.strategy);
    let replay = GameTester::new(false).run_plan(&plan, summary.seed)?;
    ensure!(
        replay.shots == summary.shots,
        "replay of seed {} produced different shots",
        summary.seed
    );
    ensure!(
        replay.screens == summary.screens,
        "replay of seed {} visited different screens",
        summary.seed
    );
    Ok(())
}

fn retry_expectation(summary: &SimulationSummary) -> Result<()> {
    for pair in summary.screens.windows(2) {
        if let [Screen::Miss(city), next] = pair {
            ensure!(
                *next == Screen::Penalty(*city) || *next == Screen::Exit,
                "{city} miss led to {next}"
            );
        }
    }
    let misses = summary
        .screens
        .iter()
        .filter(|screen| matches!(screen, Screen::Miss(_)))
        .count();
    ensure!(misses == summary.saves(), "{misses} miss screens for {} saves", summary.saves());
    Ok(())
}

fn screen_flow_expectation(summary: &SimulationSummary) -> Result<()> {
    let intro = [
        Screen::Contract,
        Screen::Newspaper,
        Screen::ChangingRoom,
        Screen::CityMap(City::Sevilla),
    ];
    ensure!(
        summary.screens.starts_with(&intro),
        "intro screens were {:?}",
        &summary.screens[..summary.screens.len().min(intro.len())]
    );
    for city in City::ALL {
        let map = summary.screens.iter().position(|s| *s == Screen::CityMap(city));
        let welcome = summary.screens.iter().position(|s| *s == Screen::Welcome(city));
        let versus = summary.screens.iter().position(|s| *s == Screen::Versus(city));
        ensure!(
            map < welcome && welcome < versus && map.is_some(),
            "{city} screens out of order"
        );
    }
    ensure!(
        !summary.screens.contains(&Screen::Goal(City::Barcelona)),
        "the final showed a goal screen"
    );
    if summary.champion() {
        let tail = &summary.screens[summary.screens.len().saturating_sub(4)..];
        ensure!(
            tail == [
                Screen::Penalty(City::Barcelona),
                Screen::VictoryTrophy,
                Screen::Champion,
                Screen::Exit
            ],
            "final screens were {tail:?}"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_scenario_passes_on_a_fixed_seed() {
        let tester = GameTester::new(false);
        for scenario in catalog_scenarios() {
            let summary = tester.run_plan(&scenario.plan, 2024).unwrap();
            for expectation in &scenario.plan.expectations {
                expectation
                    .evaluate(&summary)
                    .unwrap_or_else(|err| panic!("{}: {err:#}", scenario.name));
            }
        }
    }

    #[test]
    fn winning_final_goes_straight_to_the_trophy() {
        let plan = SimulationPlan::new(GameplayStrategy::Centre).with_input(InputMode::Direct);
        let summary = GameTester::new(false).run_plan(&plan, 7).unwrap();
        assert!(summary.champion());
        let trophy = summary
            .screens
            .iter()
            .position(|screen| *screen == Screen::VictoryTrophy)
            .unwrap();
        assert_eq!(summary.screens[trophy - 1], Screen::Penalty(City::Barcelona));
        screen_flow_expectation(&summary).unwrap();
    }
}
