//! Integration tests for the forecast service pipeline
//!
//! These tests write input files to a temporary directory and run the full
//! load -> simulate -> report path without touching the environment.

use forecast_service_rust::{load_oracle, run, write_report, ServiceConfig};
use gridiron_rust_core::{RunStatus, SimulationConfig};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Two conferences of two four-team divisions, one division round-robin.
fn write_inputs(dir: &Path) -> (String, String) {
    let mut teams = Vec::new();
    let mut games = Vec::new();
    for conference in ["AFC", "NFC"] {
        for division in ["East", "West"] {
            let keys: Vec<String> = (1..=4)
                .map(|i| format!("{}{}{}", &conference[..1], &division[..1], i))
                .collect();
            for key in &keys {
                teams.push(json!({ "Key": key, "Conference": conference, "Division": division }));
            }
            let rounds = [[(0, 1), (2, 3)], [(0, 2), (1, 3)], [(0, 3), (1, 2)]];
            for (week, round) in rounds.iter().enumerate() {
                for &(h, a) in round {
                    let week = week as i32 + 1;
                    if week == 1 {
                        games.push(json!({
                            "week": week, "home_team": keys[h], "away_team": keys[a],
                            "status": "Final", "home_score": 24, "away_score": 17,
                            "home_qb": format!("{} QB", keys[h])
                        }));
                    } else {
                        games.push(json!({
                            "Week": week, "HomeTeam": keys[h], "AwayTeam": keys[a],
                            "Status": "Scheduled", "HomeRest": 6
                        }));
                    }
                }
            }
        }
    }

    let teams_path = dir.join("teams.json");
    let schedule_path = dir.join("schedule.json");
    fs::write(&teams_path, Value::Array(teams).to_string()).unwrap();
    fs::write(&schedule_path, Value::Array(games).to_string()).unwrap();
    (
        teams_path.to_string_lossy().into_owned(),
        schedule_path.to_string_lossy().into_owned(),
    )
}

fn config(dir: &TempDir, trials: u64) -> ServiceConfig {
    let (teams_path, schedule_path) = write_inputs(dir.path());
    ServiceConfig {
        teams_path,
        schedule_path,
        models_path: None,
        output_path: Some(dir.path().join("out/report.json").to_string_lossy().into_owned()),
        simulation: SimulationConfig::new(trials).with_seed(2024),
    }
}

#[test]
fn test_full_run_writes_report() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 200);

    let report = run(&config).expect("run succeeds");
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.trials_completed, 200);
    assert_eq!(report.random_seed, 2024);
    assert_eq!(report.teams.len(), 16);

    let total: f64 = report.teams.iter().map(|t| t.championship_probability).sum();
    assert!((total - 1.0).abs() < 1e-9, "title odds should sum to 1: {}", total);

    let output = config.output_path.as_deref().unwrap();
    write_report(&report, Some(output)).unwrap();
    let written: Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(written["trials_completed"], 200);
    assert_eq!(written["teams"].as_array().unwrap().len(), 16);
    assert!(written["teams"][0]["round_probabilities"]["Championship"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_seeded_runs_match() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, 150);

    let first = run(&config).unwrap();
    let second = run(&config).unwrap();
    assert_eq!(first.teams, second.teams);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn test_ensemble_file_is_used() {
    let dir = TempDir::new().unwrap();
    let models_path = dir.path().join("models.json");
    fs::write(
        &models_path,
        r#"{
            "elo": { "weight": 0.7, "ratings": { "AE1": 1900.0 } },
            "margin_models": [ { "name": "power", "weight": 0.3, "ratings": { "AE1": 14.0 } } ]
        }"#,
    )
    .unwrap();

    let mut config = config(&dir, 300);
    config.models_path = Some(models_path.to_string_lossy().into_owned());

    let (oracle, ratings) = load_oracle(config.models_path.as_deref()).unwrap();
    assert_eq!(oracle.model_names(), vec!["elo", "power"]);
    assert_eq!(ratings.get("AE1"), 1900.0);

    let report = run(&config).unwrap();
    assert_eq!(report.teams[0].team, "AE1", "dominant team should lead the title odds");
    assert!(report.team("AE1").unwrap().playoff_probability > 0.95);
}

#[test]
fn test_missing_inputs_are_reported() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, 10);
    config.schedule_path = dir.path().join("nope.json").to_string_lossy().into_owned();

    let err = run(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.json"));
}
