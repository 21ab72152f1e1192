use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use energy_scoreboard::state::{AppState, Team};

fn populated_state(teams: usize) -> AppState {
    let mut state = AppState::new();
    for i in 0..teams {
        let name = format!("Команда {i}");
        state.create_team(&name).expect("unique name");
        state.record_score(&name, "викторина", (i as i64 * 7) % 50);
        state.record_score(&name, "кроссворд", (i as i64 * 13) % 35);
    }
    state
}

fn bench_standings(c: &mut Criterion) {
    let state = populated_state(500);
    c.bench_function("standings_500_teams", |b| {
        b.iter(|| {
            let rows = black_box(&state).standings();
            black_box(rows.len());
        })
    });
}

fn bench_selector_rows(c: &mut Criterion) {
    let state = populated_state(500);
    c.bench_function("selector_rows_500_teams", |b| {
        b.iter(|| {
            let rows = black_box(&state).selector_rows();
            black_box(rows.len());
        })
    });
}

fn bench_teams_store_roundtrip(c: &mut Criterion) {
    let state = populated_state(500);
    let json = serde_json::to_string(&state.teams).expect("serialize");
    c.bench_function("teams_store_roundtrip", |b| {
        b.iter(|| {
            let teams: Vec<Team> = serde_json::from_str(black_box(&json)).expect("parse");
            black_box(teams.len());
        })
    });
}

criterion_group!(
    benches,
    bench_standings,
    bench_selector_rows,
    bench_teams_store_roundtrip
);
criterion_main!(benches);
