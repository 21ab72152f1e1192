use std::env;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::state::{Delta, ProviderCommand};

// Activities the demo provider pretends to be. Game ids are opaque to the
// registry; these match the activity names of the host quiz pages.
const DEMO_GAMES: &[&str] = &["викторина", "кроссворд", "энерго-пазл", "лабиринт"];

/// Spawns a provider thread that simulates collaborating game pages
/// reporting scores. Real games would push the same `Delta::ScoreReport`s.
pub fn spawn_demo_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();

        let report_delay = Duration::from_millis(
            env::var("ENERGY_DEMO_DELAY_MS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(600)
                .min(5_000),
        );

        loop {
            thread::sleep(Duration::from_millis(250));

            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::SimulateGame { teams } => {
                        if teams.is_empty() {
                            let _ = tx.send(Delta::Log(
                                "[INFO] Demo game skipped: no teams registered".to_string(),
                            ));
                            continue;
                        }

                        // Pretend the activity takes a moment to finish.
                        thread::sleep(report_delay);

                        let team = teams[rng.gen_range(0..teams.len())].clone();
                        let game = DEMO_GAMES[rng.gen_range(0..DEMO_GAMES.len())].to_string();
                        let points = i64::from(rng.gen_range(1..=10)) * 5;
                        let _ = tx.send(Delta::ScoreReport { team, game, points });
                    }
                }
            }
        }
    });
}
