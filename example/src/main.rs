//! Competing mutations of a scroll offset.
//!
//! An ambient fling animation owns the offset until the user grabs the list;
//! the drag takes over at a higher tier, a late animation request is
//! rejected, and a final settle phase blocks user input while it snaps the
//! offset to rest.

use std::{sync::Arc, time::Duration};

use mutator_mutex::{MutatePriority, MutatorMutex};
use parking_lot::Mutex;
use tokio::time::sleep;
use tracing::info;

struct ScrollModel {
    mutex: MutatorMutex,
    offset: Mutex<f32>,
}

impl ScrollModel {
    fn new() -> Self {
        Self {
            mutex: MutatorMutex::new(),
            offset: Mutex::new(0.0),
        }
    }

    fn step(&self, delta: f32) -> f32 {
        let mut offset = self.offset.lock();
        *offset += delta;
        *offset
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mutator_mutex=trace".into()),
        )
        .init();

    let model = Arc::new(ScrollModel::new());

    // Fling deceleration at the baseline tier, preemptible by anything.
    let fling = {
        let model = Arc::clone(&model);
        tokio::spawn(async move {
            model
                .mutex
                .mutate(MutatePriority::Default, async {
                    for _ in 0..50 {
                        let offset = model.step(4.0);
                        info!(offset, "fling animates");
                        sleep(Duration::from_millis(20)).await;
                    }
                })
                .await
        })
    };
    sleep(Duration::from_millis(70)).await;

    // The user grabs the list mid-fling and drags the other way.
    let drag = {
        let model = Arc::clone(&model);
        tokio::spawn(async move {
            model
                .mutex
                .mutate(MutatePriority::UserInput, async {
                    for _ in 0..5 {
                        let offset = model.step(-12.3);
                        info!(offset, "drag moves");
                        sleep(Duration::from_millis(15)).await;
                    }
                })
                .await
        })
    };
    sleep(Duration::from_millis(30)).await;

    // A second animation request loses to the active drag.
    let late_animation = model.mutex.mutate(MutatePriority::Default, async {}).await;
    info!(?late_animation, "animation requested during drag");

    let drag_result = drag.await.unwrap();
    info!(?drag_result, "drag finished");

    // Settle to a rest position; user input cannot interrupt this phase.
    let settle = {
        let model = Arc::clone(&model);
        tokio::spawn(async move {
            model
                .mutex
                .mutate(MutatePriority::PreventUserInput, async {
                    sleep(Duration::from_millis(40)).await;
                    let offset = {
                        let mut offset = model.offset.lock();
                        *offset = offset.round();
                        *offset
                    };
                    info!(offset, "settled");
                })
                .await
        })
    };
    sleep(Duration::from_millis(10)).await;

    let blocked_input = model.mutex.mutate(MutatePriority::UserInput, async {}).await;
    info!(?blocked_input, "user input during settle");

    settle.await.unwrap().unwrap();
    let fling_result = fling.await.unwrap();
    info!(?fling_result, "fling outcome");
}
