use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::dialogue::{DialogueClient, RoundKind};

/// A generation round requested by the UI: one line for each direction of a
/// speaker/addressee pair.
#[derive(Debug, Clone)]
pub struct RoundRequest {
    pub round_id: u64,
    pub kind: RoundKind,
    pub first_speaker: String,
    pub second_speaker: String,
}

/// Outcome of a round, drained by the render loop. A round yields exactly two
/// lines or exactly one error; one side failing fails the whole round.
#[derive(Debug)]
pub enum SceneEvent {
    RoundReady {
        round_id: u64,
        first_line: String,
        second_line: String,
    },
    RoundFailed {
        round_id: u64,
        message: String,
    },
}

/// Handles held by the UI thread: a sender for round requests, a receiver for
/// outcomes, and the shared flags.
pub struct EngineBridge {
    pub request_tx: mpsc::Sender<RoundRequest>,
    pub event_rx: mpsc::Receiver<SceneEvent>,
    pub generating: Arc<AtomicBool>,
    pub running: Arc<AtomicBool>,
}

/// Coordinates dialogue generation on the tokio side of the app. The UI never
/// touches the network; it exchanges messages with this engine.
pub struct DialogueEngine {
    client: DialogueClient,
    request_rx: Option<mpsc::Receiver<RoundRequest>>,
    event_tx: mpsc::Sender<SceneEvent>,
    generating: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl DialogueEngine {
    pub fn new(config: &AppConfig) -> (Self, EngineBridge) {
        // Load is bounded by direct user clicks, so small buffers suffice.
        let (request_tx, request_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(8);
        let generating = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        let engine = Self {
            client: DialogueClient::new(&config.dialogue),
            request_rx: Some(request_rx),
            event_tx,
            generating: generating.clone(),
            running: running.clone(),
        };
        let bridge = EngineBridge {
            request_tx,
            event_rx,
            generating,
            running,
        };
        (engine, bridge)
    }

    /// Spawn the request loop. Each round runs as its own task so a slow
    /// response never blocks the channel.
    pub fn start(mut self) {
        let mut request_rx = match self.request_rx.take() {
            Some(rx) => rx,
            None => return,
        };
        let client = self.client.clone();
        let event_tx = self.event_tx.clone();
        let generating = self.generating.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            println!("Dialogue engine started");
            while let Some(request) = request_rx.recv().await {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                let client = client.clone();
                let event_tx = event_tx.clone();
                let generating = generating.clone();
                tokio::spawn(async move {
                    run_round(client, request, event_tx, generating).await;
                });
            }
            println!("Dialogue engine shutting down");
        });
    }
}

async fn run_round(
    client: DialogueClient,
    request: RoundRequest,
    event_tx: mpsc::Sender<SceneEvent>,
    generating: Arc<AtomicBool>,
) {
    let result = tokio::try_join!(
        client.generate_line(&request.first_speaker, &request.second_speaker, request.kind),
        client.generate_line(&request.second_speaker, &request.first_speaker, request.kind),
    );

    let event = match result {
        Ok((first_line, second_line)) => SceneEvent::RoundReady {
            round_id: request.round_id,
            first_line,
            second_line,
        },
        Err(e) => {
            eprintln!("Round {} failed: {:#}", request.round_id, e);
            SceneEvent::RoundFailed {
                round_id: request.round_id,
                message: "Failed to generate conversation".to_string(),
            }
        }
    };

    generating.store(false, Ordering::Relaxed);
    if event_tx.send(event).await.is_err() {
        eprintln!("Scene event channel closed, dropping round outcome");
    }
}
