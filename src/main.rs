use sonder::config::read_app_config;
use sonder::engine::DialogueEngine;
use sonder::ui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Loading configuration...");
    let app_config = read_app_config();

    let (engine, bridge) = DialogueEngine::new(&app_config);
    engine.start();

    // The event loop owns the main thread until the user exits.
    ui::run(bridge, app_config);

    Ok(())
}
