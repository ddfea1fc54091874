use std::sync::Arc;

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;
use voice_verbs::types::commands::PlayCommand;
use voice_verbs::types::LegId;
use voice_verbs::{CorrelationRegistry, EventBus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv_override().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let mut args = std::env::args().skip(1);
    let leg = LegId::from(args.next().unwrap_or_else(|| "leg-1".to_string()));
    let media = args.next().unwrap_or_else(|| "sound:hello-world".to_string());

    let bus = EventBus::new();
    let registry = CorrelationRegistry::new(bus.clone());
    let client = Arc::new(voice_verbs::connect(bus).await?);
    let voice = client.voice(leg, registry);

    voice.answer().await?;
    let finished = voice.play(PlayCommand::new(&media)).await?;
    tracing::info!("playback finished: {}", finished.data());
    voice.hangup().await?;

    let stats = client.stats();
    tracing::info!(
        "commands sent: {}, frames received: {}",
        stats.commands_sent(),
        stats.frames_received()
    );
    Ok(())
}
