use async_trait::async_trait;
use readaloud_core::{
    HostSettingsSink, JsonFileStore, SettingsError, TtsSettings, TtsSettingsConfig,
    TtsSettingsPatch, TtsSpeechConfig,
};
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "usage: tts_settings [show | inc <ref> | dec <ref> | set <ref> <json> | apply <json> | reset]";

/// Host stand-in that logs what playback would be reconfigured with
struct LoggingHost;

#[async_trait]
impl HostSettingsSink for LoggingHost {
    async fn update_settings(&self, settings: TtsSpeechConfig) -> readaloud_core::Result<()> {
        info!(
            target = "tts_settings",
            rate = settings.rate,
            pitch = settings.pitch,
            volume = settings.volume,
            voice = ?settings.voice.effective_name(),
            "Playback reconfigured"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,readaloud_core=info,tts_settings=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = TtsSettingsConfig::load();
    let path = cfg
        .store_path
        .clone()
        .unwrap_or_else(JsonFileStore::default_path);
    let store = Arc::new(JsonFileStore::new(&path));

    let settings = TtsSettings::create(store, cfg, Some(Arc::new(LoggingHost))).await?;
    settings.on_settings_change(|change| {
        info!(target = "tts_settings", ?change, "Settings changed");
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] | ["show"] => {}
        ["inc", name] => {
            settings.increment_by_name(name).await?;
        }
        ["dec", name] => {
            settings.decrement_by_name(name).await?;
        }
        ["set", name, value] => {
            settings.set_by_name(name, parse_json(value)?).await?;
        }
        ["apply", patch] => {
            let patch: TtsSettingsPatch = serde_json::from_str(patch)?;
            settings.apply_settings(patch).await?;
        }
        ["reset"] => settings.reset().await?,
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&settings.snapshot().await)?
    );
    settings.stop().await;
    Ok(())
}

/// Accept bare words (`word`, `red`) as JSON strings
fn parse_json(raw: &str) -> Result<serde_json::Value, SettingsError> {
    match serde_json::from_str(raw) {
        Ok(v) => Ok(v),
        Err(_) if !raw.trim_start().starts_with(['{', '[', '"']) => {
            Ok(serde_json::Value::String(raw.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
