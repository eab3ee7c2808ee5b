use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use readaloud_core::{
    HighlightStyle, InMemoryKvStore, SettingRef, SettingsChange, SettingsError, TtsSettings,
    TtsSettingsConfig, TtsSettingsPatch, TtsSpeechConfig, TtsVoice, TTS_SETTINGS_KEY,
};
use serde_json::json;

fn counting_callback(settings: &TtsSettings) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    settings.on_settings_change(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    calls
}

#[tokio::test]
async fn defaults_when_store_is_empty() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();
    assert_eq!(settings.snapshot().await, TtsSpeechConfig::default());
    assert_eq!(settings.properties().await.len(), 7);
}

#[tokio::test]
async fn increment_and_decrement_rate() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();

    settings.increment(SettingRef::Rate).await.unwrap();
    settings.increment(SettingRef::Rate).await.unwrap();
    let v = settings.increment(SettingRef::Rate).await.unwrap();
    assert_eq!(v, 1.3);
    assert_eq!(settings.snapshot().await.rate, 1.3);

    let v = settings.decrement(SettingRef::Rate).await.unwrap();
    assert_eq!(v, 1.2);
    assert_eq!(settings.snapshot().await.rate, 1.2);

    let stored = settings.persisted_property("rate").await.unwrap().unwrap();
    assert_eq!(stored.value, json!(1.2));
}

#[tokio::test]
async fn stepping_stays_within_bounds() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();

    // volume starts at its max
    for _ in 0..5 {
        let v = settings.increment(SettingRef::Volume).await.unwrap();
        assert!(v <= 1.0);
    }
    assert_eq!(settings.snapshot().await.volume, 1.0);

    for _ in 0..30 {
        let v = settings.decrement(SettingRef::Pitch).await.unwrap();
        assert!(v >= 0.1);
    }
    assert_eq!(settings.snapshot().await.pitch, 0.1);

    for _ in 0..120 {
        settings.increment_by_name("rate").await.unwrap();
    }
    assert_eq!(settings.snapshot().await.rate, 10.0);
}

#[tokio::test]
async fn set_highlight_by_key() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();
    let calls = counting_callback(&settings);

    settings
        .set_by_key(SettingRef::Highlight, HighlightStyle::Word)
        .await
        .unwrap();

    assert_eq!(settings.snapshot().await.highlight, HighlightStyle::Word);
    let stored = settings
        .persisted_property("highlight")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value, json!("word"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn set_by_key_restricted_to_non_numeric() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();
    let calls = counting_callback(&settings);

    for r in [SettingRef::Rate, SettingRef::Pitch, SettingRef::Volume] {
        let err = settings.set_by_key(r, 0.5).await.unwrap_err();
        assert!(matches!(err, SettingsError::NotSettable(x) if x == r));
    }
    let err = settings.set_by_name("volume", json!(0.5)).await.unwrap_err();
    assert!(matches!(err, SettingsError::NotSettable(SettingRef::Volume)));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(settings.snapshot().await, TtsSpeechConfig::default());
}

#[tokio::test]
async fn set_by_name_decodes_loose_values() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();

    settings
        .set_by_name(
            "voice",
            json!({"usePublication": false, "name": "Samantha", "lang": "en-US"}),
        )
        .await
        .unwrap();
    settings.set_by_name("color", json!("yellow")).await.unwrap();
    settings.set_by_name("autoscroll", json!(false)).await.unwrap();

    let s = settings.snapshot().await;
    assert_eq!(
        s.voice,
        TtsVoice::named("Samantha", Some("en-US".to_string()))
    );
    assert_eq!(s.color, "yellow");
    assert!(!s.auto_scroll);

    let err = settings
        .set_by_name("highlight", json!(5))
        .await
        .unwrap_err();
    assert!(matches!(err, SettingsError::TypeMismatch { .. }));
    let err = settings.set_by_name("speed", json!(1)).await.unwrap_err();
    assert!(matches!(err, SettingsError::NotFound(_)));
}

#[tokio::test]
async fn apply_settings_round_trip() {
    let kv = InMemoryKvStore::new();
    let settings = TtsSettings::with_store(kv.clone()).await.unwrap();

    settings
        .apply_settings(TtsSettingsPatch {
            rate: Some(2.0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(settings.snapshot().await.rate, 2.0);

    let reloaded = TtsSettings::with_store(kv).await.unwrap();
    assert_eq!(reloaded.snapshot().await.rate, 2.0);
}

#[tokio::test]
async fn apply_settings_keeps_falsy_values() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();

    settings
        .apply_settings(TtsSettingsPatch {
            auto_scroll: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!settings.snapshot().await.auto_scroll);
    let stored = settings
        .persisted_property("autoscroll")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value, json!(false));
}

#[tokio::test]
async fn apply_settings_notifies_once_per_field() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();
    let calls = counting_callback(&settings);
    let mut rx = settings.subscribe();

    settings
        .apply_settings(TtsSettingsPatch {
            pitch: Some(1.5),
            color: Some("green".into()),
            highlight: Some(HighlightStyle::Word),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let mut seen = Vec::new();
    while let Ok(change) = rx.try_recv() {
        seen.push(change);
    }
    assert_eq!(
        seen,
        vec![
            SettingsChange::Updated(SettingRef::Pitch),
            SettingsChange::Updated(SettingRef::Color),
            SettingsChange::Updated(SettingRef::Highlight),
        ]
    );

    // Empty patch touches nothing
    settings
        .apply_settings(TtsSettingsPatch::default())
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn apply_settings_clamps_numbers() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();

    settings
        .apply_settings(TtsSettingsPatch {
            rate: Some(0.0),
            volume: Some(3.0),
            ..Default::default()
        })
        .await
        .unwrap();

    let s = settings.snapshot().await;
    assert_eq!(s.rate, 0.1);
    assert_eq!(s.volume, 1.0);
    let stored = settings.persisted_property("volume").await.unwrap().unwrap();
    assert_eq!(stored.value, json!(1.0));
}

#[tokio::test]
async fn reset_restores_defaults_and_clears_store() {
    let kv = InMemoryKvStore::new();
    let settings = TtsSettings::with_store(kv.clone()).await.unwrap();

    settings.increment(SettingRef::Rate).await.unwrap();
    settings.decrement(SettingRef::Volume).await.unwrap();
    settings.set_by_key(SettingRef::Color, "red").await.unwrap();
    settings
        .set_by_key(SettingRef::Voice, TtsVoice::named("Daniel", None))
        .await
        .unwrap();
    assert!(kv.contains_key(TTS_SETTINGS_KEY));

    let calls = counting_callback(&settings);
    settings.reset().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let first = settings.snapshot().await;
    assert_eq!(first.rate, 1.0);
    assert_eq!(first.pitch, 1.0);
    assert_eq!(first.volume, 1.0);
    assert_eq!(first.color, "orange");
    assert!(first.auto_scroll);
    assert_eq!(first.highlight, HighlightStyle::Lines);
    assert_eq!(first.voice, TtsVoice::publication());
    assert!(!kv.contains_key(TTS_SETTINGS_KEY));

    settings.reset().await.unwrap();
    assert_eq!(settings.snapshot().await, first);
    assert!(!kv.contains_key(TTS_SETTINGS_KEY));
    assert_eq!(
        settings.properties().await,
        readaloud_core::UserProperties::from_snapshot(&first)
    );
}

#[tokio::test]
async fn persisted_values_override_initial_config() {
    let kv = InMemoryKvStore::new();
    {
        let settings = TtsSettings::with_store(kv.clone()).await.unwrap();
        settings.increment(SettingRef::Pitch).await.unwrap();
    }

    let config = TtsSettingsConfig::default().with_initial(TtsSettingsPatch {
        pitch: Some(1.8),
        color: Some("blue".into()),
        ..Default::default()
    });
    let settings = TtsSettings::create(kv, config, None).await.unwrap();
    let s = settings.snapshot().await;
    assert_eq!(s.pitch, 1.1);
    assert_eq!(s.color, "blue");
}

#[tokio::test]
async fn last_registered_callback_wins() {
    let settings = TtsSettings::with_store(InMemoryKvStore::new()).await.unwrap();
    let first = counting_callback(&settings);
    let second = counting_callback(&settings);

    settings.increment(SettingRef::Rate).await.unwrap();

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}
