mod support;

use std::sync::atomic::Ordering;

use reelcipe::chat::{texts, Button, ChatKind, MessageId, MessageRef};
use reelcipe::metrics::metric_names;
use reelcipe::orchestrator::{FlowError, FlowOutcome};
use reelcipe::recipe::detect::Detection;
use reelcipe::recipe::{Locale, ReelLink, ReelMetadata};
use reelcipe::state_machine::FlowState;

use support::{reel_metadata, Call, Harness, Scenario, CHAT, RECIPE_EN, REEL};

fn progress_ref() -> MessageRef {
    MessageRef {
        chat_id: CHAT,
        message_id: MessageId(1),
    }
}

fn edit(text: &str) -> Call {
    Call::EditText {
        message: progress_ref(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn english_reel_is_delivered_and_cached() {
    let h = Harness::new(Scenario::default());

    let outcome = h
        .orchestrator
        .on_incoming_message(CHAT, ChatKind::Private, REEL)
        .await
        .unwrap();

    let link = ReelLink::new(REEL);
    let recipe_ref = MessageRef {
        chat_id: CHAT,
        message_id: MessageId(2),
    };
    assert_eq!(
        outcome,
        FlowOutcome::Delivered {
            link: link.clone(),
            locale: Locale::En,
            message: recipe_ref,
        }
    );

    let cached = h.orchestrator.cache().get(Locale::En, &link).unwrap();
    assert_eq!(cached.as_str(), RECIPE_EN);
    assert!(!h.orchestrator.cache().contains(Locale::Ru, &link));

    assert_eq!(
        h.transport.calls(),
        vec![
            Call::SendText {
                chat: CHAT,
                text: texts::PROCESSING.to_string()
            },
            edit("Watching the video..."),
            edit("Detecting language..."),
            edit("Transcribing..."),
            edit("Compiling recipe..."),
            Call::Delete {
                message: progress_ref()
            },
            Call::SendRecipe {
                chat: CHAT,
                text: RECIPE_EN.to_string(),
                button: Button::translate_to(Locale::Ru),
            },
        ]
    );

    let session = h.orchestrator.sessions().get(CHAT).unwrap();
    assert_eq!(session.reel_link, link);
    assert_eq!(session.source_locale, Locale::En);
}

#[tokio::test]
async fn russian_reel_offers_english_toggle() {
    let h = Harness::new(Scenario {
        detection: Detection::Supported(Locale::Ru),
        recipe: Some("<b>Паста</b>".to_string()),
        ..Scenario::default()
    });

    h.orchestrator
        .on_incoming_message(CHAT, ChatKind::Group, REEL)
        .await
        .unwrap();

    let last = h.transport.calls().pop().unwrap();
    assert_eq!(
        last,
        Call::SendRecipe {
            chat: CHAT,
            text: "<b>Паста</b>".to_string(),
            button: Button::translate_to(Locale::En),
        }
    );
    assert!(h
        .orchestrator
        .cache()
        .contains(Locale::Ru, &ReelLink::new(REEL)));
}

#[tokio::test]
async fn missing_metadata_stops_before_transcription() {
    let h = Harness::new(Scenario {
        metadata: None,
        ..Scenario::default()
    });

    let outcome = h
        .orchestrator
        .on_incoming_message(CHAT, ChatKind::Private, REEL)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        FlowOutcome::Failed {
            at: FlowState::FetchingMetadata,
            error: FlowError::MetadataUnavailable,
        }
    );
    assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
    assert!(h.orchestrator.cache().is_empty());
    assert!(h.orchestrator.sessions().get(CHAT).is_none());

    let calls = h.transport.calls();
    assert_eq!(calls.last(), Some(&edit(texts::ERROR_MESSAGE)));
    let error_edits = calls
        .iter()
        .filter(|c| **c == edit(texts::ERROR_MESSAGE))
        .count();
    assert_eq!(error_edits, 1);
}

#[tokio::test]
async fn blank_video_url_counts_as_missing_metadata() {
    let h = Harness::new(Scenario {
        metadata: Some(ReelMetadata {
            video_url: "  ".to_string(),
            ..reel_metadata()
        }),
        ..Scenario::default()
    });

    let outcome = h
        .orchestrator
        .on_incoming_message(CHAT, ChatKind::Private, REEL)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        FlowOutcome::Failed {
            error: FlowError::MetadataUnavailable,
            ..
        }
    ));
}

#[tokio::test]
async fn unsupported_language_is_rejected_without_transcribing() {
    let h = Harness::new(Scenario {
        detection: Detection::Unsupported {
            detected: Some("fr".to_string()),
        },
        ..Scenario::default()
    });

    let outcome = h
        .orchestrator
        .on_incoming_message(CHAT, ChatKind::Private, REEL)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        FlowOutcome::Failed {
            at: FlowState::DetectingLanguage,
            error: FlowError::UnsupportedLanguage(Some("fr".to_string())),
        }
    );
    assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.assembler.calls.load(Ordering::SeqCst), 0);
    assert!(h.orchestrator.cache().is_empty());
}

#[tokio::test]
async fn empty_transcription_fails_the_flow() {
    let h = Harness::new(Scenario {
        transcript: Some("   ".to_string()),
        ..Scenario::default()
    });

    let outcome = h
        .orchestrator
        .on_incoming_message(CHAT, ChatKind::Private, REEL)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        FlowOutcome::Failed {
            at: FlowState::Transcribing,
            error: FlowError::TranscriptionFailed,
        }
    );
    assert_eq!(h.assembler.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.transport.calls().last(), Some(&edit(texts::ERROR_MESSAGE)));
}

#[tokio::test]
async fn empty_assembly_fails_and_caches_nothing() {
    let h = Harness::new(Scenario {
        recipe: None,
        ..Scenario::default()
    });

    let outcome = h
        .orchestrator
        .on_incoming_message(CHAT, ChatKind::Private, REEL)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        FlowOutcome::Failed {
            at: FlowState::AssemblingRecipe,
            error: FlowError::AssemblyFailed,
        }
    );
    assert!(h.orchestrator.cache().is_empty());
    assert!(!h
        .transport
        .calls()
        .iter()
        .any(|c| matches!(c, Call::SendRecipe { .. })));
}

#[tokio::test]
async fn non_reel_text_gets_hint_only_in_private_chats() {
    let h = Harness::new(Scenario::default());

    let private = h
        .orchestrator
        .on_incoming_message(CHAT, ChatKind::Private, "hello there")
        .await
        .unwrap();
    assert_eq!(private, FlowOutcome::NotAReel);
    assert_eq!(
        h.transport.calls(),
        vec![Call::SendText {
            chat: CHAT,
            text: texts::INVALID_MESSAGE.to_string()
        }]
    );

    h.transport.clear();
    let group = h
        .orchestrator
        .on_incoming_message(CHAT, ChatKind::Group, "https://youtube.com/watch?v=1")
        .await
        .unwrap();
    assert_eq!(group, FlowOutcome::NotAReel);
    assert!(h.transport.calls().is_empty());
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn start_sends_welcome() {
    let h = Harness::new(Scenario::default());
    h.orchestrator.on_start(CHAT).await.unwrap();
    assert_eq!(
        h.transport.calls(),
        vec![Call::SendText {
            chat: CHAT,
            text: texts::START_MESSAGE.to_string()
        }]
    );
}

#[tokio::test]
async fn flow_timings_are_recorded() {
    let h = Harness::new(Scenario::default());
    h.orchestrator
        .on_incoming_message(CHAT, ChatKind::Private, REEL)
        .await
        .unwrap();

    let metrics = h.orchestrator.metrics();
    assert_eq!(metrics.count(metric_names::FETCH_METADATA), 1);
    assert_eq!(metrics.count(metric_names::FLOW_DELIVERED), 1);
    assert_eq!(metrics.count(metric_names::FLOW_FAILED), 0);
}

#[tokio::test]
async fn failed_flows_are_timed_separately() {
    let h = Harness::new(Scenario {
        transcript: None,
        ..Scenario::default()
    });
    for _ in 0..2 {
        h.orchestrator
            .on_incoming_message(CHAT, ChatKind::Private, REEL)
            .await
            .unwrap();
    }

    let metrics = h.orchestrator.metrics();
    assert_eq!(metrics.count(metric_names::FLOW_FAILED), 2);
    assert_eq!(metrics.count(metric_names::FLOW_DELIVERED), 0);
    assert_eq!(metrics.count(metric_names::TRANSCRIBE), 2);
    assert_eq!(metrics.count(metric_names::ASSEMBLE), 0);
}
