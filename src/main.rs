use std::{rc::Rc, time::Duration};

use chat_call_core::{
    proto::{MessageCategory, SignalingMessage, Topic},
    signaling::{OutboundChannel, ReadyState},
    sys::{DeviceAvailability, VirtualMediaDevices},
    CallMedia, Config, MediaConfiguration, SignalingMessageRouter,
    SubscriptionManager,
};
use futures::StreamExt as _;
use serde_json::json;
use tokio::{task, task::spawn_local};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_call_core=debug,info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!(signaling_url = %config.signaling_url, "Starting call demo");

    task::LocalSet::new()
        .run_until(async move {
            let devices = VirtualMediaDevices::new(
                DeviceAvailability::default(),
                Duration::from_millis(config.device_latency_ms),
            );
            let call = CallMedia::new(
                Rc::new(devices.clone()),
                &config,
                |is_initiator| {
                    info!(is_initiator, "Connection layer asked to negotiate");
                },
            );
            spawn_on_stream_id_changed(Rc::clone(&call));

            let (channel, mut outbound) = OutboundChannel::new();
            let channel = Rc::new(channel);
            spawn_local(async move {
                while let Some(frame) = outbound.next().await {
                    info!(%frame, "Outbound signaling frame");
                }
            });

            let subscriptions = SubscriptionManager::new(channel.clone());
            if !subscriptions.open(Topic::room("42")) {
                warn!("Subscription refused while connecting");
            }
            channel.set_ready_state(ReadyState::Open);
            subscriptions.watch_user("me");
            subscriptions.open_many([Topic::room("42"), Topic::user("7")]);

            let router = Rc::new(SignalingMessageRouter::new());
            spawn_on_call_message(Rc::clone(&router), Rc::clone(&call));

            let camera_and_mic = MediaConfiguration::camera_and_mic();
            if let Err(e) = call.start(camera_and_mic).await {
                warn!(error = %e, "Initial acquisition failed");
            }

            // Two overlapping changes: the second queues behind the first.
            let screen_share = camera_and_mic.with_display_media(true, true);
            let camera_off = screen_share.with_user_media(true, false);
            let (first, second) = futures::future::join(
                call.reconfigure(screen_share),
                call.reconfigure(camera_off),
            )
            .await;
            info!(?first, ?second, "Reconfigured local media");

            for raw in [
                json!({
                    "TYPE": "OUT_ROOM_MESSAGE",
                    "DATA": json!({
                        "ID": "1",
                        "content": "hi",
                        "author": "a",
                        "has_attachment": false,
                    })
                    .to_string(),
                })
                .to_string(),
                json!({"TYPE": "CALL_WEBRTC_REQUESTED_REINITIALIZATION"})
                    .to_string(),
                "{broken".to_string(),
            ] {
                match router.route(&raw) {
                    Ok(category) => info!(?category, "Routed frame"),
                    Err(e) => warn!(error = %e, "Dropped malformed frame"),
                }
            }
            task::yield_now().await;
            call.when_settled().await;

            subscriptions.close(&Topic::room("42"));
            let released = call.teardown();
            info!(
                released,
                live_tracks = devices.live_tracks(),
                negotiations = call.negotiations(),
                topics = ?subscriptions.topics(),
                "Call ended"
            );
        })
        .await;

    Ok(())
}

/// Spawns listener logging every new user-media stream id, the value offers
/// carry as `um_stream_id`.
fn spawn_on_stream_id_changed(call: Rc<CallMedia>) {
    let mut on_stream_id = call.user_media_stream_id().subscribe();
    spawn_local(async move {
        while let Some(stream_id) = on_stream_id.next().await {
            info!(?stream_id, "User media stream changed");
        }
    });
}

/// Spawns the call engine consumer.
///
/// Reapplies the current configuration when the remote side asks for
/// reinitialization. Live tracks are kept, so this only renegotiates.
fn spawn_on_call_message(
    router: Rc<SignalingMessageRouter>,
    call: Rc<CallMedia>,
) {
    let mut on_call_message = router.subscribe(MessageCategory::Call);
    spawn_local(async move {
        while let Some(message) = on_call_message.next().await {
            if let SignalingMessage::ReinitializationRequested = message {
                let Some(config) = call.configuration() else {
                    continue;
                };
                if let Err(e) = call.reconfigure(config).await {
                    warn!(error = %e, "Reinitialization skipped");
                }
            }
        }
    });
}
