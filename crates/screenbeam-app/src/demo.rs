//! In-process demo: one sender and several viewers over the loopback broker.

use std::sync::Arc;

use screenbeam_common::{Result, ScreenbeamError};
use screenbeam_config::ScreenbeamConfig;
use screenbeam_session::loopback::{LoopbackBroker, SyntheticCapture, SyntheticPlayer};
use screenbeam_session::{
    MediaCapture, Presenter, SenderOptions, SenderSession, StreamPlayer, ViewerOptions,
    ViewerSession, ViewerState,
};
use tracing::info;

use crate::terminal::TerminalPresenter;

/// Share, let `viewers` join, close `drop` of them, then stop. Returns the
/// viewer count the sender reported just before stopping.
pub async fn run(config: &ScreenbeamConfig, viewers: usize, drop: usize) -> Result<usize> {
    run_with(config, viewers, drop, |label| {
        Box::new(TerminalPresenter::new(label).with_qr(false))
    })
    .await
}

pub(crate) async fn run_with<F>(
    config: &ScreenbeamConfig,
    viewers: usize,
    drop: usize,
    presenter: F,
) -> Result<usize>
where
    F: Fn(String) -> Box<dyn Presenter>,
{
    let drop = drop.min(viewers);
    let broker = LoopbackBroker::new();
    let capture: Arc<dyn MediaCapture> = Arc::new(SyntheticCapture::granting());
    let player: Arc<dyn StreamPlayer> = Arc::new(SyntheticPlayer::accepting());

    let mut sender = SenderSession::new(
        SenderOptions::from_config(config),
        Box::new(broker.endpoint()),
        capture,
        presenter("sender".to_string()),
    );
    sender.start();
    sender.settle().await;

    let target = match sender.own_id() {
        Some(id) if sender.state().is_live() => id.clone(),
        _ => {
            return Err(ScreenbeamError::Other(format!(
                "sender did not start sharing (state: {})",
                sender.state()
            )))
        }
    };
    info!(sender = %target, viewers, drop, "Demo share is live");

    let mut sessions = Vec::with_capacity(viewers);
    for n in 1..=viewers {
        let mut viewer = ViewerSession::new(
            ViewerOptions::from_config(config, Some(target.clone())),
            Box::new(broker.endpoint()),
            Arc::clone(&player),
            presenter(format!("viewer-{n}")),
        );
        viewer.connect();
        viewer.drain();
        sender.drain();
        viewer.settle().await;
        if viewer.state() != ViewerState::Connected {
            return Err(ScreenbeamError::Other(format!(
                "viewer-{n} did not connect (state: {})",
                viewer.state()
            )));
        }
        sessions.push(viewer);
    }

    for viewer in sessions.iter_mut().take(drop) {
        viewer.shutdown();
        sender.drain();
    }
    let count = sender.viewer_count();
    info!(count, "Demo finished, stopping share");

    sender.stop();
    for viewer in sessions.iter_mut().skip(drop) {
        viewer.drain();
        viewer.shutdown();
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use screenbeam_session::{PresenterEvent, PresenterLog, RecordingPresenter};

    use super::*;

    #[tokio::test]
    async fn count_is_joined_minus_dropped() {
        let count = run_with(&ScreenbeamConfig::default(), 4, 1, |_| {
            Box::new(RecordingPresenter::new().0)
        })
        .await
        .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn dropping_more_than_joined_leaves_none() {
        let count = run_with(&ScreenbeamConfig::default(), 2, 5, |_| {
            Box::new(RecordingPresenter::new().0)
        })
        .await
        .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn remaining_viewers_see_the_share_end() {
        let logs: Mutex<Vec<(String, PresenterLog)>> = Mutex::new(Vec::new());
        run_with(&ScreenbeamConfig::default(), 2, 0, |label| {
            let (presenter, log) = RecordingPresenter::new();
            logs.lock().unwrap().push((label, log));
            Box::new(presenter)
        })
        .await
        .unwrap();

        let logs = logs.into_inner().unwrap();
        let (_, sender_log) = &logs[0];
        assert_eq!(sender_log.viewer_counts(), vec![0, 1, 2, 0]);
        for (label, log) in &logs[1..] {
            let shown: Vec<String> = log
                .events()
                .into_iter()
                .filter_map(|e| match e {
                    PresenterEvent::Status(s) => Some(s.message),
                    _ => None,
                })
                .collect();
            assert!(
                shown.iter().any(|m| m == "Connected - Viewing screen"),
                "{label}: {shown:?}"
            );
        }
    }
}
