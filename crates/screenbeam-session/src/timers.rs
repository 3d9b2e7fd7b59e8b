//! Deadline bookkeeping shared by both session roles.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::input::{Deadline, Epoch, InputSender, SessionInput, Stamped};

/// Armed deadlines. Each arm gets a fresh token; an expiry only counts if
/// its token is still the armed one, so re-arming or disarming makes older
/// sleeps harmless.
pub(crate) struct Timers {
    tx: InputSender,
    next_token: u64,
    armed: HashMap<Deadline, u64>,
}

impl Timers {
    pub(crate) fn new(tx: InputSender) -> Self {
        Self {
            tx,
            next_token: 0,
            armed: HashMap::new(),
        }
    }

    pub(crate) fn arm(&mut self, epoch: Epoch, deadline: Deadline, after: Duration) {
        self.next_token += 1;
        let token = self.next_token;
        self.armed.insert(deadline, token);

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(Stamped {
                epoch,
                input: SessionInput::DeadlineElapsed { deadline, token },
            });
        });
        debug!(?deadline, token, ?after, "Deadline armed");
    }

    pub(crate) fn disarm(&mut self, deadline: Deadline) {
        self.armed.remove(&deadline);
    }

    /// Consume an expiry. Returns `true` if it belongs to the armed deadline.
    pub(crate) fn expire(&mut self, deadline: Deadline, token: u64) -> bool {
        if self.armed.get(&deadline) == Some(&token) {
            self.armed.remove(&deadline);
            true
        } else {
            false
        }
    }

    pub(crate) fn is_armed(&self, deadline: Deadline) -> bool {
        self.armed.contains_key(&deadline)
    }

    pub(crate) fn clear(&mut self) {
        self.armed.clear();
    }
}
