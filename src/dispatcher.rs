use std::{collections::HashMap, sync::Arc};

use teloxide::{
    dispatching::dialogue::Dialogue,
    types::{ChatId, Update, UpdateKind, UserId},
};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::bot_handler::{BotDialogue, BotHandler, DialogueStorage};

/// Routes webhook updates to the bot handler.
///
/// Conversation state is keyed by Telegram user id, and a per-user async lock
/// serializes handling when Telegram delivers several updates for the same
/// user concurrently. Distinct users proceed in parallel.
pub struct BotDispatcher {
    handler: Arc<BotHandler>,
    dialogue_storage: Arc<DialogueStorage>,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl BotDispatcher {
    /// Creates a new `BotDispatcher`.
    pub fn new(handler: Arc<BotHandler>, dialogue_storage: Arc<DialogueStorage>) -> Self {
        Self { handler, dialogue_storage, user_locks: Mutex::new(HashMap::new()) }
    }

    /// Handles one update to completion. Errors are logged, never propagated:
    /// the webhook answers 200 regardless.
    pub async fn route_update(&self, update: Update) {
        match update.kind {
            UpdateKind::Message(msg) => {
                let Some(user_id) = msg.from.as_ref().map(|user| user.id) else {
                    debug!("message update without a sender, ignored");
                    return;
                };
                let lock = self.user_lock(user_id).await;
                let _guard = lock.lock().await;

                let dialogue = self.dialogue(user_id);
                if let Err(e) = self.handler.handle_message(&msg, &dialogue).await {
                    error!(error = %e, user_id = user_id.0, "message handling failed");
                }
            }
            UpdateKind::CallbackQuery(query) => {
                let user_id = query.from.id;
                let lock = self.user_lock(user_id).await;
                let _guard = lock.lock().await;

                let dialogue = self.dialogue(user_id);
                if let Err(e) = self.handler.handle_callback_query(&query, &dialogue).await {
                    error!(error = %e, user_id = user_id.0, "callback handling failed");
                }
            }
            _ => debug!("unsupported update kind, ignored"),
        }
    }

    /// The dialogue for a user. State is keyed by user id, not chat id, so
    /// that an admin replying from a shared channel keeps their own state.
    fn dialogue(&self, user_id: UserId) -> BotDialogue {
        Dialogue::new(self.dialogue_storage.clone(), ChatId(user_id.0 as i64))
    }

    async fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks.entry(user_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}
