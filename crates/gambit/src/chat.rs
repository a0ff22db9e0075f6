//! Per-game chat.

use std::sync::{Arc, Mutex};

use gambit_protocol::{destinations, ChatMessage, GameId, Topic};

use crate::{ChatError, Multiplexer, Subscription};

/// Longest message accepted for sending, in characters.
pub const MAX_CHAT_LEN: usize = 200;

/// Sender name used when the player is not logged in.
pub const ANONYMOUS: &str = "Anonymous";

/// The chat panel of one game: a transcript of everything received on
/// `/topic/game/{id}/chat` plus a send box.
///
/// Our own messages only appear in the transcript once the server echoes
/// them back. Dropping the room unsubscribes.
pub struct ChatRoom {
    game_id: GameId,
    sender: String,
    mux: Multiplexer,
    transcript: Arc<Mutex<Vec<ChatMessage>>>,
    subscription: Subscription,
}

impl ChatRoom {
    /// Joins the chat of `game_id`, sending as `sender` (or
    /// [`ANONYMOUS`]).
    pub fn open(mux: &Multiplexer, game_id: GameId, sender: Option<&str>) -> Self {
        let transcript: Arc<Mutex<Vec<ChatMessage>>> = Arc::default();
        let subscription = {
            let transcript = Arc::clone(&transcript);
            mux.subscribe_to(Topic::game_chat(game_id), move |message: ChatMessage| {
                transcript
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(message);
            })
        };

        Self {
            game_id,
            sender: sender
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(ANONYMOUS)
                .to_string(),
            mux: mux.clone(),
            transcript,
            subscription,
        }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Every message received so far, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Sends `text`, trimmed.
    ///
    /// # Errors
    /// Blank or over-long text is refused without touching the wire, and
    /// [`ChatError::NotConnected`] means the message was dropped.
    pub fn send(&self, text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::Empty);
        }
        let len = text.chars().count();
        if len > MAX_CHAT_LEN {
            return Err(ChatError::TooLong {
                len,
                max: MAX_CHAT_LEN,
            });
        }

        let message = ChatMessage::chat(self.game_id, self.sender.as_str(), text);
        if self.mux.publish(destinations::CHAT, &message) {
            Ok(())
        } else {
            Err(ChatError::NotConnected)
        }
    }
}

impl Drop for ChatRoom {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
