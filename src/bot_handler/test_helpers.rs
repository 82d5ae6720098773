use std::sync::Arc;

use chrono::Utc;
use teloxide::{
    dispatching::dialogue::serializer,
    types::{
        CallbackQuery, Chat, ChatId, ChatKind, ChatPrivate, Contact, MaybeInaccessibleMessage,
        MediaContact, MediaKind, MediaText, Message, MessageCommon, MessageId, MessageKind, User,
        UserId,
    },
};

use super::*;

pub const CHAT_ID: ChatId = ChatId(123);
pub const TELEGRAM_ID: i64 = 123;

// Test harness to encapsulate common test setup and actions.
pub struct TestHarness {
    bot_handler: BotHandler,
    pub dialogue: BotDialogue,
    storage: Arc<DialogueStorage>,
}

impl TestHarness {
    // Creates a new TestHarness with mock services.
    pub async fn new(
        mock_messaging: crate::messaging::MockMessagingService,
        mock_portal: crate::repository::MockPortalService,
    ) -> Self {
        let bot_handler = BotHandler::new(Arc::new(mock_messaging), Arc::new(mock_portal));
        let storage = DialogueStorage::open("sqlite::memory:", serializer::Json).await.unwrap();
        let dialogue = BotDialogue::new(storage.clone(), CHAT_ID);

        Self { bot_handler, dialogue, storage }
    }

    // Creates a new dialogue for the same chat ID to test state persistence.
    pub fn new_dialogue(&self) -> BotDialogue {
        BotDialogue::new(self.storage.clone(), CHAT_ID)
    }

    pub async fn state(&self) -> Option<ConversationState> {
        self.dialogue.get().await.unwrap()
    }

    pub async fn set_state(&self, state: ConversationState) {
        self.dialogue.update(state).await.unwrap();
    }

    // Simulates an incoming text message.
    pub async fn handle_text(&self, text: &str) -> Result<(), BotHandlerError> {
        let msg = mock_message(CHAT_ID, text);
        self.bot_handler.handle_message(&msg, &self.dialogue).await
    }

    // Simulates an incoming shared contact.
    pub async fn handle_contact(
        &self,
        phone: &str,
        first_name: &str,
    ) -> Result<(), BotHandlerError> {
        let msg = mock_contact_message(CHAT_ID, phone, first_name);
        self.bot_handler.handle_message(&msg, &self.dialogue).await
    }

    // Simulates a pressed inline button carrying `data`.
    pub async fn handle_callback(&self, data: &str) -> Result<(), BotHandlerError> {
        let (_, query) = mock_callback_query(CHAT_ID, data);
        self.bot_handler.handle_callback_query(&query, &self.dialogue).await
    }
}

pub fn mock_user() -> User {
    User {
        id: UserId(TELEGRAM_ID as u64),
        is_bot: false,
        first_name: "Тест".to_string(),
        last_name: None,
        username: Some("testuser".to_string()),
        language_code: None,
        is_premium: false,
        added_to_attachment_menu: false,
    }
}

fn mock_message_with_media(chat_id: ChatId, media_kind: MediaKind) -> Message {
    Message {
        id: MessageId(1),
        date: Utc::now(),
        chat: Chat {
            id: chat_id,
            kind: ChatKind::Private(ChatPrivate {
                username: Some("test".to_string()),
                first_name: Some("Тест".to_string()),
                last_name: None,
            }),
        },
        kind: MessageKind::Common(MessageCommon {
            media_kind,
            reply_to_message: None,
            reply_markup: None,
            edit_date: None,
            author_signature: None,
            has_protected_content: false,
            is_automatic_forward: false,
            effect_id: None,
            forward_origin: None,
            external_reply: None,
            quote: None,
            reply_to_story: None,
            sender_boost_count: None,
            is_from_offline: false,
            business_connection_id: None,
        }),
        from: Some(mock_user()),
        is_topic_message: false,
        sender_business_bot: None,
        sender_chat: None,
        thread_id: None,
        via_bot: None,
    }
}

// Helper to create a mock teloxide message to reduce boilerplate in tests
pub fn mock_message(chat_id: ChatId, text: &str) -> Message {
    mock_message_with_media(
        chat_id,
        MediaKind::Text(MediaText {
            text: text.to_string(),
            entities: vec![],
            link_preview_options: None,
        }),
    )
}

// Helper to create a mock message carrying a shared contact
pub fn mock_contact_message(chat_id: ChatId, phone: &str, first_name: &str) -> Message {
    mock_message_with_media(
        chat_id,
        MediaKind::Contact(MediaContact {
            contact: Contact {
                phone_number: phone.to_string(),
                first_name: first_name.to_string(),
                last_name: None,
                user_id: Some(UserId(TELEGRAM_ID as u64)),
                vcard: None,
            },
        }),
    )
}

// Helper to create a mock callback query
pub fn mock_callback_query(chat_id: ChatId, data: &str) -> (Message, CallbackQuery) {
    let msg = mock_message(chat_id, "This is a message with a keyboard.");
    let query = CallbackQuery {
        id: "test_callback_id".to_string(),
        from: mock_user(),
        message: Some(MaybeInaccessibleMessage::Regular(Box::new(msg.clone()))),
        inline_message_id: None,
        chat_instance: "test_instance".to_string(),
        data: Some(data.to_string()),
        game_short_name: None,
    };
    (msg, query)
}
