use mockall::predicate::*;
use teloxide::types::ChatId;

use super::{test_helpers::*, *};
use crate::{
    messaging::MockMessagingService,
    repository::MockPortalService,
    storage::{RequestStatus, SenderType, ServiceRequest, User},
};

fn portal_user() -> User {
    User {
        id: 1,
        name: "Иван".to_string(),
        phone: "79991234567".to_string(),
        email: None,
        password_hash: "hash".to_string(),
        telegram_id: Some(TELEGRAM_ID),
        telegram_username: Some("testuser".to_string()),
        user_role: "user".to_string(),
    }
}

fn user_with_telegram(telegram_id: Option<i64>) -> User {
    User { telegram_id, ..portal_user() }
}

fn pending_request(id: i64, user_id: Option<i64>) -> ServiceRequest {
    ServiceRequest {
        id,
        user_id,
        client_name: "Иван".to_string(),
        client_phone: "79991234567".to_string(),
        client_email: None,
        car_brand: "Kia".to_string(),
        car_model: "Sorento".to_string(),
        car_year: Some(2021),
        description: "Русификация".to_string(),
        status: RequestStatus::Pending,
        created_at: 1_700_000_000,
    }
}

fn known_identity() -> RequestIdentity {
    RequestIdentity::Known {
        user_id: 1,
        name: "Иван".to_string(),
        phone: "79991234567".to_string(),
        email: None,
    }
}

fn api_error() -> crate::messaging::MessagingError {
    crate::messaging::MessagingError::TeloxideRequest(teloxide::RequestError::Api(
        teloxide::ApiError::BotBlocked,
    ))
}

#[tokio::test]
async fn test_start_unregistered_prompts_for_phone() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal.expect_find_user_by_telegram().with(eq(TELEGRAM_ID)).returning(|_| None);
    mock_messaging
        .expect_send_contact_request()
        .with(eq(CHAT_ID), always())
        .times(1)
        .returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_text("/start").await.unwrap();

    assert_eq!(harness.state().await, Some(ConversationState::WaitingPhoneText));
}

#[tokio::test]
async fn test_start_registered_shows_menu_and_drops_state() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal.expect_find_user_by_telegram().returning(|_| Some(portal_user()));
    mock_messaging
        .expect_show_main_menu()
        .withf(|chat_id, message_id, _, registered| {
            *chat_id == CHAT_ID && message_id.is_none() && *registered
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    // A restart drops an in-flight flow.
    harness.set_state(ConversationState::WaitingPhoneText).await;
    harness.handle_text("/start").await.unwrap();

    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_contact_with_known_phone_links_account() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal
        .expect_find_user_by_phone()
        .with(eq("79991234567"))
        .returning(|_| Some(portal_user()));
    mock_portal
        .expect_link_telegram()
        .with(eq(1), eq(TELEGRAM_ID), eq(Some("testuser".to_string())))
        .times(1)
        .returning(|_, _, _| true);
    mock_messaging
        .expect_show_main_menu()
        .withf(|_, _, _, registered| *registered)
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_contact("+7 999 123-45-67", "Иван").await.unwrap();

    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_account_linking_then_start_routes_to_menu() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal
        .expect_find_user_by_phone()
        .with(eq("79991234567"))
        .times(1)
        .returning(|_| Some(portal_user()));
    mock_portal.expect_link_telegram().times(1).returning(|_, _, _| true);
    mock_portal.expect_find_user_by_telegram().returning(|_| Some(portal_user()));
    mock_messaging.expect_show_main_menu().times(2).returning(|_, _, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_contact("89991234567", "Иван").await.unwrap();
    // Linked now: a second /start bypasses phone capture entirely.
    harness.handle_text("/start").await.unwrap();

    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_contact_with_unknown_phone_offers_registration() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal.expect_find_user_by_phone().returning(|_| None);
    mock_messaging.expect_send_register_offer().times(1).returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_contact("89991234567", "Иван").await.unwrap();

    let captured = ConversationState::PhoneCaptured {
        name: "Иван".to_string(),
        phone: "79991234567".to_string(),
    };
    assert_eq!(harness.state().await, Some(captured.clone()));

    // The entry lives in the sqlite-backed storage, not the dialogue handle.
    let fresh_dialogue = harness.new_dialogue();
    assert_eq!(fresh_dialogue.get().await.unwrap(), Some(captured));
}

#[tokio::test]
async fn test_invalid_phone_text_keeps_step() {
    let mut mock_messaging = MockMessagingService::new();
    let mock_portal = MockPortalService::new();

    mock_messaging.expect_send_text().times(1).returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.set_state(ConversationState::WaitingPhoneText).await;
    harness.handle_text("12345").await.unwrap();

    assert_eq!(harness.state().await, Some(ConversationState::WaitingPhoneText));
}

#[tokio::test]
async fn test_registration_with_captured_phone() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_messaging.expect_show_prompt().returning(|_, _, _| Ok(()));
    mock_portal
        .expect_register_user()
        .withf(|telegram_id, username, name, phone, password| {
            *telegram_id == TELEGRAM_ID
                && username.as_deref() == Some("testuser")
                && name == "Пётр"
                && phone == "79991234567"
                && password.len() == 12
        })
        .times(1)
        .returning(|_, _, _, _, _| true);
    mock_messaging
        .expect_send_registration_complete()
        .withf(|_, name, phone, password| {
            name == "Пётр" && phone == "79991234567" && password.len() == 12
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness
        .set_state(ConversationState::PhoneCaptured {
            name: "Иван".to_string(),
            phone: "79991234567".to_string(),
        })
        .await;

    harness.handle_callback("register").await.unwrap();
    assert_eq!(
        harness.state().await,
        Some(ConversationState::WaitingRegName { phone: Some("79991234567".to_string()) })
    );

    harness.handle_text("Пётр").await.unwrap();
    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_registration_short_name_keeps_step() {
    let mut mock_messaging = MockMessagingService::new();
    let mock_portal = MockPortalService::new();

    mock_messaging.expect_show_prompt().times(1).returning(|_, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.set_state(ConversationState::WaitingRegName { phone: None }).await;
    harness.handle_text("П").await.unwrap();

    assert_eq!(harness.state().await, Some(ConversationState::WaitingRegName { phone: None }));
}

#[tokio::test]
async fn test_registration_collects_phone_when_missing() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_show_prompt().returning(|_, _, _| Ok(()));
    mock_portal
        .expect_register_user()
        .withf(|_, _, name, phone, _| name == "Пётр" && phone == "79991234567")
        .times(1)
        .returning(|_, _, _, _, _| true);
    mock_messaging.expect_send_registration_complete().times(1).returning(|_, _, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.set_state(ConversationState::WaitingRegName { phone: None }).await;

    harness.handle_text("Пётр").await.unwrap();
    assert_eq!(
        harness.state().await,
        Some(ConversationState::WaitingRegPhone { name: "Пётр".to_string() })
    );

    harness.handle_text("8 (999) 123-45-67").await.unwrap();
    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_registration_failure_reports_and_clears() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal.expect_register_user().returning(|_, _, _, _, _| false);
    mock_messaging.expect_send_text().times(1).returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness
        .set_state(ConversationState::WaitingRegName { phone: Some("79991234567".to_string()) })
        .await;
    harness.handle_text("Пётр").await.unwrap();

    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_new_request_for_registered_user_starts_car_step() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_portal.expect_find_user_by_telegram().returning(|_| Some(portal_user()));
    mock_messaging
        .expect_show_prompt()
        .withf(|_, message_id, _| message_id.is_some())
        .times(1)
        .returning(|_, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_callback("new_request").await.unwrap();

    assert_eq!(
        harness.state().await,
        Some(ConversationState::WaitingCar { identity: known_identity() })
    );
}

#[tokio::test]
async fn test_new_request_without_identity_asks_for_phone() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_portal.expect_find_user_by_telegram().returning(|_| None);
    mock_messaging.expect_send_contact_request().times(1).returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_callback("new_request").await.unwrap();

    assert_eq!(harness.state().await, Some(ConversationState::WaitingPhoneText));
}

#[tokio::test]
async fn test_request_flow_happy_path_with_year_retries() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_show_prompt().returning(|_, _, _| Ok(()));
    mock_portal
        .expect_create_request()
        .withf(|user_id, name, phone, email, car, year, description| {
            *user_id == Some(1)
                && name == "Иван"
                && phone == "79991234567"
                && email.is_none()
                && car == "Kia Sorento"
                && *year == Some(2021)
                && description == "Не работает русификация меню"
        })
        .times(1)
        .returning(|_, _, _, _, _, _, _| Some(7));
    mock_messaging
        .expect_notify_admin_new_request()
        .with(
            eq(7),
            eq("Иван"),
            eq("79991234567"),
            eq("Kia Sorento"),
            eq("Не работает русификация меню"),
        )
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));
    mock_messaging.expect_send_request_created().with(eq(CHAT_ID), eq(7)).times(1).returning(
        |_, _| Ok(()),
    );

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.set_state(ConversationState::WaitingCar { identity: known_identity() }).await;

    harness.handle_text("Kia Sorento").await.unwrap();
    let year_step = ConversationState::WaitingCarYear {
        identity: known_identity(),
        car: "Kia Sorento".to_string(),
    };
    assert_eq!(harness.state().await, Some(year_step.clone()));

    // Invalid years re-prompt without touching the captured fields.
    harness.handle_text("abcd").await.unwrap();
    assert_eq!(harness.state().await, Some(year_step.clone()));
    harness.handle_text("1800").await.unwrap();
    assert_eq!(harness.state().await, Some(year_step));

    harness.handle_text("2021").await.unwrap();
    assert_eq!(
        harness.state().await,
        Some(ConversationState::WaitingMessage {
            identity: known_identity(),
            car: "Kia Sorento".to_string(),
            car_year: 2021,
        })
    );

    harness.handle_text("Не работает русификация меню").await.unwrap();
    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_request_creation_failure_reports_and_clears() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal.expect_create_request().returning(|_, _, _, _, _, _, _| None);
    mock_messaging.expect_send_text().times(1).returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness
        .set_state(ConversationState::WaitingMessage {
            identity: RequestIdentity::Anonymous {
                name: "Иван".to_string(),
                phone: "79991234567".to_string(),
            },
            car: "Kia Sorento".to_string(),
            car_year: 2021,
        })
        .await;
    harness.handle_text("Не работает русификация").await.unwrap();

    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_admin_notification_failure_does_not_block_confirmation() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal.expect_create_request().returning(|_, _, _, _, _, _, _| Some(9));
    mock_messaging
        .expect_notify_admin_new_request()
        .returning(|_, _, _, _, _| Err(api_error()));
    mock_messaging.expect_send_request_created().with(eq(CHAT_ID), eq(9)).times(1).returning(
        |_, _| Ok(()),
    );

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness
        .set_state(ConversationState::WaitingMessage {
            identity: known_identity(),
            car: "Kia Sorento".to_string(),
            car_year: 2021,
        })
        .await;

    harness.handle_text("Описание").await.unwrap();
    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_cancel_clears_state_entirely() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_portal.expect_find_user_by_telegram().returning(|_| None);
    mock_messaging
        .expect_show_main_menu()
        .withf(|_, message_id, _, registered| message_id.is_some() && !*registered)
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness
        .set_state(ConversationState::WaitingCarYear {
            identity: known_identity(),
            car: "Kia Sorento".to_string(),
        })
        .await;
    harness.handle_callback("cancel").await.unwrap();

    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_my_requests_lists_user_requests() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_portal
        .expect_list_requests_by_telegram()
        .with(eq(TELEGRAM_ID))
        .returning(|_| vec![pending_request(7, Some(1))]);
    mock_messaging
        .expect_show_requests_list()
        .withf(|_, _, requests| requests.len() == 1 && requests[0].id == 7)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_callback("my_requests").await.unwrap();
}

#[tokio::test]
async fn test_forgot_password_delivers_new_password() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_portal.expect_find_user_by_telegram().returning(|_| Some(portal_user()));
    mock_portal
        .expect_reset_password()
        .with(eq(1))
        .times(1)
        .returning(|_| Some("newpassword1".to_string()));
    mock_messaging
        .expect_send_new_password()
        .with(eq(CHAT_ID), eq("newpassword1".to_string()))
        .times(1)
        .returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_callback("forgot_password").await.unwrap();
}

#[tokio::test]
async fn test_forgot_password_without_account() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_portal.expect_find_user_by_telegram().returning(|_| None);
    mock_messaging.expect_send_text().times(1).returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_callback("forgot_password").await.unwrap();
}

#[tokio::test]
async fn test_admin_reply_appends_and_notifies_linked_client() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_messaging.expect_show_prompt().returning(|_, _, _| Ok(()));
    mock_portal
        .expect_append_message()
        .with(eq(7), eq(SenderType::Company), eq("Готово, можно забирать"))
        .times(1)
        .returning(|_, _, _| true);
    mock_portal
        .expect_request_with_user()
        .with(eq(7))
        .returning(|_| Some((pending_request(7, Some(1)), Some(user_with_telegram(Some(555))))));
    mock_messaging
        .expect_notify_client_reply()
        .with(eq(ChatId(555)), eq(7), eq("Готово, можно забирать"))
        .times(1)
        .returning(|_, _, _| Ok(()));
    mock_messaging.expect_send_text().returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_callback("admin_reply_7").await.unwrap();
    assert_eq!(harness.state().await, Some(ConversationState::WaitingAdminReply { request_id: 7 }));

    harness.handle_text("Готово, можно забирать").await.unwrap();
    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_admin_reply_without_linked_telegram_is_silent() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal.expect_append_message().returning(|_, _, _| true);
    mock_portal
        .expect_request_with_user()
        .returning(|_| Some((pending_request(7, Some(1)), Some(user_with_telegram(None)))));
    // No notify_client_reply expectation: calling it would fail the test.
    mock_messaging.expect_send_text().times(1).returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.set_state(ConversationState::WaitingAdminReply { request_id: 7 }).await;
    harness.handle_text("Готово").await.unwrap();

    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_client_reply_appends_and_notifies_admin() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));
    mock_messaging.expect_show_prompt().returning(|_, _, _| Ok(()));
    mock_portal
        .expect_append_message()
        .with(eq(7), eq(SenderType::Client), eq("Когда будет готово?"))
        .times(1)
        .returning(|_, _, _| true);
    mock_portal
        .expect_request_with_user()
        .with(eq(7))
        .returning(|_| Some((pending_request(7, Some(1)), Some(portal_user()))));
    mock_messaging
        .expect_notify_admin_client_reply()
        .with(eq(7), eq("Иван"), eq("Когда будет готово?"))
        .times(1)
        .returning(|_, _, _| Ok(()));
    mock_messaging.expect_send_text().returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_callback("reply_7").await.unwrap();
    assert_eq!(harness.state().await, Some(ConversationState::WaitingReply { request_id: 7 }));

    harness.handle_text("Когда будет готово?").await.unwrap();
    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_client_reply_append_failure_reports_error() {
    let mut mock_messaging = MockMessagingService::new();
    let mut mock_portal = MockPortalService::new();

    mock_portal.expect_append_message().returning(|_, _, _| false);
    mock_messaging.expect_send_text().times(1).returning(|_, _| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.set_state(ConversationState::WaitingReply { request_id: 7 }).await;
    harness.handle_text("Привет").await.unwrap();

    assert_eq!(harness.state().await, None);
}

#[tokio::test]
async fn test_unknown_callback_data_is_an_error() {
    let mut mock_messaging = MockMessagingService::new();
    let mock_portal = MockPortalService::new();

    mock_messaging.expect_answer_callback_query().returning(|_| Ok(()));

    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    let result = harness.handle_callback("bogus").await;

    assert!(matches!(result, Err(BotHandlerError::UnknownCallback(_))));
}

#[tokio::test]
async fn test_message_outside_dialogue_is_ignored() {
    let mock_messaging = MockMessagingService::new();
    let mock_portal = MockPortalService::new();

    // No expectations at all: any service call would fail the test.
    let harness = TestHarness::new(mock_messaging, mock_portal).await;
    harness.handle_text("Просто сообщение").await.unwrap();

    assert_eq!(harness.state().await, None);
}
