/// Actions carried in inline-button `callback_data` strings.
///
/// The wire form is a plain string (64-byte Bot API limit). Reply actions
/// encode the target request id as a literal integer suffix so the admin
/// panel and the bot agree on the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    MainMenu,
    Register,
    NewRequest,
    MyRequests,
    Cancel,
    ForgotPassword,
    /// Client-side reply to a request thread.
    Reply(i64),
    /// Company-side reply, pressed in the admin channel.
    AdminReply(i64),
}

impl CallbackAction {
    /// Decodes a `callback_data` string. Unknown strings are `None`, not an
    /// error: buttons from older bot revisions may still be pressed.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "main_menu" => Some(Self::MainMenu),
            "register" => Some(Self::Register),
            "new_request" => Some(Self::NewRequest),
            "my_requests" => Some(Self::MyRequests),
            "cancel" => Some(Self::Cancel),
            "forgot_password" => Some(Self::ForgotPassword),
            _ => {
                if let Some(id) = data.strip_prefix("admin_reply_") {
                    id.parse().ok().map(Self::AdminReply)
                } else if let Some(id) = data.strip_prefix("reply_") {
                    id.parse().ok().map(Self::Reply)
                } else {
                    None
                }
            }
        }
    }

    /// Encodes the action for a keyboard button.
    pub fn as_data(&self) -> String {
        match self {
            Self::MainMenu => "main_menu".to_string(),
            Self::Register => "register".to_string(),
            Self::NewRequest => "new_request".to_string(),
            Self::MyRequests => "my_requests".to_string(),
            Self::Cancel => "cancel".to_string(),
            Self::ForgotPassword => "forgot_password".to_string(),
            Self::Reply(request_id) => format!("reply_{request_id}"),
            Self::AdminReply(request_id) => format!("admin_reply_{request_id}"),
        }
    }
}
