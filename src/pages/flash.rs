use actix_web::cookie::Key;
use actix_web_flash_messages::{
    FlashMessagesFramework, IncomingFlashMessages, Level, storage::CookieMessageStore,
};
use serde::Serialize;

/// Flash messages live in a cookie signed with the session secret.
pub fn message_framework(secret: &str) -> FlashMessagesFramework {
    let store = CookieMessageStore::builder(Key::derive_from(secret.as_bytes())).build();
    FlashMessagesFramework::builder(store).build()
}

#[derive(Debug, Serialize)]
pub struct Flash {
    pub kind: &'static str,
    pub message: String,
}

pub fn collect(messages: &IncomingFlashMessages) -> Vec<Flash> {
    messages
        .iter()
        .map(|m| Flash {
            kind: match m.level() {
                Level::Error => "error",
                Level::Warning => "warning",
                Level::Success => "success",
                _ => "info",
            },
            message: m.content().to_string(),
        })
        .collect()
}
