/// Application name
pub const APP_NAME: &str = "Causerie";

/// Maximum image attachment size in bytes (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Directory store path roots
pub const CHATS_PATH: &str = "chats";
pub const MESSAGES_PATH: &str = "messages";
pub const USERS_PATH: &str = "users";

/// Blob store folder for message image attachments
pub const CHAT_IMAGES_PATH: &str = "chat_images";
