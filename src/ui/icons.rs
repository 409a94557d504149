pub struct Icons;

impl Icons {
    pub const CHAT: &str = "💬";
    pub const CHECK: &str = "✅";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const DATABASE: &str = "🗄️";
    pub const PERSON: &str = "👤";
    pub const ROBOT: &str = "🤖";
    pub const STAR: &str = "⭐";
}

/// Icon shown next to a message, by role
pub fn role_icon(role: &str) -> &'static str {
    match role {
        "user" => Icons::PERSON,
        "assistant" => Icons::ROBOT,
        _ => Icons::CHAT,
    }
}
