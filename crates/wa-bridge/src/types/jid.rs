//! Helpers for WhatsApp addresses (jids).

/// Domain suffix of individual user addresses.
pub const USER_SERVER: &str = "s.whatsapp.net";

/// Domain suffix of group addresses.
pub const GROUP_SERVER: &str = "g.us";

/// Whether the jid addresses a group chat.
pub fn is_group_jid(jid: &str) -> bool {
    jid.ends_with("@g.us")
}

/// Strip the transport suffix (and any device part) from a jid.
///
/// `5215512345678:12@s.whatsapp.net` becomes `5215512345678`.
pub fn bare_number(jid: &str) -> &str {
    let user = jid.split('@').next().unwrap_or(jid);
    user.split(':').next().unwrap_or(user)
}

/// Build a jid for a recipient given either a bare number or a full jid.
pub fn to_jid(recipient: &str) -> String {
    if recipient.contains('@') {
        recipient.to_string()
    } else {
        let digits: String = recipient.chars().filter(|c| c.is_ascii_digit()).collect();
        format!("{}@{}", digits, USER_SERVER)
    }
}
