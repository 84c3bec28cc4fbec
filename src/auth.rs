//! Allow-list check applied to every inbound update.

/// Exact, case-sensitive username match. Users without a username never pass.
pub fn is_authorized(username: Option<&str>, allow_list: &[String]) -> bool {
    match username {
        Some(name) => allow_list.iter().any(|allowed| allowed == name),
        None => false,
    }
}
