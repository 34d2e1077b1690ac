//! Cache key namespace.
//!
//! Every key the crate writes is `{prefix}{segment}{user_id}`, so a scan
//! over the configured prefix only ever touches workshelf-owned keys on a
//! shared store.

/// Segment identifying per-user view entries under the configured prefix.
pub const USER_VIEW_SEGMENT: &str = "models:user:";

/// Key holding one user's access-filtered view.
pub fn user_view_key(prefix: &str, user_id: &str) -> String {
    format!("{prefix}{USER_VIEW_SEGMENT}{user_id}")
}

/// Prefix covering every per-user view entry, for bulk deletion.
pub fn user_view_prefix(prefix: &str) -> String {
    format!("{prefix}{USER_VIEW_SEGMENT}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_view_key_shape() {
        assert_eq!(
            user_view_key("workshelf:cache:", "u1"),
            "workshelf:cache:models:user:u1"
        );
    }

    #[test]
    fn view_keys_fall_under_view_prefix() {
        let key = user_view_key("p:", "u1");
        assert!(key.starts_with(&user_view_prefix("p:")));
    }
}
