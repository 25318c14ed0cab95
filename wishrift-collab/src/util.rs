use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Length of wishlist share tokens, roughly 71 bits of entropy
pub const SHARE_ID_LENGTH: usize = 12;

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// Generates a URL-safe token used to share a wishlist
pub fn share_id() -> String {
    random_string(SHARE_ID_LENGTH)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn share_ids_are_url_safe() {
        let id = share_id();

        assert_eq!(id.len(), SHARE_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn share_ids_do_not_collide() {
        let ids: HashSet<_> = (0..10_000).map(|_| share_id()).collect();

        assert_eq!(ids.len(), 10_000);
    }
}
