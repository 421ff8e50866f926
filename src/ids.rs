use uuid::Uuid;

/// Generate a prefixed opaque identifier, e.g. `activity_9f0c4b...`.
pub fn generate(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefix_and_do_not_collide() {
        let a = generate("activity");
        let b = generate("activity");
        assert!(a.starts_with("activity_"));
        assert_ne!(a, b);
    }
}
