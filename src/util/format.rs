/// Abbreviate a commit id for log output
pub fn short_commit(commit: &str) -> &str {
    match commit.char_indices().nth(8) {
        Some((idx, _)) => &commit[..idx],
        None => commit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_commit() {
        assert_eq!(short_commit("0123456789abcdef"), "01234567");
        assert_eq!(short_commit("c1"), "c1");
        assert_eq!(short_commit(""), "");
    }
}
