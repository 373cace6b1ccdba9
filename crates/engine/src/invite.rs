/// Shareable link that opens the join screen prefilled with `game_id`.
pub fn invite_url(base: &str, game_id: &str) -> String {
    format!("{}/?gameId={game_id}", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        assert_eq!(
            invite_url("https://boardlink.example/", "ABC123"),
            "https://boardlink.example/?gameId=ABC123"
        );
        assert_eq!(
            invite_url("http://localhost:8080", "XYZ789"),
            "http://localhost:8080/?gameId=XYZ789"
        );
    }
}
