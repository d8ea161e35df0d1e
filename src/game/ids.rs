use uuid::Uuid;

pub fn new_game_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Shareable URL the host hands to their opponent.
pub fn invite_link(base_url: &str, game_id: &str) -> String {
    format!("{}/game/{}", base_url.trim_end_matches('/'), game_id)
}

/// Accepts a bare game id or a full invite link.
pub fn game_id_from_link(input: &str) -> &str {
    let input = input.trim().trim_end_matches('/');
    match input.rsplit_once("/game/") {
        Some((_, id)) => id.split(['?', '#']).next().unwrap_or(id),
        None => input,
    }
}
