//! Per-request session identifiers. The API expects browser-shaped perseus
//! ids and a base64 JSON dps token; none of them are validated server-side
//! beyond their shape.

use base64::Engine;
use chrono::Utc;
use rand::Rng;

/// `{unix millis}.{16 random digits}.{10 random base36 chars}`
pub fn perseus_client_id() -> String {
    perseus_id()
}

/// Same shape as the client id; generated independently per request.
pub fn perseus_session_id() -> String {
    perseus_id()
}

fn perseus_id() -> String {
    let mut rng = rand::thread_rng();
    let timestamp = Utc::now().timestamp_millis();
    let random: String = (0..16).map(|_| rng.gen_range(0..10).to_string()).collect();
    let suffix: String = (0..10)
        .map(|_| {
            let n = rng.gen_range(0..36u32);
            std::char::from_digit(n, 36).unwrap_or('0')
        })
        .collect();
    format!("{timestamp}.{random}.{suffix}")
}

/// Base64 of `{"session_id": <32 hex chars>, "perseus_id": ..., "timestamp": <unix secs>}`.
pub fn dps_session_id(perseus_client_id: &str) -> String {
    let mut rng = rand::thread_rng();
    let session_id: String = (0..32)
        .map(|_| {
            let n = rng.gen_range(0..16u32);
            std::char::from_digit(n, 16).unwrap_or('0')
        })
        .collect();
    let payload = serde_json::json!({
        "session_id": session_id,
        "perseus_id": perseus_client_id,
        "timestamp": Utc::now().timestamp(),
    });
    base64::engine::general_purpose::STANDARD.encode(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn perseus_id_has_three_dot_parts() {
        let id = perseus_client_id();
        let parts: Vec<&str> = id.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[1].len(), 16);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 10);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn dps_token_decodes_to_session_json() {
        let client_id = perseus_client_id();
        let token = dps_session_id(&client_id);
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(token)
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        let session = payload["session_id"].as_str().unwrap();
        assert_eq!(session.len(), 32);
        assert!(session.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(payload["perseus_id"].as_str().unwrap(), client_id);
        assert!(payload["timestamp"].as_i64().unwrap() > 0);
    }
}
