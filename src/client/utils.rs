use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::client::config::Config;
use crate::client::consts::AUTHORIZATION_HEADER;

pub fn build_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    let mut request = config.url().into_client_request()?;
    let token = config.token().expose_secret();
    if !token.is_empty() {
        request
            .headers_mut()
            .insert(AUTHORIZATION_HEADER, format!("Bearer {}", token).as_str().parse()?);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header_only_with_token() {
        let config = Config::builder().with_url("ws://127.0.0.1:1/voice").with_token("abc").build();
        let request = build_request(&config).unwrap();
        assert_eq!(request.headers()[AUTHORIZATION_HEADER], "Bearer abc");
        assert_eq!(request.uri().path(), "/voice");

        let config = Config::builder().with_url("ws://127.0.0.1:1/voice").with_token("").build();
        let request = build_request(&config).unwrap();
        assert!(request.headers().get(AUTHORIZATION_HEADER).is_none());
    }
}
