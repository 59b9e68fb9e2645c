use base64::prelude::*;
use css_authn::{
    FetchConfig, NewAccount, create_account,
    credentials::CredentialExchangeError,
    fetch::GetAuthenticatedFetchError,
    get_authenticated_fetch,
    grant::{ClientCredentialsGrantError, TokenAcquisitionError},
    account::WebIdSelectionError,
    prelude::*,
    provider::ProviderUrl,
    secrecy::SecretString,
};
use http::StatusCode;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

const COMPACT_JWS: &str = r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$";

fn json_body(value: &serde_json::Value) -> String {
    value.to_string()
}

fn config(server: &ServerGuard, web_id: Option<String>) -> FetchConfig {
    FetchConfig::builder()
        .oidc_issuer(format!("{}/", server.url()))
        .email("alice@example.org")
        .password(SecretString::from("abc123"))
        .maybe_web_id(web_id)
        .build()
}

/// Mocks the account API login up to and including the WebID listing.
async fn mock_login(server: &mut ServerGuard, linked_web_id: &str) -> Vec<Mock> {
    let url = server.url();
    vec![
        server
            .mock("GET", "/.account/")
            .match_header("authorization", Matcher::Missing)
            .match_header("cookie", Matcher::Missing)
            .with_header("content-type", "application/json")
            .with_body(json_body(&json!({
                "controls": { "password": { "login": format!("{url}/.account/login/password/") } }
            })))
            .create_async()
            .await,
        server
            .mock("POST", "/.account/login/password/")
            .match_body(Matcher::Json(
                json!({"email": "alice@example.org", "password": "abc123"}),
            ))
            .with_header("content-type", "application/json")
            .with_body(json_body(&json!({"authorization": "account-token"})))
            .create_async()
            .await,
        server
            .mock("GET", "/.account/")
            .match_header("authorization", "CSS-Account-Token account-token")
            .with_header("content-type", "application/json")
            .with_body(json_body(&json!({
                "controls": { "account": {
                    "webId": format!("{url}/.account/account/1/webid/"),
                    "clientCredentials": format!("{url}/.account/account/1/client-credentials/")
                } }
            })))
            .create_async()
            .await,
        server
            .mock("GET", "/.account/account/1/webid/")
            .match_header("authorization", "CSS-Account-Token account-token")
            .with_header("content-type", "application/json")
            .with_body(json_body(&json!({
                "webIdLinks": { linked_web_id: format!("{url}/.account/account/1/webid/1/") }
            })))
            .create_async()
            .await,
    ]
}

#[tokio::test]
async fn authenticated_put_then_get_round_trips() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let web_id = format!("{url}/alice/profile/card#me");

    let login = mock_login(&mut server, &web_id).await;
    let mint = server
        .mock("POST", "/.account/account/1/client-credentials/")
        .match_header("authorization", "CSS-Account-Token account-token")
        .match_body(Matcher::Json(json!({"name": "my-token", "webId": web_id})))
        .with_header("content-type", "application/json")
        .with_body(json_body(&json!({
            "id": "my-token_1",
            "secret": "s3cr3t",
            "resource": format!("{url}/.account/account/1/client-credentials/1/")
        })))
        .create_async()
        .await;
    let token = server
        .mock("POST", "/.oidc/token")
        .match_header(
            "authorization",
            format!("Basic {}", BASE64_STANDARD.encode("my-token_1:s3cr3t")).as_str(),
        )
        .match_header("dpop", Matcher::Regex(COMPACT_JWS.into()))
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("grant_type=client_credentials&scope=webid")
        .with_header("content-type", "application/json")
        .with_body(json_body(&json!({
            "access_token": "access-1",
            "expires_in": 600,
            "token_type": "DPoP",
            "scope": "webid"
        })))
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/alice/notes.txt")
        .match_header("authorization", "DPoP access-1")
        .match_header("dpop", Matcher::Regex(COMPACT_JWS.into()))
        .match_body("Hello, pod")
        .with_status(201)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/alice/notes.txt")
        .match_header("authorization", "DPoP access-1")
        .match_header("dpop", Matcher::Regex(COMPACT_JWS.into()))
        .with_header("content-type", "text/plain")
        .with_body("Hello, pod")
        .create_async()
        .await;

    let client = get_authenticated_fetch(&config(&server, None), reqwest::Client::new())
        .await
        .unwrap();

    let resource = format!("{url}/alice/notes.txt");
    let response = client
        .execute(
            http::Request::builder()
                .method(http::Method::PUT)
                .uri(&resource)
                .body(css_authn::Bytes::from_static(b"Hello, pod"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .execute(
            http::Request::builder()
                .uri(&resource)
                .body(css_authn::Bytes::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().await.unwrap(), "Hello, pod");

    for mock in login.iter().chain([&mint, &token, &put, &get]) {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn resource_errors_are_returned_not_raised() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let web_id = format!("{url}/alice/profile/card#me");

    let _login = mock_login(&mut server, &web_id).await;
    let _mint = server
        .mock("POST", "/.account/account/1/client-credentials/")
        .with_body(json_body(&json!({"id": "id", "secret": "secret"})))
        .create_async()
        .await;
    let _token = server
        .mock("POST", "/.oidc/token")
        .with_body(json_body(&json!({"access_token": "access-1", "token_type": "DPoP"})))
        .create_async()
        .await;
    let forbidden = server
        .mock("GET", "/private/")
        .with_status(403)
        .with_body("not for you")
        .create_async()
        .await;

    let client = get_authenticated_fetch(&config(&server, Some(web_id)), reqwest::Client::new())
        .await
        .unwrap();

    let response = client
        .execute(
            http::Request::builder()
                .uri(format!("{url}/private/"))
                .body(css_authn::Bytes::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.body().await.unwrap(), "not for you");
    forbidden.assert_async().await;
}

#[tokio::test]
async fn token_endpoint_rejection_is_reported_verbatim() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let web_id = format!("{url}/alice/profile/card#me");

    let _login = mock_login(&mut server, &web_id).await;
    let _mint = server
        .mock("POST", "/.account/account/1/client-credentials/")
        .with_body(json_body(&json!({"id": "id", "secret": "secret"})))
        .create_async()
        .await;
    let _token = server
        .mock("POST", "/.oidc/token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_client","error_description":"no such client"}"#)
        .create_async()
        .await;

    let err = get_authenticated_fetch(&config(&server, None), reqwest::Client::new())
        .await
        .unwrap_err();

    let GetAuthenticatedFetchError::Token {
        source: TokenAcquisitionError::Grant { source },
    } = &err
    else {
        panic!("expected a token error, got {err:?}");
    };
    assert_eq!(source.oauth2_error().unwrap().error, "invalid_client");
    let ClientCredentialsGrantError::Send { source } = source else {
        panic!("expected a rejected request, got {source:?}");
    };
    let (status, body) = source.upstream_failure().unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.as_ref(),
        br#"{"error":"invalid_client","error_description":"no such client"}"#
    );
    assert!(!css_authn::Error::is_retryable(&err));
}

#[tokio::test]
async fn unlinked_webid_fails_before_token_endpoint() {
    let mut server = Server::new_async().await;
    let url = server.url();

    let _login = mock_login(&mut server, &format!("{url}/alice/profile/card#me")).await;
    let mint = server
        .mock("POST", "/.account/account/1/client-credentials/")
        .expect(0)
        .create_async()
        .await;
    let token = server
        .mock("POST", "/.oidc/token")
        .expect(0)
        .create_async()
        .await;

    let err = get_authenticated_fetch(
        &config(&server, Some(format!("{url}/bob/profile/card#me"))),
        reqwest::Client::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        GetAuthenticatedFetchError::Credentials {
            source: CredentialExchangeError::WebId {
                source: WebIdSelectionError::WebIdNotLinked { .. }
            }
        }
    ));
    mint.assert_async().await;
    token.assert_async().await;
}

#[tokio::test]
async fn create_account_then_authenticate() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let web_id = format!("{url}/alice/profile/card#me");

    let create = server
        .mock("POST", "/.account/account/")
        .match_header("cookie", Matcher::Missing)
        .with_header("set-cookie", "css-account=cookie-1; Path=/; HttpOnly; SameSite=Lax")
        .with_header("content-type", "application/json")
        .with_body(json_body(&json!({"resource": format!("{url}/.account/account/1/")})))
        .create_async()
        .await;
    let controls = server
        .mock("GET", "/.account/")
        .match_header("cookie", "css-account=cookie-1")
        .with_header("content-type", "application/json")
        .with_body(json_body(&json!({
            "controls": {
                "password": { "create": format!("{url}/.account/account/1/login/password/") },
                "account": { "pod": format!("{url}/.account/account/1/pod/") }
            }
        })))
        .create_async()
        .await;
    let password = server
        .mock("POST", "/.account/account/1/login/password/")
        .match_header("cookie", "css-account=cookie-1")
        .match_body(Matcher::Json(json!({
            "email": "alice@example.org",
            "password": "abc123",
            "confirmPassword": "abc123"
        })))
        .with_body(json_body(&json!({
            "resource": format!("{url}/.account/account/1/login/password/1/")
        })))
        .create_async()
        .await;
    let pod = server
        .mock("POST", "/.account/account/1/pod/")
        .match_header("cookie", "css-account=cookie-1")
        .match_body(Matcher::Json(json!({"name": "alice"})))
        .with_header("content-type", "application/json")
        .with_body(json_body(&json!({
            "pod": format!("{url}/alice/"),
            "webId": web_id,
            "podResource": format!("{url}/.account/account/1/pod/1/"),
            "webIdResource": format!("{url}/.account/account/1/webid/1/")
        })))
        .create_async()
        .await;

    let account = NewAccount::builder()
        .username("alice")
        .password("abc123")
        .email("alice@example.org")
        .provider(ProviderUrl::parse(&url).unwrap())
        .build();
    let descriptor = create_account(account, &reqwest::Client::new())
        .await
        .unwrap();

    assert_eq!(descriptor.idp.as_str(), format!("{url}/"));
    assert_eq!(descriptor.pod_url, format!("{url}/alice/"));
    assert_eq!(descriptor.web_id, web_id);
    for mock in [&create, &controls, &password, &pod] {
        mock.assert_async().await;
    }

    let _login = mock_login(&mut server, &web_id).await;
    let _mint = server
        .mock("POST", "/.account/account/1/client-credentials/")
        .match_body(Matcher::PartialJson(json!({"webId": web_id})))
        .with_body(json_body(&json!({"id": "id", "secret": "secret"})))
        .create_async()
        .await;
    let token = server
        .mock("POST", "/.oidc/token")
        .with_body(json_body(&json!({"access_token": "access-1", "token_type": "DPoP"})))
        .create_async()
        .await;

    let client = get_authenticated_fetch(&descriptor.to_fetch_config(), reqwest::Client::new())
        .await
        .unwrap();

    assert_eq!(client.token().access_token().expose_token(), "access-1");
    token.assert_async().await;
}

#[tokio::test]
async fn missing_session_cookie() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/.account/account/")
        .with_body("{}")
        .create_async()
        .await;

    let account = NewAccount::builder()
        .username("alice")
        .password("abc123")
        .email("alice@example.org")
        .provider(ProviderUrl::parse(&server.url()).unwrap())
        .build();
    let err = create_account(account, &reqwest::Client::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        css_authn::account::CreateAccountError::MissingSessionCookie
    ));
}
