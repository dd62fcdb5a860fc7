use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ::http::Method;
use ::http::header::AUTHORIZATION;

use super::*;

#[derive(Debug, Clone, Default)]
struct FakeHttpClient {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl FakeHttpClient {
    fn respond(body: &str, content_type: &str) -> Self {
        Self::default().then_respond(body, content_type)
    }

    fn then_respond(self, body: &str, content_type: &str) -> Self {
        let response = HttpResponse::new(body).with_content_type(content_type);
        self.responses
            .lock()
            .expect("lock")
            .push_back(Ok(response));
        self
    }

    fn fail(message: &str) -> Self {
        let client = Self::default();
        client
            .responses
            .lock()
            .expect("lock")
            .push_back(Err(TransportError::new(message)));
        client
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock").clone()
    }

    fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("Should have sent a request")
    }
}

impl HttpClient for FakeHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().expect("lock").push(request);
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no response configured")))
    }
}

#[derive(Debug)]
struct CustomUserResponse {
    data: UserResponseData,
}

impl UserResponse for CustomUserResponse {
    fn data(&self) -> &UserResponseData {
        &self.data
    }

    fn username(&self) -> Option<String> {
        Some("foo666".to_string())
    }

    fn nickname(&self) -> Option<String> {
        Some("foo".to_string())
    }
}

fn custom_user_response(data: UserResponseData) -> Result<Box<dyn UserResponse>, MalformedResponse> {
    Ok(Box::new(CustomUserResponse { data }))
}

#[derive(Debug)]
struct StrictUserResponse {
    data: UserResponseData,
}

impl UserResponse for StrictUserResponse {
    fn data(&self) -> &UserResponseData {
        &self.data
    }
}

fn strict_user_response(data: UserResponseData) -> Result<Box<dyn UserResponse>, MalformedResponse> {
    data.require(IDENTIFIER)?;
    Ok(Box::new(StrictUserResponse { data }))
}

type TestResourceOwner = ResourceOwner<FakeHttpClient, SessionTokenStorage>;

fn default_options() -> OptionsBuilder {
    Options::builder()
        .with_infos_url("http://user.info/")
        .and_then(|builder| builder.with_request_token_url("http://user.request/"))
        .and_then(|builder| builder.with_authorization_url("http://user.auth/"))
        .and_then(|builder| builder.with_access_token_url("http://user.access/"))
        .expect("valid URLs")
        .with_client_id("clientid")
        .with_client_secret("clientsecret")
        .with_scope("")
}

fn default_paths() -> Paths {
    Paths::new()
        .with(IDENTIFIER, "id")
        .with(NICKNAME, "foo")
        .with(REALNAME, "foo_disp")
}

fn create_resource_owner(options: OptionsBuilder, http: FakeHttpClient) -> TestResourceOwner {
    let registry = UserResponseRegistry::default()
        .register("CustomUserResponse", custom_user_response)
        .register("StrictUserResponse", strict_user_response);

    let storage = InMemoryTokenStorage::new();
    ResourceOwner::builder("oauth1", options.build().expect("Should build options"))
        .with_paths(default_paths())
        .with_registry(registry)
        .build(http, storage.session("session"))
        .expect("Should build resource owner")
}

fn authorization(request: &HttpRequest) -> String {
    request
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .expect("Should have an Authorization header")
        .to_string()
}

fn callback() -> CallbackParameters {
    CallbackParameters::from_query("oauth_token=token&oauth_verifier=code").expect("valid query")
}

async fn store_request_token(owner: &TestResourceOwner) {
    owner
        .storage()
        .save(owner.name(), RequestToken::new("token", "secret"))
        .await;
}

#[test]
fn should_get_option() {
    let owner = create_resource_owner(default_options(), FakeHttpClient::default());
    assert_eq!(owner.option(INFOS_URL), Ok("http://user.info/"));
}

#[test]
fn should_fail_on_invalid_option() {
    let owner = create_resource_owner(default_options(), FakeHttpClient::default());
    assert_eq!(
        owner.option("non_existing"),
        Err(ConfigurationError::UnknownOption {
            name: "non_existing".to_string()
        })
    );
}

#[test]
fn should_get_and_set_name() {
    let mut owner = create_resource_owner(default_options(), FakeHttpClient::default());
    assert_eq!(owner.name(), "oauth1");

    owner.set_name("foo");

    assert_eq!(owner.name(), "foo");
    assert_eq!(owner.option(CLIENT_ID), Ok("clientid"));
}

#[test]
fn should_add_paths() {
    let mut owner = create_resource_owner(default_options(), FakeHttpClient::default());
    owner.add_paths(Paths::new().with(EMAIL, "contact.email"));
    owner.add_paths(Paths::new().with(NICKNAME, "screen_name"));

    assert_eq!(owner.paths().len(), 4);
    assert_eq!(owner.paths().get(IDENTIFIER), Some(&FieldPath::from("id")));
    assert_eq!(owner.paths().get(EMAIL), Some(&FieldPath::from("contact.email")));
    assert_eq!(owner.paths().get(NICKNAME), Some(&FieldPath::from("screen_name")));
}

#[test]
fn should_detect_handled_callback() {
    let owner = create_resource_owner(default_options(), FakeHttpClient::default());
    assert!(owner.handles(&callback()));
    assert!(!owner.handles(&CallbackParameters::default().with("code", "code")));
}

#[test]
fn should_fail_on_unknown_user_response_type() {
    let options = default_options()
        .with_user_response_class("UnregisteredUserResponse")
        .build()
        .expect("Should build options");

    let result = ResourceOwner::builder("oauth1", options).build(
        FakeHttpClient::default(),
        InMemoryTokenStorage::new().session("session"),
    );

    assert!(matches!(
        result,
        Err(ConfigurationError::UnknownUserResponse { .. })
    ));
}

#[tokio::test]
async fn should_build_authorization_url() {
    let http = FakeHttpClient::respond(
        r#"{"oauth_token": "token", "oauth_token_secret": "secret"}"#,
        "application/json; charset=utf-8",
    );
    let owner = create_resource_owner(default_options(), http.clone());

    let url = owner
        .authorization_url("http://redirect.to/", &[])
        .await
        .expect("Should build authorization URL");

    insta::assert_snapshot!(url, @"http://user.auth/?oauth_token=token");

    let stored = owner
        .storage()
        .fetch("oauth1", "token")
        .await
        .expect("Should store the request token");
    assert!(stored.secret().equals_str("secret"));

    let request = http.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url.as_str(), "http://user.request/");
    let header = authorization(&request);
    assert!(header.contains(r#"oauth_callback="http%3A%2F%2Fredirect.to%2F""#));
    assert!(header.contains(r#"oauth_consumer_key="clientid""#));
    assert!(!header.contains("oauth_token="));
}

#[tokio::test]
async fn should_keep_authorization_url_query() {
    let http = FakeHttpClient::respond(
        "oauth_token=token&oauth_token_secret=secret&oauth_callback_confirmed=true",
        "text/plain",
    );
    let options = default_options()
        .with_authorization_url("http://user.auth/authorize?force_login=true")
        .expect("valid URL");
    let owner = create_resource_owner(options, http);

    let url = owner
        .authorization_url("http://redirect.to/", &[])
        .await
        .expect("Should build authorization URL");

    insta::assert_snapshot!(url, @"http://user.auth/authorize?force_login=true&oauth_token=token");
}

#[tokio::test]
async fn should_send_extra_parameters_in_request_token_body() {
    let http = FakeHttpClient::respond("oauth_token=token&oauth_token_secret=secret", "text/plain");
    let owner = create_resource_owner(default_options(), http.clone());

    owner
        .authorization_url("http://redirect.to/", &[("x_auth_access_type", "read")])
        .await
        .expect("Should build authorization URL");

    let request = http.last_request();
    assert_eq!(request.body.as_deref(), Some("x_auth_access_type=read"));
    assert!(!authorization(&request).contains("x_auth_access_type"));
}

#[tokio::test]
async fn should_send_scope_with_request_token() {
    let http = FakeHttpClient::respond("oauth_token=token&oauth_token_secret=secret", "text/plain");
    let options = default_options().with_scope("read write");
    let owner = create_resource_owner(options, http.clone());

    owner
        .authorization_url("http://redirect.to/", &[])
        .await
        .expect("Should build authorization URL");

    let request = http.last_request();
    assert_eq!(request.body.as_deref(), Some("scope=read+write"));
    assert!(!authorization(&request).contains("scope"));
}

#[tokio::test]
async fn should_reject_unconfirmed_callback() {
    let http = FakeHttpClient::respond(
        "oauth_token=token&oauth_token_secret=secret&oauth_callback_confirmed=false",
        "text/plain",
    );
    let owner = create_resource_owner(default_options(), http);

    let result = owner.authorization_url("http://redirect.to/", &[]).await;

    assert_eq!(
        result.err(),
        Some(ResourceOwnerError::Authentication(
            AuthenticationError::CallbackNotConfirmed
        ))
    );
    assert!(owner.storage().fetch("oauth1", "token").await.is_err());
}

#[tokio::test]
async fn should_fail_authorization_url_on_provider_problem() {
    let http = FakeHttpClient::respond("oauth_problem=consumer_key_rejected", "text/plain");
    let owner = create_resource_owner(default_options(), http);

    let result = owner.authorization_url("http://redirect.to/", &[]).await;

    assert_eq!(
        result.err(),
        Some(ResourceOwnerError::Authentication(
            AuthenticationError::ProviderError {
                message: "consumer_key_rejected".to_string()
            }
        ))
    );
}

#[tokio::test]
async fn should_fail_authorization_url_without_request_token() {
    let http = FakeHttpClient::respond(r#"{"oauth_token": "token"}"#, "application/json");
    let owner = create_resource_owner(default_options(), http);

    let result = owner.authorization_url("http://redirect.to/", &[]).await;

    assert!(matches!(
        result,
        Err(ResourceOwnerError::Authentication(
            AuthenticationError::InvalidRequestToken { .. }
        ))
    ));
}

#[tokio::test]
async fn should_get_access_token() {
    let http = FakeHttpClient::respond(
        r#"{"oauth_token": "access", "oauth_token_secret": "access-secret", "user_id": 42}"#,
        "application/json; charset=utf-8",
    );
    let owner = create_resource_owner(default_options(), http.clone());
    store_request_token(&owner).await;

    let access_token = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await
        .expect("Should get access token");

    assert_eq!(access_token.token(), "access");
    assert!(access_token.secret().equals_str("access-secret"));
    assert_eq!(access_token.get("user_id").as_deref(), Some("42"));

    let request = http.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url.as_str(), "http://user.access/");
    let header = authorization(&request);
    assert!(header.contains(r#"oauth_token="token""#));
    assert!(header.contains(r#"oauth_verifier="code""#));
}

#[tokio::test]
async fn should_get_access_token_from_form_response() {
    let http = FakeHttpClient::respond("access_token=code", "text/plain");
    let owner = create_resource_owner(default_options(), http);
    store_request_token(&owner).await;

    let access_token = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await
        .expect("Should get access token");

    assert_eq!(access_token.token(), "code");
    assert!(access_token.secret().is_empty());
}

#[tokio::test]
async fn should_fail_access_token_on_invalid_response() {
    let http = FakeHttpClient::respond("invalid", "text/plain");
    let owner = create_resource_owner(default_options(), http);
    store_request_token(&owner).await;

    let result = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await;

    assert!(matches!(
        result,
        Err(ResourceOwnerError::Authentication(
            AuthenticationError::InvalidAccessToken { .. }
        ))
    ));
}

#[tokio::test]
async fn should_fail_access_token_on_error_response() {
    let http = FakeHttpClient::respond("error=foo", "text/plain");
    let owner = create_resource_owner(default_options(), http);
    store_request_token(&owner).await;

    let error = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await
        .expect_err("Should fail");

    assert!(error.is_authentication());
    insta::assert_snapshot!(error, @r#"OAuth error: "foo""#);
}

#[tokio::test]
async fn should_fail_access_token_on_malformed_json() {
    let http = FakeHttpClient::respond("{not json", "application/json");
    let owner = create_resource_owner(default_options(), http);
    store_request_token(&owner).await;

    let result = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await;

    assert!(matches!(
        result,
        Err(ResourceOwnerError::Authentication(
            AuthenticationError::MalformedResponse(MalformedResponse::InvalidJson { .. })
        ))
    ));
}

#[tokio::test]
async fn should_fail_access_token_without_stored_request_token() {
    let http = FakeHttpClient::default();
    let owner = create_resource_owner(default_options(), http.clone());

    let result = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await;

    assert_eq!(
        result.err(),
        Some(ResourceOwnerError::Authentication(
            AuthenticationError::RequestTokenNotFound(StorageMiss {
                owner: "oauth1".to_string(),
                token: "token".to_string(),
            })
        ))
    );
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn should_not_replay_callback() {
    let http = FakeHttpClient::respond("oauth_token=access&oauth_token_secret=secret", "text/plain")
        .then_respond("oauth_token=access&oauth_token_secret=secret", "text/plain");
    let owner = create_resource_owner(default_options(), http.clone());
    store_request_token(&owner).await;

    let first = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await;
    let second = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await;

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(ResourceOwnerError::Authentication(
            AuthenticationError::RequestTokenNotFound(_)
        ))
    ));
    assert_eq!(http.requests().len(), 1);
}

fn three_request_tokens() -> FakeHttpClient {
    FakeHttpClient::respond("oauth_token=t1&oauth_token_secret=s1", "text/plain")
        .then_respond("oauth_token=t2&oauth_token_secret=s2", "text/plain")
        .then_respond("oauth_token=t3&oauth_token_secret=s3", "text/plain")
        .then_respond("oauth_token=access&oauth_token_secret=secret", "text/plain")
}

async fn start_three_flows(owner: &TestResourceOwner) {
    for _ in 0..3 {
        owner
            .authorization_url("http://redirect.to/", &[])
            .await
            .expect("Should build authorization URL");
    }
}

#[tokio::test]
async fn should_redeem_only_latest_request_token() {
    let http = three_request_tokens();
    let owner = create_resource_owner(default_options(), http.clone());
    start_three_flows(&owner).await;

    let callback = CallbackParameters::default()
        .with(OAUTH_TOKEN, "t3")
        .with(OAUTH_VERIFIER, "code");
    let access_token = owner
        .access_token(&callback, "http://redirect.to/", &[])
        .await
        .expect("Should get access token");

    assert_eq!(access_token.token(), "access");
    assert!(authorization(&http.last_request()).contains(r#"oauth_token="t3""#));
}

#[tokio::test]
async fn should_reject_callback_of_abandoned_flow() {
    let http = three_request_tokens();
    let owner = create_resource_owner(default_options(), http.clone());
    start_three_flows(&owner).await;

    let stale = CallbackParameters::default()
        .with(OAUTH_TOKEN, "t1")
        .with(OAUTH_VERIFIER, "code");
    let result = owner
        .access_token(&stale, "http://redirect.to/", &[])
        .await;

    assert_eq!(
        result.err(),
        Some(ResourceOwnerError::Authentication(
            AuthenticationError::TokenMismatch {
                expected: "t3".to_string(),
                actual: "t1".to_string(),
            }
        ))
    );
    assert_eq!(http.requests().len(), 3);

    let latest = CallbackParameters::default()
        .with(OAUTH_TOKEN, "t3")
        .with(OAUTH_VERIFIER, "code");
    let result = owner
        .access_token(&latest, "http://redirect.to/", &[])
        .await;
    assert!(matches!(
        result,
        Err(ResourceOwnerError::Authentication(
            AuthenticationError::RequestTokenNotFound(_)
        ))
    ));
}

#[tokio::test]
async fn should_not_find_request_token_after_rename() {
    let http = FakeHttpClient::respond("oauth_token=access&oauth_token_secret=secret", "text/plain");
    let mut owner = create_resource_owner(default_options(), http);
    store_request_token(&owner).await;

    owner.set_name("foo");
    let result = owner
        .access_token(&callback(), "http://redirect.to/", &[])
        .await;

    assert!(matches!(
        result,
        Err(ResourceOwnerError::Authentication(
            AuthenticationError::RequestTokenNotFound(StorageMiss { owner, .. })
        )) if owner == "foo"
    ));
}

#[tokio::test]
async fn should_fail_on_denied_callback() {
    let http = FakeHttpClient::default();
    let owner = create_resource_owner(default_options(), http.clone());
    store_request_token(&owner).await;

    let callback = CallbackParameters::from_query("denied=token").expect("valid query");
    let result = owner
        .access_token(&callback, "http://redirect.to/", &[])
        .await;

    assert_eq!(
        result.err(),
        Some(ResourceOwnerError::Authentication(
            AuthenticationError::AccessDenied {
                message: "token".to_string()
            }
        ))
    );
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn should_fail_on_missing_verifier() {
    let owner = create_resource_owner(default_options(), FakeHttpClient::default());
    store_request_token(&owner).await;

    let callback = CallbackParameters::default().with(OAUTH_TOKEN, "token");
    let result = owner
        .access_token(&callback, "http://redirect.to/", &[])
        .await;

    assert_eq!(
        result.err(),
        Some(ResourceOwnerError::Authentication(
            AuthenticationError::MissingCallbackParameter {
                name: OAUTH_VERIFIER.to_string()
            }
        ))
    );
}

#[tokio::test]
async fn should_get_user_information() {
    let http = FakeHttpClient::respond(r#"{"foo": "bar"}"#, "application/json");
    let owner = create_resource_owner(default_options(), http.clone());
    let access_token = AccessToken::new("access_token", "access_secret");

    let user = owner
        .user_information(&access_token, &[])
        .await
        .expect("Should get user information");

    assert_eq!(user.nickname().as_deref(), Some("bar"));
    assert_eq!(user.username(), None);
    assert_eq!(user.access_token().token(), "access_token");
    assert_eq!(user.resource_owner(), "oauth1");

    let request = http.last_request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.url.as_str(), "http://user.info/");
    assert!(authorization(&request).contains(r#"oauth_token="access_token""#));
}

#[tokio::test]
async fn should_send_extra_parameters_in_user_information_query() {
    let http = FakeHttpClient::respond(r#"{"id": 1}"#, "application/json");
    let owner = create_resource_owner(default_options(), http.clone());

    owner
        .user_information(&AccessToken::from("access_token"), &[("include_email", "true")])
        .await
        .expect("Should get user information");

    let request = http.last_request();
    assert_eq!(request.url.as_str(), "http://user.info/?include_email=true");
    assert!(request.body.is_none());
}

#[tokio::test]
async fn should_use_custom_user_response() {
    let http = FakeHttpClient::respond("", "text/plain");
    let options = default_options().with_user_response_class("CustomUserResponse");
    let owner = create_resource_owner(options, http);

    let user = owner
        .user_information(&AccessToken::new("token", "secret"), &[])
        .await
        .expect("Should get user information");

    assert_eq!(user.username().as_deref(), Some("foo666"));
    assert_eq!(user.nickname().as_deref(), Some("foo"));
    assert!(user.raw().is_empty());
}

#[tokio::test]
async fn should_fail_when_custom_response_misses_required_field() {
    let http = FakeHttpClient::respond(r#"{"foo": "bar"}"#, "application/json");
    let options = default_options().with_user_response_class("StrictUserResponse");
    let owner = create_resource_owner(options, http);

    let result = owner
        .user_information(&AccessToken::from("token"), &[])
        .await;

    assert_eq!(
        result.err(),
        Some(ResourceOwnerError::MalformedResponse(
            MalformedResponse::MissingField {
                field: IDENTIFIER.to_string()
            }
        ))
    );
}

#[tokio::test]
async fn should_fail_on_malformed_user_information() {
    let http = FakeHttpClient::respond("[1, 2, 3]", "application/json");
    let owner = create_resource_owner(default_options(), http);

    let result = owner
        .user_information(&AccessToken::from("token"), &[])
        .await;

    assert!(matches!(
        result,
        Err(ResourceOwnerError::MalformedResponse(
            MalformedResponse::NotAnObject { .. }
        ))
    ));
}

#[tokio::test]
async fn should_surface_transport_error() {
    let owner = create_resource_owner(default_options(), FakeHttpClient::fail("connection refused"));

    let result = owner.authorization_url("http://redirect.to/", &[]).await;

    assert_eq!(
        result.err(),
        Some(ResourceOwnerError::Transport(TransportError::new(
            "connection refused"
        )))
    );
}

#[tokio::test]
async fn should_sign_with_realm_and_plaintext() {
    let http = FakeHttpClient::respond("oauth_token=token&oauth_token_secret=secret", "text/plain");
    let options = default_options()
        .with_realm("Photos")
        .with_signature_method(SignatureMethod::Plaintext);
    let owner = create_resource_owner(options, http.clone());

    owner
        .authorization_url("http://redirect.to/", &[])
        .await
        .expect("Should build authorization URL");

    let header = authorization(&http.last_request());
    assert!(header.starts_with(r#"OAuth realm="Photos", "#));
    assert!(header.contains(r#"oauth_signature="clientsecret%26""#));
    assert!(header.contains(r#"oauth_signature_method="PLAINTEXT""#));
}

#[tokio::test]
async fn should_run_full_flow() {
    let http = FakeHttpClient::respond(
        "oauth_token=token&oauth_token_secret=secret&oauth_callback_confirmed=true",
        "application/x-www-form-urlencoded",
    )
    .then_respond(
        "oauth_token=access&oauth_token_secret=access-secret&screen_name=twitterapi",
        "text/html; charset=utf-8",
    )
    .then_respond(
        r#"{"id": 6253282, "foo": "twitterapi", "foo_disp": "Twitter API"}"#,
        "Application/JSON; charset=UTF-8",
    );
    let owner = create_resource_owner(default_options(), http.clone());

    let url = owner
        .authorization_url("http://redirect.to/", &[])
        .await
        .expect("Should build authorization URL");
    let callback = CallbackParameters::from_url(&url).with(OAUTH_VERIFIER, "code");
    let access_token = owner
        .access_token(&callback, "http://redirect.to/", &[])
        .await
        .expect("Should get access token");
    let user = owner
        .user_information(&access_token, &[])
        .await
        .expect("Should get user information");

    assert_eq!(access_token.get("screen_name").as_deref(), Some("twitterapi"));
    assert_eq!(user.username().as_deref(), Some("6253282"));
    assert_eq!(user.nickname().as_deref(), Some("twitterapi"));
    assert_eq!(user.real_name().as_deref(), Some("Twitter API"));

    let methods = http
        .requests()
        .into_iter()
        .map(|request| request.method)
        .collect::<Vec<_>>();
    assert_eq!(methods, [Method::POST, Method::POST, Method::GET]);
}
