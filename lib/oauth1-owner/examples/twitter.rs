use std::env;
use std::io::{self, BufRead};

use oauth1_owner::{
    CallbackParameters, IDENTIFIER, InMemoryTokenStorage, NICKNAME, Options, Paths, REALNAME,
    ReqwestHttpClient, ResourceOwner,
};

const CALLBACK: &str = "oob";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().pretty().init();

    let options = Options::builder()
        .with_client_id(env::var("TWITTER_CONSUMER_KEY")?)
        .with_client_secret(env::var("TWITTER_CONSUMER_SECRET")?)
        .with_request_token_url("https://api.twitter.com/oauth/request_token")?
        .with_authorization_url("https://api.twitter.com/oauth/authorize")?
        .with_access_token_url("https://api.twitter.com/oauth/access_token")?
        .with_infos_url("https://api.twitter.com/1.1/account/verify_credentials.json")?
        .build()?;

    let storage = InMemoryTokenStorage::new();
    let owner = ResourceOwner::builder("twitter", options)
        .with_paths(
            Paths::new()
                .with(IDENTIFIER, "id_str")
                .with(NICKNAME, "screen_name")
                .with(REALNAME, "name"),
        )
        .build(ReqwestHttpClient::default(), storage.session("cli"))?;

    let url = owner.authorization_url(CALLBACK, &[]).await?;
    println!("Open {url} and paste the PIN:");

    let mut pin = String::new();
    io::stdin().lock().read_line(&mut pin)?;

    let token = url
        .query_pairs()
        .find(|(name, _)| name == "oauth_token")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();
    let callback = CallbackParameters::default()
        .with("oauth_token", token)
        .with("oauth_verifier", pin.trim());

    let access_token = owner.access_token(&callback, CALLBACK, &[]).await?;
    let user = owner.user_information(&access_token, &[]).await?;

    println!(
        "Logged in as {} ({})",
        user.nickname().unwrap_or_default(),
        user.real_name().unwrap_or_default()
    );

    Ok(())
}
