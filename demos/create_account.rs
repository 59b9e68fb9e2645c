use css_authn::{NewAccount, create_account, provider::ProviderUrl, secrecy::SecretString};
use snafu::prelude::*;
use tracing_subscriber::EnvFilter;

fn env(name: &str) -> Result<String, snafu::Whatever> {
    std::env::var(name).with_whatever_context(|_| format!("Failed to get {name}"))
}

#[snafu::report]
#[tokio::main]
pub async fn main() -> Result<(), snafu::Whatever> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let provider =
        ProviderUrl::parse(&env("CSS_PROVIDER")?).whatever_context("Invalid CSS_PROVIDER")?;

    let account = NewAccount::builder()
        .username(env("CSS_USERNAME")?)
        .email(env("CSS_EMAIL")?)
        .password(SecretString::from(env("CSS_PASSWORD")?))
        .provider(provider)
        .build();

    let descriptor = create_account(account, &reqwest::Client::new())
        .await
        .whatever_context("Failed to create account")?;

    println!("Identity provider: {}", descriptor.idp);
    println!("Pod: {}", descriptor.pod_url);
    println!("WebID: {}", descriptor.web_id);

    Ok(())
}
