use css_authn::{FetchConfig, get_authenticated_fetch, prelude::*};
use snafu::prelude::*;
use tracing_subscriber::EnvFilter;

#[snafu::report]
#[tokio::main]
pub async fn main() -> Result<(), snafu::Whatever> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let resource = std::env::args()
        .nth(1)
        .whatever_context("Usage: authenticated_fetch <resource-url>")?;
    let config = FetchConfig::from_env().whatever_context("Failed to read configuration")?;

    let client = get_authenticated_fetch(&config, reqwest::Client::new())
        .await
        .whatever_context("Failed to authenticate")?;

    let put = http::Request::builder()
        .method(http::Method::PUT)
        .uri(&resource)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(css_authn::Bytes::from_static(b"Hello from css-authn"))
        .whatever_context("Failed to build PUT request")?;
    let response = client
        .execute(put)
        .await
        .whatever_context("PUT request failed")?;
    println!("PUT {resource}: {}", response.status());

    let get = http::Request::builder()
        .uri(&resource)
        .body(css_authn::Bytes::new())
        .whatever_context("Failed to build GET request")?;
    let response = client
        .execute(get)
        .await
        .whatever_context("GET request failed")?;
    let status = response.status();
    let body = response
        .body()
        .await
        .whatever_context("Failed to read GET response")?;
    println!("GET {resource}: {status}\n{}", String::from_utf8_lossy(&body));

    Ok(())
}
