//! Demonstrates handing out `Authorization` headers through the coordinator while a mock token
//! endpoint rotates an expired access token.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use leerling_auth::{
	auth::{AccountId, ClientId, TokenSet},
	coordinator::AuthorizationCoordinator,
	ext::RequestAuthorizer,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	reqwest::Client,
	session::{ReqwestTokenSession, SessionConfig},
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh-2\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let config = SessionConfig::builder(ClientId::new("leerling-demo")?)
		.token_endpoint(Url::parse(&server.url("/oauth2/token"))?)
		.scope("openid")
		.build()?;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let session = Arc::new(ReqwestTokenSession::with_http_client(
		config,
		AccountId::new("leerling-demo")?,
		store,
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	));

	session
		.sign_in(
			TokenSet::builder()
				.access_token("demo-expired")
				.refresh_token("demo-refresh-1")
				.expires_in(Duration::seconds(-1))
				.build()?,
		)
		.await?;

	let coordinator = AuthorizationCoordinator::new(session);
	let mut refresh_errors = coordinator.subscribe_refresh_errors();
	let header = coordinator.get_valid_authorization_header().await?;

	println!("Fresh header: {header:?}.");

	let request = coordinator
		.authorize(Client::new().get("https://api.somtoday.nl/rest/v1/leerlingen"))
		.await?
		.build()?;

	println!("Authorized request: {} {}.", request.method(), request.url());
	println!("Refresh failures broadcast: {}.", refresh_errors.try_recv().is_ok());

	token_mock.assert_async().await;

	Ok(())
}
