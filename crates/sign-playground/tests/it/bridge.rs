use crate::utils::{ALICE, TestPlayground};
use foundry_sign_playground::{
    BridgeServer, ProviderError, ProviderEvent, SessionState, SignOperation, WalletProvider,
    bridge::{
        SESSION_TOKEN_HEADER,
        types::{BridgeApiResponse, BridgeRequest, BridgeResponse, ProviderStatus},
    },
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

/// Answers requests the way a page with an unlocked wallet would.
fn wallet_answer(request: &BridgeRequest) -> Result<Value, ProviderError> {
    match request.method.as_str() {
        "eth_accounts" => Ok(json!([])),
        "eth_requestAccounts" => Ok(json!([ALICE.to_string().to_lowercase()])),
        "eth_chainId" => Ok(json!("0x89")),
        "personal_sign" => Ok(json!(format!("0x{}", "ab".repeat(65)))),
        "eth_signTypedData_v4" => Err(ProviderError::user_rejected()),
        other => Err(ProviderError::with_code(4200, format!("{other} is not supported"))),
    }
}

/// Spawns a fake bridge page polling `server`.
fn spawn_page(server: &BridgeServer) -> JoinHandle<()> {
    let url = server.url();
    let token = server.session_token();
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        client
            .post(format!("{url}/api/provider"))
            .header(SESSION_TOKEN_HEADER, &token)
            .json(&ProviderStatus { available: true, global: Some("okxwallet".into()) })
            .send()
            .await
            .unwrap();
        loop {
            let next = client
                .get(format!("{url}/api/request"))
                .header(SESSION_TOKEN_HEADER, &token)
                .send()
                .await
                .unwrap()
                .json::<BridgeApiResponse<BridgeRequest>>()
                .await
                .unwrap();
            let BridgeApiResponse::Ok(request) = next else {
                tokio::time::sleep(Duration::from_millis(20)).await;
                continue;
            };
            let response = match wallet_answer(&request) {
                Ok(result) => BridgeResponse::ok(request.id, result),
                Err(error) => BridgeResponse::err(request.id, error),
            };
            client
                .post(format!("{url}/api/response"))
                .header(SESSION_TOKEN_HEADER, &token)
                .json(&response)
                .send()
                .await
                .unwrap();
        }
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn playground_over_bridge() {
    crate::init_tracing();

    let mut server = BridgeServer::new(0, "okxwallet", Duration::from_secs(5));
    server.start().await.unwrap();
    let page = spawn_page(&server);

    let provider = server.wait_for_detection(Duration::from_secs(5)).await.unwrap().unwrap();
    let mut events = provider.subscribe();
    let mut test = TestPlayground::new(Some(Arc::new(provider) as Arc<dyn WalletProvider>));

    test.playground.start().await;
    assert_eq!(test.playground.state(), SessionState::Disconnected);

    test.playground.connect().await;
    assert_eq!(test.playground.session().account(), Some(ALICE));
    assert_eq!(test.playground.session().chain_id(), Some(137));

    test.playground.sign(SignOperation::PersonalSign).await;
    let (signature, error) = test.surface.outcome(SignOperation::PersonalSign).unwrap();
    assert!(!error);
    assert_eq!(signature.len(), 2 + 130);

    test.playground.sign(SignOperation::TypedDataV4).await;
    assert_eq!(
        test.surface.outcome(SignOperation::TypedDataV4),
        Some(("Signing failed: User rejected the request.".to_string(), true))
    );

    // events posted by the page reach the session
    reqwest::Client::new()
        .post(format!("{}/api/event", server.url()))
        .header(SESSION_TOKEN_HEADER, server.session_token())
        .json(&json!({ "event": "accountsChanged", "data": [] }))
        .send()
        .await
        .unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
    assert_eq!(event, ProviderEvent::AccountsChanged(vec![]));
    test.playground.handle_event(event).await;
    assert_eq!(test.playground.state(), SessionState::Disconnected);

    page.abort();
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn page_without_wallet() {
    let mut server = BridgeServer::new(0, "okxwallet", Duration::from_secs(5));
    server.start().await.unwrap();

    reqwest::Client::new()
        .post(format!("{}/api/provider", server.url()))
        .header(SESSION_TOKEN_HEADER, server.session_token())
        .json(&ProviderStatus { available: false, global: None })
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let provider = server.wait_for_detection(Duration::from_secs(5)).await.unwrap();
    assert!(provider.is_none());

    let mut test = TestPlayground::new(None);
    test.playground.connect().await;
    assert_eq!(test.playground.state(), SessionState::Unavailable);
    assert_eq!(test.surface.alerts().len(), 1);

    server.stop().await.unwrap();
}
