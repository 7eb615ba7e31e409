use crate::utils::{ALICE, BOB, TestPlayground, wait_until};
use foundry_sign_playground::{
    EditorId, OperationStatus, PlaygroundCommand, PlaygroundConfig, ProviderError,
    ProviderEvent, SessionState, SignOperation, WalletProvider,
    display::{Control, ControlLabel, DisplayUpdate},
    networks::NETWORKS,
    provider::{
        ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS, ETH_SIGN_TYPED_DATA_V4, MockProvider,
        PERSONAL_SIGN,
    },
    samples,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::mpsc;

fn mock() -> Arc<MockProvider> {
    Arc::new(MockProvider::new())
}

fn as_provider(provider: &Arc<MockProvider>) -> Option<Arc<dyn WalletProvider>> {
    Some(provider.clone() as Arc<dyn WalletProvider>)
}

/// A playground connected to `ALICE` on `chain_id`.
async fn connected(chain_id: &str) -> (Arc<MockProvider>, TestPlayground) {
    let provider = mock();
    provider
        .respond(ETH_REQUEST_ACCOUNTS, Ok(json!([ALICE.to_string()])))
        .respond(ETH_CHAIN_ID, Ok(json!(chain_id)));
    let mut test = TestPlayground::new(as_provider(&provider));
    test.playground.connect().await;
    assert_eq!(test.playground.state(), SessionState::Connected);
    (provider, test)
}

fn domain_chain_id(test: &TestPlayground, editor: EditorId) -> Value {
    let value: Value = serde_json::from_str(test.playground.editor(editor).text()).unwrap();
    value["domain"]["chainId"].clone()
}

#[tokio::test(flavor = "multi_thread")]
async fn signing_requires_connection() {
    crate::init_tracing();

    // no provider at all
    let mut test = TestPlayground::new(None);
    for operation in SignOperation::ALL {
        test.playground.sign(operation).await;
        assert_eq!(*test.playground.status(operation), OperationStatus::Idle);
        assert!(test.surface.outcome(operation).is_none());
    }

    // provider present, nothing authorized
    let provider = mock();
    provider.respond(ETH_ACCOUNTS, Ok(json!([])));
    let mut test = TestPlayground::new(as_provider(&provider));
    test.playground.start().await;
    assert_eq!(test.playground.state(), SessionState::Disconnected);
    let calls_before = provider.calls().len();
    for operation in SignOperation::ALL {
        test.playground.sign(operation).await;
        assert_eq!(*test.playground.status(operation), OperationStatus::Idle);
        assert!(test.surface.outcome(operation).is_none());
        assert_eq!(
            test.surface.control(Control::Sign(operation)),
            Some((false, ControlLabel::Normal))
        );
    }
    assert_eq!(provider.calls().len(), calls_before);
    assert_eq!(test.surface.alerts().len(), SignOperation::ALL.len());
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_without_provider_alerts() {
    let mut test = TestPlayground::new(None);
    test.playground.start().await;
    test.surface.clear();

    test.playground.connect().await;
    assert_eq!(test.playground.state(), SessionState::Unavailable);
    let alert = test.surface.updates().into_iter().find_map(|update| match update {
        DisplayUpdate::Alert { link, .. } => Some(link),
        _ => None,
    });
    assert_eq!(alert, Some(Some(PlaygroundConfig::default().install_url)));
    assert!(test.surface.status().is_none_or(|state| state == SessionState::Unavailable));
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_end_to_end() {
    let account = format!("0xABCD{}1234", "0".repeat(32));
    let provider = mock();
    provider
        .respond(ETH_REQUEST_ACCOUNTS, Ok(json!([account])))
        .respond(ETH_CHAIN_ID, Ok(json!("0x1")));
    let mut test = TestPlayground::new(as_provider(&provider));

    test.playground.connect().await;

    let session = test.playground.session();
    assert_eq!(session.state(), SessionState::Connected);
    assert_eq!(session.account(), Some(account.parse().unwrap()));
    assert_eq!(session.chain_id(), Some(1));
    for operation in SignOperation::ALL {
        assert_eq!(
            test.surface.control(Control::Sign(operation)),
            Some((true, ControlLabel::Normal)),
            "{operation}"
        );
    }
    assert_eq!(test.surface.control(Control::Connect), Some((false, ControlLabel::Normal)));
    let wallet = test.surface.wallet().flatten().unwrap();
    assert_eq!(wallet.network, "Ethereum Mainnet");
    assert_eq!(wallet.chain_id, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_connect_reenables_control() {
    let provider = mock();
    provider.respond(ETH_REQUEST_ACCOUNTS, Err(ProviderError::user_rejected()));
    let mut test = TestPlayground::new(as_provider(&provider));

    test.playground.connect().await;
    assert_eq!(test.playground.state(), SessionState::Disconnected);
    assert!(!test.playground.is_connecting());
    assert_eq!(test.surface.control(Control::Connect), Some((true, ControlLabel::Normal)));
    assert_eq!(
        test.surface.alerts(),
        vec!["Failed to connect wallet: User rejected the request.".to_string()]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn start_restores_authorized_account() {
    let provider = mock();
    provider
        .respond(ETH_ACCOUNTS, Ok(json!([ALICE.to_string()])))
        .respond(ETH_CHAIN_ID, Ok(json!("0x89")));
    let mut test = TestPlayground::new(as_provider(&provider));

    test.playground.start().await;
    assert_eq!(test.playground.state(), SessionState::Connected);
    assert!(provider.calls_to(ETH_REQUEST_ACCOUNTS).is_empty());
    assert_eq!(domain_chain_id(&test, EditorId::TypedDataV4), json!(137));
    assert_eq!(test.surface.wallet().flatten().unwrap().network, "Polygon Mainnet");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_sign_shows_error_and_reenables() {
    let (provider, mut test) = connected("0x1").await;
    provider.respond(PERSONAL_SIGN, Err(ProviderError::message("User rejected")));

    test.playground.sign(SignOperation::PersonalSign).await;

    let (text, error) = test.surface.outcome(SignOperation::PersonalSign).unwrap();
    assert!(error);
    assert!(text.contains("User rejected"));
    assert_eq!(
        test.surface.control(Control::Sign(SignOperation::PersonalSign)),
        Some((true, ControlLabel::Normal))
    );
    assert!(matches!(
        test.playground.status(SignOperation::PersonalSign),
        OperationStatus::Resolved(outcome) if !outcome.result.is_success()
    ));
    assert_eq!(provider.calls_to(PERSONAL_SIGN).len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn sign_requests_have_wallet_shapes() {
    let (provider, mut test) = connected("0x1").await;
    provider.respond(PERSONAL_SIGN, Ok(json!("0xsig")));
    provider.respond(ETH_SIGN_TYPED_DATA_V4, Ok(json!("0xsig4")));

    test.playground.edit(EditorId::Message, "gm");
    test.playground.sign(SignOperation::PersonalSign).await;
    test.playground.sign(SignOperation::TypedDataV4).await;

    let personal = provider.calls_to(PERSONAL_SIGN).remove(0);
    assert_eq!(
        personal.params,
        vec![json!("0x676d"), json!(ALICE.to_string()), json!({ "silentSignPass": true })]
    );
    let typed = provider.calls_to(ETH_SIGN_TYPED_DATA_V4).remove(0);
    assert_eq!(typed.params[0], json!(ALICE.to_string()));
    let sent: Value = serde_json::from_str(typed.params[1].as_str().unwrap()).unwrap();
    assert_eq!(sent, samples::typed_data_v4());

    assert_eq!(
        test.surface.outcome(SignOperation::TypedDataV4),
        Some(("0xsig4".to_string(), false))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_sign_pass_can_be_disabled() {
    let provider = mock();
    provider
        .respond(ETH_REQUEST_ACCOUNTS, Ok(json!([ALICE.to_string()])))
        .respond(ETH_CHAIN_ID, Ok(json!("0x1")))
        .respond(PERSONAL_SIGN, Ok(json!("0xsig")));
    let config = PlaygroundConfig { silent_sign_pass: false, ..Default::default() };
    let mut test = TestPlayground::with_config(as_provider(&provider), config);

    test.playground.connect().await;
    test.playground.sign(SignOperation::PersonalSign).await;
    assert_eq!(provider.calls_to(PERSONAL_SIGN)[0].params.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn copy_only_copies_signatures() {
    let (provider, mut test) = connected("0x1").await;

    // nothing to copy yet
    assert_eq!(test.playground.copy_result(SignOperation::PersonalSign), None);

    provider.respond(PERSONAL_SIGN, Ok(json!("0xsig...")));
    test.playground.sign(SignOperation::PersonalSign).await;
    assert!(test.playground.copy_result(SignOperation::PersonalSign).is_some());
    assert_eq!(test.clipboard.writes(), vec!["0xsig...".to_string()]);
    let copy = Control::Copy(SignOperation::PersonalSign);
    assert_eq!(test.surface.control(copy), Some((true, ControlLabel::Copied)));

    test.playground.reset_copy_feedback(SignOperation::PersonalSign);
    assert_eq!(test.surface.control(copy), Some((true, ControlLabel::Normal)));

    // the next result is an error, which is never copied
    provider.respond(PERSONAL_SIGN, Err(ProviderError::message("User rejected")));
    test.playground.sign(SignOperation::PersonalSign).await;
    assert_eq!(test.playground.copy_result(SignOperation::PersonalSign), None);
    assert_eq!(test.clipboard.writes().len(), 1);
    assert_eq!(test.surface.control(copy), Some((false, ControlLabel::Normal)));
}

#[tokio::test(flavor = "multi_thread")]
async fn chain_change_syncs_typed_data() {
    let (provider, mut test) = connected("0x1").await;
    let legacy = test.playground.editor(EditorId::TypedDataLegacy).text().to_string();
    assert_eq!(domain_chain_id(&test, EditorId::TypedDataV4), json!(1));
    let mainnet_hash = test.surface.digest(EditorId::TypedDataV4).unwrap().unwrap();

    test.playground.handle_event(ProviderEvent::ChainChanged("0x89".into())).await;

    assert_eq!(test.playground.session().chain_id(), Some(137));
    assert_eq!(domain_chain_id(&test, EditorId::TypedDataV4), json!(137));
    assert_eq!(domain_chain_id(&test, EditorId::TypedDataV3), json!(137));
    assert_eq!(test.playground.editor(EditorId::TypedDataLegacy).text(), legacy);
    let shown = test.surface.editor_text(EditorId::TypedDataV4).unwrap();
    assert_eq!(shown, test.playground.editor(EditorId::TypedDataV4).text());
    assert_eq!(test.surface.wallet().flatten().unwrap().network, "Polygon Mainnet");
    assert_ne!(test.surface.digest(EditorId::TypedDataV4).unwrap().unwrap(), mainnet_hash);

    // the chain is taken from the event, not queried again
    assert_eq!(provider.calls_to(ETH_CHAIN_ID).len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn chain_change_skips_broken_payloads() {
    let (_provider, mut test) = connected("0x1").await;
    test.playground.edit(EditorId::TypedDataV4, "{ \"domain\": ");

    test.playground.handle_event(ProviderEvent::ChainChanged("0xa".into())).await;

    assert_eq!(test.playground.editor(EditorId::TypedDataV4).text(), "{ \"domain\": ");
    assert_eq!(domain_chain_id(&test, EditorId::TypedDataV3), json!(10));
    assert!(test.surface.alerts().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn network_names_follow_registry() {
    let (_provider, mut test) = connected("0x1").await;
    for network in NETWORKS {
        let chain_id = format!("{:#x}", network.chain_id);
        test.playground.handle_event(ProviderEvent::ChainChanged(chain_id)).await;
        assert_eq!(test.surface.wallet().flatten().unwrap().network, network.name);
    }

    test.playground.handle_event(ProviderEvent::ChainChanged("0x7a69".into())).await;
    let wallet = test.surface.wallet().flatten().unwrap();
    assert_eq!(wallet.network, "Unknown Network");
    assert_eq!(wallet.chain_id, 31337);
}

#[tokio::test(flavor = "multi_thread")]
async fn account_events() {
    let (provider, mut test) = connected("0x1").await;

    // switching accounts keeps the chain
    test.playground.handle_event(ProviderEvent::AccountsChanged(vec![BOB.to_string()])).await;
    assert_eq!(test.playground.session().account(), Some(BOB));
    assert_eq!(provider.calls_to(ETH_CHAIN_ID).len(), 1);

    // locking the wallet disconnects
    test.playground.handle_event(ProviderEvent::AccountsChanged(vec![])).await;
    assert_eq!(test.playground.state(), SessionState::Disconnected);
    assert_eq!(test.surface.wallet(), Some(None));
    assert_eq!(test.surface.control(Control::Connect), Some((true, ControlLabel::Normal)));
    for operation in SignOperation::ALL {
        assert_eq!(
            test.surface.control(Control::Sign(operation)),
            Some((false, ControlLabel::Normal))
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn run_loop_handles_commands_and_events() {
    let provider = mock();
    provider
        .respond(ETH_ACCOUNTS, Ok(json!([])))
        .respond(ETH_REQUEST_ACCOUNTS, Ok(json!([ALICE.to_string()])))
        .respond(ETH_CHAIN_ID, Ok(json!("0x1")))
        .respond(PERSONAL_SIGN, Ok(json!("0xsig")));
    provider.hang(ETH_SIGN_TYPED_DATA_V4);
    let test = TestPlayground::new(as_provider(&provider));
    let surface = test.surface.clone();

    let (commands, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(test.playground.run(rx));

    commands.send(PlaygroundCommand::Connect).unwrap();
    wait_until(|| surface.status() == Some(SessionState::Connected)).await;

    // a request stuck in the wallet does not hold up other operations
    commands.send(PlaygroundCommand::Sign(SignOperation::TypedDataV4)).unwrap();
    commands.send(PlaygroundCommand::Sign(SignOperation::PersonalSign)).unwrap();
    wait_until(|| surface.outcome(SignOperation::PersonalSign).is_some()).await;
    assert_eq!(
        surface.control(Control::Sign(SignOperation::TypedDataV4)),
        Some((false, ControlLabel::Pending))
    );

    provider.emit(ProviderEvent::ChainChanged("0x89".into()));
    wait_until(|| surface.wallet().flatten().is_some_and(|wallet| wallet.chain_id == 137)).await;

    commands
        .send(PlaygroundCommand::Edit { editor: EditorId::TypedDataV3, text: "[".into() })
        .unwrap();
    drop(commands);
    let playground = handle.await.unwrap();

    assert_eq!(playground.editor(EditorId::TypedDataV3).text(), "[");
    assert!(!playground.editor(EditorId::TypedDataV3).preview().unwrap().is_valid());
    assert_eq!(*playground.status(SignOperation::TypedDataV4), OperationStatus::Pending);
    assert_eq!(playground.session().chain_id(), Some(137));
}
