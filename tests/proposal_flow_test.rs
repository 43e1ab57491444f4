//! Proposal, approval and cancellation flows driven through the app state,
//! with an in-memory contract standing in for the node

mod common;

use std::sync::Arc;

use alloy::primitives::U256;
use sigdash::app::{InputMode, Panel};
use sigdash::domain::contract::NATIVE_TOKEN;
use sigdash::domain::proposal::{TokenSelector, WorkflowState};
use sigdash::error::Field;
use sigdash::infrastructure::runtime::{RuntimeCommand, WriteRequest};

use common::{connected_app, pump, raw, Call, FakeClient, RECIPIENT, USDC};

fn type_into(app: &mut sigdash::app::App, field: Field, text: &str) {
    app.form_field = field;
    for c in text.chars() {
        app.input_char(c);
    }
}

#[tokio::test]
async fn test_native_proposal_uses_staged_nonce_and_wei() {
    let client = Arc::new(FakeClient::new(true).with_nonce(3));
    let mut app = connected_app(&client).await;
    assert_eq!(app.queries.current_nonce(), Some(3));

    app.start_editing();
    type_into(&mut app, Field::Recipient, "0x000000000000000000000000000000000000dEaD");
    type_into(&mut app, Field::Amount, "0.5");
    app.submit_form();

    let WorkflowState::Reviewing(staged) = app.workflow.state().clone() else {
        panic!("expected review, got {:?}", app.workflow.state());
    };
    assert_eq!(staged.nonce, 3);
    assert_eq!(staged.draft.amount, "0.5");
    assert_eq!(staged.token_label, "ETH");

    app.confirm_proposal();
    pump(&mut app, &client).await;

    let proposals: Vec<_> = client
        .writes()
        .into_iter()
        .filter_map(|c| match c {
            Call::Propose(call) => Some(call),
            _ => None,
        })
        .collect();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].to, RECIPIENT);
    assert_eq!(proposals[0].token, NATIVE_TOKEN);
    assert_eq!(proposals[0].amount, U256::from(500_000_000_000_000_000u128));
    assert_eq!(proposals[0].nonce, 3);

    assert!(matches!(app.workflow.state(), WorkflowState::Settled { .. }));
    assert!(app.workflow.draft().recipient.is_empty());
    assert!(app.last_write.as_ref().is_some_and(|w| w.confirmed));
}

#[tokio::test]
async fn test_invalid_custom_token_never_reaches_review() {
    let client = Arc::new(FakeClient::new(true));
    let mut app = connected_app(&client).await;

    app.start_editing();
    type_into(&mut app, Field::Recipient, "0x000000000000000000000000000000000000dEaD");
    app.workflow.draft_mut().unwrap().token = TokenSelector::Custom;
    type_into(&mut app, Field::CustomToken, "0xZZZZ");
    type_into(&mut app, Field::Amount, "1");
    app.submit_form();

    assert_eq!(app.workflow.state(), &WorkflowState::Editing);
    assert!(app.workflow.field_error(Field::CustomToken).is_some());
    assert_eq!(app.form_field, Field::CustomToken);

    app.confirm_proposal();
    pump(&mut app, &client).await;
    assert!(client.writes().is_empty());
}

#[tokio::test]
async fn test_zero_amounts_are_never_written() {
    let client = Arc::new(FakeClient::new(true));
    let mut app = connected_app(&client).await;

    app.start_editing();
    type_into(&mut app, Field::Recipient, "0x000000000000000000000000000000000000dEaD");
    type_into(&mut app, Field::Amount, "0.000");
    app.submit_form();
    assert!(app.workflow.field_error(Field::Amount).is_some());

    // rounds to zero at six decimals
    app.cycle_token(true);
    assert!(matches!(app.workflow.draft().token, TokenSelector::Listed { .. }));
    app.form_field = Field::Amount;
    for _ in 0..5 {
        app.backspace();
    }
    type_into(&mut app, Field::Amount, "0.0000001");
    app.submit_form();
    app.confirm_proposal();

    let writes = app
        .take_commands()
        .into_iter()
        .filter(|cmd| matches!(cmd, RuntimeCommand::Write(_)))
        .count();
    assert_eq!(writes, 0);
    assert!(matches!(app.workflow.state(), WorkflowState::Reviewing(_)));
    assert!(app.workflow.last_error().is_some());
    assert!(client.writes().is_empty());
}

#[tokio::test]
async fn test_listed_token_amount_uses_token_decimals() {
    let client = Arc::new(FakeClient::new(true).with_nonce(1));
    let mut app = connected_app(&client).await;

    app.start_editing();
    type_into(&mut app, Field::Recipient, "0x000000000000000000000000000000000000dEaD");
    app.cycle_token(true);
    type_into(&mut app, Field::Amount, "12.5");
    app.submit_form();
    app.confirm_proposal();

    let commands = app.take_commands();
    let Some(RuntimeCommand::Write(WriteRequest::Propose(call))) = commands.last() else {
        panic!("expected a proposal write, got {commands:?}");
    };
    assert_eq!(call.token, USDC);
    assert_eq!(call.amount, U256::from(12_500_000u64));
}

#[tokio::test]
async fn test_approve_attaches_value_only_for_native() {
    let client = Arc::new(
        FakeClient::new(true)
            .with_transaction(1, raw(NATIVE_TOKEN, U256::from(7u64), 0))
            .with_transaction(2, raw(USDC, U256::from(9u64), 0)),
    );
    let mut app = connected_app(&client).await;
    app.set_panel(Panel::Pending);
    assert_eq!(app.pending_ids(), vec![1, 2]);

    app.approve_selected();
    pump(&mut app, &client).await;
    app.approve(2);
    pump(&mut app, &client).await;

    assert_eq!(
        client.writes(),
        vec![
            Call::Approve {
                id: 1,
                value: U256::from(7u64)
            },
            Call::Approve {
                id: 2,
                value: U256::ZERO
            },
        ]
    );
    assert_eq!(app.action_in_flight, None);
}

#[tokio::test]
async fn test_watch_only_session_cannot_write() {
    let client = Arc::new(
        FakeClient::new(false).with_transaction(1, raw(NATIVE_TOKEN, U256::from(7u64), 0)),
    );
    let mut app = connected_app(&client).await;
    assert!(!app.can_sign());

    app.cancel(1);
    pump(&mut app, &client).await;
    assert!(client.writes().is_empty());
    assert!(app.banner.is_some());
}

#[tokio::test]
async fn test_rejected_signature_keeps_draft_for_resubmit() {
    let mut fake = FakeClient::new(true).with_nonce(2);
    fake.write_error = Some("User rejected the request.".to_string());
    let client = Arc::new(fake);
    let mut app = connected_app(&client).await;

    app.start_editing();
    type_into(&mut app, Field::Recipient, "0x000000000000000000000000000000000000dEaD");
    type_into(&mut app, Field::Amount, "1");
    app.submit_form();
    app.confirm_proposal();
    pump(&mut app, &client).await;

    assert!(matches!(app.workflow.state(), WorkflowState::Reviewing(_)));
    assert_eq!(app.workflow.draft().amount, "1");
    assert_eq!(app.input_mode, InputMode::Normal);
    let banner = app.banner.clone().unwrap();
    assert!(banner.text.contains("User rejected"));
}
