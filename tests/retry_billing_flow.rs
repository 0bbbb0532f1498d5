use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use subscription_rebilling::billing::ledger::CycleLedger;
use subscription_rebilling::billing::retry_policy::RetryPolicy;
use subscription_rebilling::billing::state_machine::BillingStateMachine;
use subscription_rebilling::domain::subscription::{Subscription, SubscriptionStatus};
use subscription_rebilling::gateways::mock::ScriptedGateway;
use subscription_rebilling::gateways::ChargeOutcome;

fn subscription(amount: Decimal) -> Subscription {
    Subscription::pending(amount, Utc::now() - Duration::minutes(1)).unwrap()
}

fn ledger_view(ledger: &CycleLedger) -> Vec<(Decimal, String)> {
    ledger
        .entries()
        .iter()
        .map(|e| (e.amount, e.status.clone()))
        .collect()
}

#[tokio::test]
async fn insufficient_funds_walks_the_whole_ladder_then_deactivates() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::always(ChargeOutcome::InsufficientFunds);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(subscription(dec!(1000)), &gateway, &mut ledger, Utc::now())
        .await;

    assert!(out.is(SubscriptionStatus::Inactive));
    assert_eq!(out.next_retry_at, None);
    assert_eq!(
        ledger_view(&ledger),
        vec![
            (dec!(1000), "insufficient_funds".to_string()),
            (dec!(750), "insufficient_funds".to_string()),
            (dec!(500), "insufficient_funds".to_string()),
            (dec!(250), "insufficient_funds".to_string()),
        ]
    );
    assert_eq!(gateway.requests().len(), 4);
}

#[tokio::test]
async fn full_success_on_first_attempt_activates() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::Success]);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(subscription(dec!(1000)), &gateway, &mut ledger, Utc::now())
        .await;

    assert!(out.is(SubscriptionStatus::Active));
    assert_eq!(out.remaining_balance, Decimal::ZERO);
    assert_eq!(out.retry_attempts, 0);
    assert_eq!(out.next_retry_at, None);
    assert_eq!(ledger_view(&ledger), vec![(dec!(1000), "success".to_string())]);
}

#[tokio::test]
async fn reduced_success_defers_leftover_for_a_week() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::Success]);
    let mut ledger = CycleLedger::new();
    let now = Utc::now();

    let out = machine
        .run_cycle(
            subscription(dec!(1000)).with_retry_attempts(1),
            &gateway,
            &mut ledger,
            now,
        )
        .await;

    assert_eq!(ledger_view(&ledger), vec![(dec!(750), "success".to_string())]);
    assert!(out.is(SubscriptionStatus::Pending));
    assert_eq!(out.remaining_balance, dec!(250));
    assert_eq!(out.retry_attempts, 0);
    assert_eq!(out.next_retry_at, Some(now + Duration::days(7)));
}

#[tokio::test]
async fn success_after_two_shortfalls_charges_half_and_defers_half() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([
        ChargeOutcome::InsufficientFunds,
        ChargeOutcome::InsufficientFunds,
        ChargeOutcome::Success,
    ]);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(subscription(dec!(1000)), &gateway, &mut ledger, Utc::now())
        .await;

    assert_eq!(
        ledger_view(&ledger),
        vec![
            (dec!(1000), "insufficient_funds".to_string()),
            (dec!(750), "insufficient_funds".to_string()),
            (dec!(500), "success".to_string()),
        ]
    );
    assert!(out.is(SubscriptionStatus::Pending));
    assert_eq!(out.remaining_balance, dec!(500));
}

#[tokio::test]
async fn remaining_balance_is_collected_as_is() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::Success]);
    let mut ledger = CycleLedger::new();
    let owing = subscription(dec!(1000)).schedule_retry(dec!(500), Utc::now());

    let out = machine.run_cycle(owing, &gateway, &mut ledger, Utc::now()).await;

    assert!(out.is(SubscriptionStatus::Active));
    assert_eq!(out.remaining_balance, Decimal::ZERO);
    assert_eq!(ledger_view(&ledger), vec![(dec!(500), "success".to_string())]);
}

#[tokio::test]
async fn failed_balance_collection_deactivates_without_retry() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::Failed, ChargeOutcome::Success]);
    let mut ledger = CycleLedger::new();
    let owing = subscription(dec!(1000)).schedule_retry(dec!(500), Utc::now());

    let out = machine.run_cycle(owing, &gateway, &mut ledger, Utc::now()).await;

    assert!(out.is(SubscriptionStatus::Inactive));
    assert_eq!(ledger_view(&ledger), vec![(dec!(500), "failed".to_string())]);
    assert_eq!(gateway.requests().len(), 1);
}

#[tokio::test]
async fn hard_failure_deactivates_on_first_attempt() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::Failed]);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(subscription(dec!(1000)), &gateway, &mut ledger, Utc::now())
        .await;

    assert!(out.is(SubscriptionStatus::Inactive));
    assert_eq!(out.retry_attempts, 0);
    assert_eq!(ledger_view(&ledger), vec![(dec!(1000), "failed".to_string())]);
}

#[tokio::test]
async fn unknown_status_is_logged_verbatim_and_is_terminal() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::from_status("error")]);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(subscription(dec!(1000)), &gateway, &mut ledger, Utc::now())
        .await;

    assert!(out.is(SubscriptionStatus::Inactive));
    assert_eq!(ledger_view(&ledger), vec![(dec!(1000), "error".to_string())]);
}

#[tokio::test]
async fn transport_error_is_terminal_and_recorded() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::TransportError("connection reset".to_string())]);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(subscription(dec!(1000)), &gateway, &mut ledger, Utc::now())
        .await;

    assert!(out.is(SubscriptionStatus::Inactive));
    assert_eq!(ledger_view(&ledger), vec![(dec!(1000), "transport_error".to_string())]);
}

#[tokio::test]
async fn attempt_index_past_the_ladder_deactivates_without_charging() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::always(ChargeOutcome::Success);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(
            subscription(dec!(1000)).with_retry_attempts(4),
            &gateway,
            &mut ledger,
            Utc::now(),
        )
        .await;

    assert!(out.is(SubscriptionStatus::Inactive));
    assert!(ledger.entries().is_empty());
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn collected_amounts_never_exceed_the_full_amount() {
    let machine = BillingStateMachine::default();
    let amount = dec!(999.99);

    for shortfalls in 0..4 {
        let mut script = vec![ChargeOutcome::InsufficientFunds; shortfalls];
        script.push(ChargeOutcome::Success);
        let gateway = ScriptedGateway::new(script);
        let mut ledger = CycleLedger::new();

        let out = machine
            .run_cycle(subscription(amount), &gateway, &mut ledger, Utc::now())
            .await;

        let collected: Decimal = ledger
            .entries()
            .iter()
            .filter(|e| e.status == "success")
            .map(|e| e.amount)
            .sum();
        assert_eq!(collected + out.remaining_balance, amount);
    }
}

#[tokio::test]
async fn configured_ladder_drives_amounts_and_bound() {
    let machine = BillingStateMachine::new(RetryPolicy::parse("1.0,0.5").unwrap(), Duration::days(3));
    let gateway = ScriptedGateway::always(ChargeOutcome::InsufficientFunds);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(subscription(dec!(80)), &gateway, &mut ledger, Utc::now())
        .await;

    assert!(out.is(SubscriptionStatus::Inactive));
    assert_eq!(out.retry_attempts, 1);
    assert_eq!(
        ledger_view(&ledger),
        vec![
            (dec!(80), "insufficient_funds".to_string()),
            (dec!(40), "insufficient_funds".to_string()),
        ]
    );
}

#[tokio::test]
async fn gateway_sees_the_subscription_and_amount() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::InsufficientFunds, ChargeOutcome::Success]);
    let mut ledger = CycleLedger::new();
    let sub = subscription(dec!(1000));
    let id = sub.id;

    machine.run_cycle(sub, &gateway, &mut ledger, Utc::now()).await;

    let requests = gateway.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.subscription_id == id));
    assert_eq!(requests[1].amount, dec!(750));
}

#[tokio::test]
async fn rungs_that_round_to_zero_are_never_charged() {
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([
        ChargeOutcome::InsufficientFunds,
        ChargeOutcome::InsufficientFunds,
        ChargeOutcome::InsufficientFunds,
        ChargeOutcome::Success,
    ]);
    let mut ledger = CycleLedger::new();

    let out = machine
        .run_cycle(subscription(dec!(0.01)), &gateway, &mut ledger, Utc::now())
        .await;

    assert!(out.is(SubscriptionStatus::Inactive));
    assert_eq!(gateway.requests().len(), 3);
    assert!(ledger.entries().iter().all(|e| e.amount > Decimal::ZERO));
    assert_eq!(
        ledger_view(&ledger),
        vec![
            (dec!(0.01), "insufficient_funds".to_string()),
            (dec!(0.01), "insufficient_funds".to_string()),
            (dec!(0.01), "insufficient_funds".to_string()),
        ]
    );
}

#[tokio::test]
async fn sub_cent_amounts_are_rejected_and_never_overcharged() {
    assert!(Subscription::pending(dec!(10.005), Utc::now()).is_err());

    // Rows loaded from storage bypass `pending`; the charge is still capped.
    let mut sub = subscription(dec!(10));
    sub.amount = dec!(10.005);
    let machine = BillingStateMachine::default();
    let gateway = ScriptedGateway::new([ChargeOutcome::Success]);
    let mut ledger = CycleLedger::new();

    let out = machine.run_cycle(sub, &gateway, &mut ledger, Utc::now()).await;

    assert!(out.is(SubscriptionStatus::Active));
    assert_eq!(out.remaining_balance, Decimal::ZERO);
    assert!(gateway.requests()[0].amount <= dec!(10.005));
}
