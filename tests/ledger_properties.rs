//! Ledger property tests
//!
//! These tests drive the library API directly and check the properties every
//! bankroll must keep whatever the order of edits:
//! - The balance equals the initial balance plus the signed sum of live transactions
//! - Repeating an update changes nothing
//! - A settled bet's effect depends only on its final state, not on its history
//! - Both bankroll modes reach the same balance once a bet is settled
//! - Concurrent settlements on one platform lose no update

use bankroll_ledger::{
    BankrollMode, BetInput, BetService, BetStatus, BetStore, BetUpdate, ConcurrentStore,
    InMemoryStore, LedgerStore, Money, PlatformCategory, PlatformRef,
};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;

fn money(value: Decimal) -> Money {
    Money::new(value)
}

fn open_pmu<S: LedgerStore + BetStore>(store: S, initial: Decimal) -> BetService<S> {
    let service = BetService::new(Arc::new(store));
    service
        .open_platform(1, "PMU", PlatformCategory::Operator, money(initial))
        .unwrap();
    service
}

fn balance<S: LedgerStore + BetStore>(service: &BetService<S>) -> Money {
    service
        .platform(1, PlatformRef::Name("PMU"))
        .unwrap()
        .current_balance()
}

/// Initial balance plus the signed sum of the live transactions
fn ledger_balance<S: LedgerStore + BetStore>(service: &BetService<S>) -> Money {
    let platform = service.platform(1, PlatformRef::Name("PMU")).unwrap();
    service
        .transactions_for_platform(1, platform.id)
        .iter()
        .fold(platform.initial_balance(), |total, tx| {
            total.checked_add(tx.signed_amount()).unwrap()
        })
}

fn assert_invariant<S: LedgerStore + BetStore>(service: &BetService<S>) {
    assert_eq!(balance(service), ledger_balance(service));
}

fn settle(status: BetStatus, payout: Option<Decimal>) -> BetUpdate {
    BetUpdate {
        status: Some(status),
        payout: payout.map(Money::new),
        ..BetUpdate::default()
    }
}

/// Balance change a settled bet should leave behind
fn net_effect(status: BetStatus, stake: Decimal, payout: Decimal) -> Decimal {
    match status {
        BetStatus::Won => payout - stake,
        BetStatus::Lost => -stake,
        BetStatus::Refunded => Decimal::ZERO,
        BetStatus::Pending => Decimal::ZERO,
    }
}

#[rstest]
fn test_edit_history_keeps_invariant(
    #[values(BankrollMode::Immediate, BankrollMode::OnLoss)] mode: BankrollMode,
) {
    let service = open_pmu(InMemoryStore::with_default_mode(mode), dec!(100));
    service
        .create_bet(1, BetInput::new(1, "PMU", money(dec!(10))))
        .unwrap();
    assert_invariant(&service);

    let history = [
        settle(BetStatus::Won, Some(dec!(35))),
        settle(BetStatus::Lost, None),
        settle(BetStatus::Pending, None),
        BetUpdate {
            stake: Some(money(dec!(12))),
            ..BetUpdate::default()
        },
        settle(BetStatus::Refunded, None),
        settle(BetStatus::Won, Some(dec!(40))),
        BetUpdate {
            stake: Some(money(dec!(15))),
            ..BetUpdate::default()
        },
    ];
    for update in history {
        service.update_bet(1, 1, update).unwrap();
        assert_invariant(&service);
    }

    // Won with payout 40 on a final stake of 15
    assert_eq!(balance(&service), money(dec!(125)));
}

#[rstest]
#[case::won(BetStatus::Won, Some(dec!(35)))]
#[case::lost(BetStatus::Lost, None)]
#[case::refunded(BetStatus::Refunded, None)]
fn test_final_state_decides_balance(
    #[case] status: BetStatus,
    #[case] payout: Option<Decimal>,
    #[values(BankrollMode::Immediate, BankrollMode::OnLoss)] mode: BankrollMode,
) {
    let direct = open_pmu(InMemoryStore::with_default_mode(mode), dec!(100));
    direct
        .create_bet(1, BetInput::new(1, "PMU", money(dec!(10))))
        .unwrap();
    direct.update_bet(1, 1, settle(status, payout)).unwrap();

    let winding = open_pmu(InMemoryStore::with_default_mode(mode), dec!(100));
    winding
        .create_bet(1, BetInput::new(1, "PMU", money(dec!(10))))
        .unwrap();
    for detour in [
        settle(BetStatus::Lost, None),
        settle(BetStatus::Won, Some(dec!(80))),
        settle(BetStatus::Refunded, None),
        settle(BetStatus::Pending, None),
    ] {
        winding.update_bet(1, 1, detour).unwrap();
    }
    winding.update_bet(1, 1, settle(status, payout)).unwrap();

    let expected = dec!(100) + net_effect(status, dec!(10), payout.unwrap_or_default());
    assert_eq!(balance(&direct), money(expected));
    assert_eq!(balance(&winding), money(expected));
}

#[rstest]
fn test_repeated_update_changes_nothing(
    #[values(BankrollMode::Immediate, BankrollMode::OnLoss)] mode: BankrollMode,
) {
    let service = open_pmu(InMemoryStore::with_default_mode(mode), dec!(100));
    service
        .create_bet(1, BetInput::new(1, "PMU", money(dec!(10))))
        .unwrap();
    service
        .update_bet(1, 1, settle(BetStatus::Won, Some(dec!(35))))
        .unwrap();

    let platform = service.platform(1, PlatformRef::Name("PMU")).unwrap();
    let balance_once = balance(&service);
    let entries_once = service.transactions_for_platform(1, platform.id);

    for _ in 0..5 {
        service
            .update_bet(1, 1, settle(BetStatus::Won, Some(dec!(35))))
            .unwrap();
    }

    assert_eq!(balance(&service), balance_once);
    assert_eq!(
        service.transactions_for_platform(1, platform.id),
        entries_once
    );
}

#[test]
fn test_modes_converge_on_mixed_portfolio() {
    let immediate = open_pmu(InMemoryStore::new(), dec!(500));
    immediate.set_bankroll_mode(1, BankrollMode::Immediate);
    let on_loss = open_pmu(InMemoryStore::new(), dec!(500));
    on_loss.set_bankroll_mode(1, BankrollMode::OnLoss);

    let portfolio = [
        (dec!(10), BetStatus::Won, Some(dec!(22.5))),
        (dec!(7.25), BetStatus::Lost, None),
        (dec!(30), BetStatus::Refunded, None),
        (dec!(0.5), BetStatus::Won, Some(dec!(1.05))),
        (dec!(100), BetStatus::Lost, None),
    ];

    for service in [&immediate, &on_loss] {
        for (bet, (stake, status, payout)) in (1u64..).zip(portfolio) {
            service
                .create_bet(1, BetInput::new(bet, "PMU", money(stake)))
                .unwrap();
            service.update_bet(1, bet, settle(status, payout)).unwrap();
        }
        assert_invariant(service);
    }

    let expected = portfolio
        .iter()
        .fold(dec!(500), |total, (stake, status, payout)| {
            total + net_effect(*status, *stake, payout.unwrap_or_default())
        });
    assert_eq!(balance(&immediate), money(expected));
    assert_eq!(balance(&on_loss), money(expected));
}

#[test]
fn test_concurrent_settlements_on_one_platform() {
    const BETS: u64 = 64;

    let service = open_pmu(ConcurrentStore::new(), dec!(1000));
    for bet in 1..=BETS {
        service
            .create_bet(1, BetInput::new(bet, "PMU", money(dec!(5))))
            .unwrap();
    }
    assert_eq!(balance(&service), money(dec!(680)));

    let handles: Vec<_> = (0..8u64)
        .map(|worker| {
            let service = service.clone();
            thread::spawn(move || {
                for bet in (1..=BETS).filter(|bet| bet % 8 == worker) {
                    // Even bets win 12, odd bets lose
                    let update = if bet % 2 == 0 {
                        settle(BetStatus::Won, Some(dec!(12)))
                    } else {
                        settle(BetStatus::Lost, None)
                    };
                    service.update_bet(1, bet, update).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 32 winners credit 12 each on top of 64 deducted stakes
    assert_eq!(balance(&service), money(dec!(1064)));
    assert_invariant(&service);
}

#[test]
fn test_rejected_edit_leaves_no_trace() {
    let service = open_pmu(InMemoryStore::new(), dec!(100));
    service
        .create_bet(1, BetInput::new(1, "PMU", money(dec!(10))))
        .unwrap();
    let platform = service.platform(1, PlatformRef::Name("PMU")).unwrap();
    let entries = service.transactions_for_platform(1, platform.id);

    let error = service
        .update_bet(1, 1, settle(BetStatus::Won, None))
        .unwrap_err();

    assert!(error.is_client_error());
    assert_eq!(service.get_bet(1, 1).unwrap().status, BetStatus::Pending);
    assert_eq!(service.transactions_for_platform(1, platform.id), entries);
    assert_eq!(balance(&service), money(dec!(90)));
}
