//! End-to-end tests across the whole lobby lifecycle:
//! create -> join -> start -> arbiter-signed end -> withdraw.
//!
//! Every scenario runs against real ed25519 attestations and the in-memory
//! custody, and checks pot conservation at the end.

use rust_decimal::Decimal;
use stakepot_attest::Ed25519Attester;
use stakepot_escrow::{InMemoryCustody, ValueCustody};
use stakepot_settlement::SettlementEngine;
use stakepot_types::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// Helper: engine plus the arbiter key and a few funded players.
struct Table {
    engine: SettlementEngine<InMemoryCustody>,
    arbiter: Ed25519Attester,
    admin: Identity,
}

impl Table {
    fn new() -> Self {
        Self::with_config(|c| c)
    }

    fn with_config(tweak: impl FnOnce(EngineConfig) -> EngineConfig) -> Self {
        init_tracing();
        let arbiter = Ed25519Attester::random();
        let admin = Identity::random();
        let config = tweak(EngineConfig::new(arbiter.identity(), admin));
        let engine = SettlementEngine::new(config, InMemoryCustody::new()).unwrap();
        Self {
            engine,
            arbiter,
            admin,
        }
    }

    fn player(&mut self, funds: i64) -> Identity {
        let who = Identity::random();
        self.engine.custody_mut().fund(who, dec(funds));
        who
    }

    fn settle(&mut self, lobby: LobbyId, payouts: &[Decimal]) -> Result<()> {
        let sig = self.arbiter.attest(lobby, payouts);
        self.engine.end_game(lobby, payouts, &sig)
    }
}

#[test]
fn public_lobby_full_lifecycle() {
    let mut t = Table::new();
    let a = t.player(10);
    let b = t.player(10);
    let c = t.player(10);

    let lobby = t.engine.create_public_lobby(a, dec(1), 2, dec(1)).unwrap();
    assert_eq!(lobby, LobbyId(constants::FIRST_LOBBY_ID));
    t.engine.join_game(b, lobby, dec(1)).unwrap();
    assert_eq!(
        t.engine.join_game(c, lobby, dec(1)),
        Err(StakepotError::LobbyFull)
    );
    assert_eq!(t.engine.custody().wallet(c), dec(10));

    t.engine.start_game(a, lobby).unwrap();
    assert!(t.engine.lobbies().is_locked(lobby).unwrap());

    t.settle(lobby, &[dec(1), dec(1)]).unwrap();
    assert!(t.engine.lobbies().is_ended(lobby).unwrap());
    assert_eq!(t.engine.lobbies().pot(lobby).unwrap(), Decimal::ZERO);
    assert_eq!(t.engine.balance_of(a), dec(1));
    assert_eq!(t.engine.balance_of(b), dec(1));

    assert_eq!(t.engine.withdraw(b).unwrap(), dec(1));
    assert_eq!(t.engine.custody().wallet(b), dec(10));
    assert_eq!(t.engine.balance_of(b), Decimal::ZERO);
    assert_eq!(t.engine.withdraw(b), Err(StakepotError::NothingToWithdraw));

    assert_eq!(t.engine.withdraw(a).unwrap(), dec(1));
    assert_eq!(t.engine.custody().wallet(a), dec(10));
    assert_eq!(t.engine.withdraw(a), Err(StakepotError::NothingToWithdraw));

    assert_eq!(t.engine.custody().escrowed(), Decimal::ZERO);
    t.engine.verify_conservation().unwrap();
}

#[test]
fn private_lobby_with_whitelisted_creator() {
    let mut t = Table::new();
    let a = t.player(10);
    let b = t.player(10);
    let c = t.player(10);

    let lobby = t
        .engine
        .create_private_lobby(a, dec(1), vec![a, b], dec(1))
        .unwrap();
    assert_eq!(
        t.engine.join_game(c, lobby, dec(1)),
        Err(StakepotError::Unauthorized)
    );
    assert_eq!(
        t.engine.join_game(a, lobby, dec(1)),
        Err(StakepotError::AlreadyJoined)
    );
    t.engine.join_game(b, lobby, dec(1)).unwrap();
    assert_eq!(t.engine.lobbies().participants(lobby).unwrap(), &[a, b]);

    t.engine.start_game(a, lobby).unwrap();
    t.settle(lobby, &[dec(1), dec(1)]).unwrap();
    assert_eq!(t.engine.balance_of(a), dec(1));
    assert_eq!(t.engine.balance_of(b), dec(1));

    for who in [a, b] {
        assert_eq!(t.engine.withdraw(who).unwrap(), dec(1));
        assert_eq!(t.engine.custody().wallet(who), dec(10));
        assert_eq!(t.engine.withdraw(who), Err(StakepotError::NothingToWithdraw));
    }
    assert_eq!(t.engine.custody().wallet(c), dec(10));
    t.engine.verify_conservation().unwrap();
}

#[test]
fn private_lobby_admits_only_whitelist() {
    let mut t = Table::new();
    let creator = t.player(10);
    let a = t.player(10);
    let b = t.player(10);
    let c = t.player(10);

    let lobby = t
        .engine
        .create_private_lobby(creator, dec(2), vec![a, b], dec(2))
        .unwrap();
    assert_eq!(
        t.engine.lobbies().visibility(lobby).unwrap(),
        Visibility::Private
    );
    assert_eq!(t.engine.lobbies().capacity(lobby).unwrap(), None);
    assert_eq!(t.engine.lobbies().whitelist_entry(lobby, 1).unwrap(), Some(b));

    assert_eq!(
        t.engine.join_game(c, lobby, dec(2)),
        Err(StakepotError::Unauthorized)
    );
    t.engine.join_game(a, lobby, dec(2)).unwrap();
    assert_eq!(
        t.engine.join_game(a, lobby, dec(2)),
        Err(StakepotError::AlreadyJoined)
    );
    assert!(matches!(
        t.engine.join_game(b, lobby, dec(1)),
        Err(StakepotError::WrongStake { .. })
    ));
    t.engine.join_game(b, lobby, dec(2)).unwrap();

    // Non-creators cannot start.
    assert_eq!(
        t.engine.start_game(a, lobby),
        Err(StakepotError::Unauthorized)
    );
    t.engine.start_game(creator, lobby).unwrap();
    assert_eq!(
        t.engine.start_game(creator, lobby),
        Err(StakepotError::AlreadyLocked)
    );

    t.settle(lobby, &[dec(0), dec(6), dec(0)]).unwrap();
    assert_eq!(t.engine.balance_of(a), dec(6));
    t.engine.verify_conservation().unwrap();
}

#[test]
fn double_settlement_rejected() {
    let mut t = Table::new();
    let a = t.player(10);
    let lobby = t.engine.create_public_lobby(a, dec(1), 1, dec(1)).unwrap();
    t.engine.start_game(a, lobby).unwrap();

    t.settle(lobby, &[dec(1)]).unwrap();
    assert_eq!(
        t.settle(lobby, &[dec(1)]),
        Err(StakepotError::AlreadyEnded)
    );
    assert_eq!(t.engine.balance_of(a), dec(1));
}

#[test]
fn signature_bound_to_lobby_and_payouts() {
    let mut t = Table::new();
    let a = t.player(10);
    let b = t.player(10);
    let first = t.engine.create_public_lobby(a, dec(1), 2, dec(1)).unwrap();
    t.engine.join_game(b, first, dec(1)).unwrap();
    t.engine.start_game(a, first).unwrap();
    let second = t.engine.create_public_lobby(a, dec(1), 1, dec(1)).unwrap();
    t.engine.start_game(a, second).unwrap();

    // Signed for other payouts.
    let sig = t.arbiter.attest(first, &[dec(2), dec(0)]);
    assert_eq!(
        t.engine.end_game(first, &[dec(0), dec(2)], &sig),
        Err(StakepotError::BadSignature)
    );

    // Signed for another lobby.
    let sig = t.arbiter.attest(second, &[dec(1), dec(1)]);
    assert_eq!(
        t.engine.end_game(first, &[dec(1), dec(1)], &sig),
        Err(StakepotError::BadSignature)
    );

    // Garbage bytes.
    assert_eq!(
        t.engine.end_game(first, &[dec(1), dec(1)], &[0u8; 12]),
        Err(StakepotError::BadSignature)
    );

    assert!(!t.engine.lobbies().is_ended(first).unwrap());
    assert_eq!(t.engine.balance_of(a), Decimal::ZERO);
    t.settle(first, &[dec(0), dec(2)]).unwrap();
    assert_eq!(t.engine.balance_of(b), dec(2));
}

#[test]
fn credits_accumulate_across_lobbies() {
    let mut t = Table::new();
    let a = t.player(10);
    let b = t.player(10);

    for _ in 0..3 {
        let lobby = t.engine.create_public_lobby(a, dec(1), 2, dec(1)).unwrap();
        t.engine.join_game(b, lobby, dec(1)).unwrap();
        t.engine.start_game(a, lobby).unwrap();
        t.settle(lobby, &[dec(0), dec(2)]).unwrap();
    }

    assert_eq!(t.engine.lobbies().len(), 3);
    assert_eq!(t.engine.balance_of(b), dec(6));
    assert_eq!(t.engine.withdraw(b).unwrap(), dec(6));
    assert_eq!(t.engine.custody().wallet(b), dec(13));
    assert_eq!(t.engine.custody().wallet(a), dec(7));
    t.engine.verify_conservation().unwrap();
}

#[test]
fn fee_registry_admin_only() {
    let mut t = Table::new();
    let outsider = t.player(0);
    assert_eq!(t.engine.fee(), constants::DEFAULT_FEE_PERCENT);
    assert_eq!(
        t.engine.set_fee(outsider, 10),
        Err(StakepotError::Unauthorized)
    );
    assert_eq!(t.engine.fee(), constants::DEFAULT_FEE_PERCENT);

    let admin = t.admin;
    assert_eq!(
        t.engine.set_fee(admin, 101),
        Err(StakepotError::InvalidFee(101))
    );
    t.engine.set_fee(admin, 0).unwrap();
    assert_eq!(t.engine.fee(), 0);
}

#[test]
fn informational_fee_does_not_reduce_payouts() {
    let mut t = Table::new();
    let a = t.player(10);
    let b = t.player(10);
    let lobby = t.engine.create_public_lobby(a, dec(1), 2, dec(1)).unwrap();
    t.engine.join_game(b, lobby, dec(1)).unwrap();
    t.engine.start_game(a, lobby).unwrap();

    t.settle(lobby, &[dec(1), dec(1)]).unwrap();
    assert_eq!(t.engine.balance_of(t.admin), Decimal::ZERO);

    let ended = t.engine.events().events().last().unwrap();
    match &ended.kind {
        EventKind::Ended { fee, residual, .. } => {
            assert_eq!(*fee, Decimal::new(1, 1));
            assert_eq!(*residual, Decimal::ZERO);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn deduct_policy_pays_fee_to_administrator() {
    let mut t = Table::with_config(|c| {
        c.with_fee_policy(FeePolicy::DeductFromPot)
            .with_fee_percent(10)
    });
    let a = t.player(100);
    let b = t.player(100);
    let lobby = t.engine.create_public_lobby(a, dec(10), 2, dec(10)).unwrap();
    t.engine.join_game(b, lobby, dec(10)).unwrap();
    t.engine.start_game(a, lobby).unwrap();

    assert!(matches!(
        t.settle(lobby, &[dec(10), dec(10)]),
        Err(StakepotError::PayoutExceedsPot { .. })
    ));
    t.settle(lobby, &[dec(18), dec(0)]).unwrap();

    let admin = t.admin;
    assert_eq!(t.engine.balance_of(admin), dec(2));
    assert_eq!(t.engine.withdraw(admin).unwrap(), dec(2));
    assert_eq!(t.engine.custody().wallet(admin), dec(2));
    t.engine.verify_conservation().unwrap();
}

#[test]
fn config_loaded_from_json() {
    init_tracing();
    let arbiter = Ed25519Attester::random();
    let admin = Identity::random();
    let json = serde_json::json!({
        "authority": arbiter.identity(),
        "administrator": admin,
        "fee_policy": "deduct_from_pot",
        "min_participants": 2,
    });
    let config = EngineConfig::from_json_str(&json.to_string()).unwrap();
    let mut engine = SettlementEngine::new(config, InMemoryCustody::new()).unwrap();

    let a = Identity::random();
    engine.custody_mut().fund(a, dec(5));
    let lobby = engine.create_public_lobby(a, dec(1), 4, dec(1)).unwrap();
    assert_eq!(
        engine.start_game(a, lobby),
        Err(StakepotError::NotEnoughParticipants {
            needed: 2,
            actual: 1
        })
    );
}

#[test]
fn rejected_withdrawal_keeps_balance() {
    let mut t = Table::new();
    let a = t.player(10);
    let lobby = t.engine.create_public_lobby(a, dec(3), 1, dec(3)).unwrap();
    t.engine.start_game(a, lobby).unwrap();
    t.settle(lobby, &[dec(3)]).unwrap();

    t.engine.custody_mut().reject_incoming(a);
    assert!(matches!(
        t.engine.withdraw(a),
        Err(StakepotError::CustodyFailed { .. })
    ));
    assert_eq!(t.engine.balance_of(a), dec(3));
    assert_eq!(t.engine.custody().escrowed(), dec(3));
    t.engine.verify_conservation().unwrap();

    t.engine.custody_mut().accept_incoming(a);
    assert_eq!(t.engine.withdraw(a).unwrap(), dec(3));
    assert_eq!(t.engine.custody().wallet(a), dec(10));
}

#[test]
fn supply_conserved_over_many_lobbies() {
    let mut t = Table::new();
    let players: Vec<Identity> = (0..6).map(|_| t.player(50)).collect();
    let supply = t.engine.custody().total_supply().unwrap();

    for round in 0..10usize {
        let creator = players[round % players.len()];
        let joiner = players[(round + 1) % players.len()];
        let stake = Decimal::new(i64::try_from(round).unwrap() + 1, 1);
        let lobby = t
            .engine
            .create_public_lobby(creator, stake, 2, stake)
            .unwrap();
        t.engine.join_game(joiner, lobby, stake).unwrap();
        t.engine.start_game(creator, lobby).unwrap();

        // Alternate winners; odd rounds leave a residual.
        let pot = stake * dec(2);
        let payouts = if round % 2 == 0 {
            [pot, Decimal::ZERO]
        } else {
            [Decimal::ZERO, pot - Decimal::new(1, 2)]
        };
        t.settle(lobby, &payouts).unwrap();
        t.engine.verify_conservation().unwrap();
    }

    for p in &players {
        let _ = t.engine.withdraw(*p);
    }
    let admin = t.admin;
    assert!(t.engine.balance_of(admin) > Decimal::ZERO);
    t.engine.withdraw(admin).unwrap();

    assert!(t.engine.ledger().is_empty());
    assert_eq!(t.engine.custody().escrowed(), Decimal::ZERO);
    assert_eq!(t.engine.custody().total_supply().unwrap(), supply);
    t.engine.verify_conservation().unwrap();
}
