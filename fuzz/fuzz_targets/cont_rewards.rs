#![no_main]

use arbitrary::Arbitrary;
use cont_rewards::{CategoryInit, ContRewardsContract, ContRewardsContractClient, ContType};
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    vec, Address, Env, String,
};

#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Create { owner: u8, count: u8, cont_type: u8 },
    CashOut { owner: u8, index: u8 },
    CashOutAll { owner: u8 },
    ChangeApr { cont_type: u8, reduction: i64 },
    UndoApr { cont_type: u8 },
    ResetApr { cont_type: u8, apr: u32 },
    SetTimeout { seconds: u16 },
    SetAutoReduce { interval: u32, rate: u32 },
    Advance { seconds: u32 },
}

fn cont_type(n: u8) -> ContType {
    ContType::ALL[n as usize % ContType::ALL.len()]
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_700_000_000);

    let admin = Address::generate(&env);
    let token = Address::generate(&env);
    let categories = vec![
        &env,
        CategoryInit { cont_type: ContType::Bronze, price: 1_000_000, apr: 10_000_000 },
        CategoryInit { cont_type: ContType::Silver, price: 2_000_000, apr: 12_000_000 },
        CategoryInit { cont_type: ContType::Gold, price: 5_000_000, apr: 15_000_000 },
    ];
    let contract_id = env.register(ContRewardsContract, (admin.clone(), token.clone(), categories));
    let client = ContRewardsContractClient::new(&env, &contract_id);

    let mut owners = std::vec::Vec::new();
    for _ in 0..4 {
        owners.push(Address::generate(&env));
    }

    // Looking for panics (overflow, out-of-bounds) and for settlements that
    // disagree with the pending-reward view.
    for action in actions.into_iter().take(64) {
        match action {
            FuzzAction::Create { owner, count, cont_type: t } => {
                let mut names = soroban_sdk::Vec::new(&env);
                for _ in 0..(count % 4) {
                    names.push_back(String::from_str(&env, "fuzz"));
                }
                let owner = &owners[owner as usize % owners.len()];
                let _ = client.try_create_conts(&token, owner, &names, &cont_type(t));
            }
            FuzzAction::CashOut { owner, index } => {
                let owner = &owners[owner as usize % owners.len()];
                let index = index as u32 % 8;
                let expected = client.try_get_cont_reward(owner, &index);
                if let (Ok(Ok(expected)), Ok(Ok(paid))) =
                    (expected, client.try_cash_out(&token, owner, &index))
                {
                    assert_eq!(expected, paid);
                }
            }
            FuzzAction::CashOutAll { owner } => {
                let owner = &owners[owner as usize % owners.len()];
                let expected = client.try_get_total_rewards(owner);
                if let (Ok(Ok(expected)), Ok(Ok(paid))) =
                    (expected, client.try_cash_out_all(&token, owner))
                {
                    assert_eq!(expected, paid);
                }
            }
            FuzzAction::ChangeApr { cont_type: t, reduction } => {
                let _ = client.try_change_apr(&admin, &cont_type(t), &(reduction as i128));
            }
            FuzzAction::UndoApr { cont_type: t } => {
                let _ = client.try_undo_apr_change(&admin, &cont_type(t));
            }
            FuzzAction::ResetApr { cont_type: t, apr } => {
                let _ = client.try_reset_apr_changes(&admin, &cont_type(t), &(apr as u128));
            }
            FuzzAction::SetTimeout { seconds } => {
                let _ = client.try_set_cashout_timeout(&admin, &(seconds as u64));
            }
            FuzzAction::SetAutoReduce { interval, rate } => {
                let _ = client.try_set_auto_reduce_interval(&admin, &(interval as u64).max(86_400));
                let _ = client.try_set_auto_reduce_rate(&admin, &(rate as i128));
            }
            FuzzAction::Advance { seconds } => {
                let now = env.ledger().timestamp();
                env.ledger().set_timestamp(now + (seconds % 34_560_000) as u64);
            }
        }
    }
});
