use criterion::{Criterion, criterion_group, criterion_main};
use parity_scale_codec::Encode;
use spectre_pse_client::abi::{ContractSchema, Selector, decode_exact, encode_call_data};
use spectre_pse_client::domain::{
    AccountId, ContractVersion, MessageResult, Network, OnchainTradingPublicKeys, SigningResult,
};
use std::hint::black_box;

fn bench_selector(c: &mut Criterion) {
    c.bench_function("selector_from_label", |b| {
        b.iter(|| Selector::from_label(black_box("generate_onchain_trading_account")))
    });

    let schema = ContractSchema::for_version(ContractVersion::V3);
    let selector = Selector::from_label("register_trading_account_to_spectre");
    c.bench_function("message_by_selector", |b| {
        b.iter(|| schema.message_by_selector(black_box(selector)))
    });
}

fn bench_encode(c: &mut Criterion) {
    let selector = Selector::from_label("sign");
    let message = vec![0xabu8; 256];

    c.bench_function("encode_sign_call_data", |b| {
        b.iter(|| encode_call_data(selector, &(black_box(Network::Solana), black_box(&message))))
    });
}

fn bench_decode(c: &mut Criterion) {
    let keys: MessageResult<SigningResult<OnchainTradingPublicKeys>> =
        Ok(Ok(OnchainTradingPublicKeys {
            substrate: AccountId::new([1; 32]),
            ethereum: AccountId::new([2; 32]),
            solana: AccountId::new([3; 32]),
        }));
    let bytes = keys.encode();

    c.bench_function("decode_public_keys", |b| {
        b.iter(|| {
            let _ = decode_exact::<MessageResult<SigningResult<OnchainTradingPublicKeys>>>(
                black_box(&bytes),
            );
        })
    });
}

criterion_group!(benches, bench_selector, bench_encode, bench_decode);
criterion_main!(benches);
