use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hookpay_types::PublicKey;

fn schnorr_sign_bench(c: &mut Criterion) {
    let sk = hookpay_crypto::random_private_key();
    let msg = [42u8; 128];

    c.bench_function("schnorr_sign_128B", |b| {
        b.iter(|| hookpay_crypto::sign_message(black_box(&msg), &sk))
    });
}

fn schnorr_verify_bench(c: &mut Criterion) {
    let sk = hookpay_crypto::random_private_key();
    let pk = hookpay_crypto::public_from_private(&sk);
    let msg = [42u8; 128];
    let sig = hookpay_crypto::sign_message(&msg, &sk);

    c.bench_function("schnorr_verify_128B", |b| {
        b.iter(|| hookpay_crypto::verify_signature(black_box(&msg), &sig, &pk))
    });
}

fn aggregate_sign_bench(c: &mut Criterion) {
    let keys: Vec<_> = (0..16).map(|_| hookpay_crypto::random_private_key()).collect();
    let refs: Vec<_> = keys.iter().collect();

    c.bench_function("aggregate_sign_16_inputs", |b| {
        b.iter(|| hookpay_crypto::aggregate_sign(black_box(b"transfer"), &refs))
    });
}

fn blind_roundtrip_bench(c: &mut Criterion) {
    let signer = hookpay_crypto::random_private_key();
    let signer_pub = hookpay_crypto::public_from_private(&signer);
    let nonce = hookpay_crypto::random_private_key();
    let nonce_pub = hookpay_crypto::public_from_private(&nonce);
    let owner = PublicKey([7u8; 32]);

    c.bench_function("blind_sign_unblind", |b| {
        b.iter(|| {
            let (blinded, factor) = hookpay_crypto::blind_message(
                black_box(owner.as_bytes()),
                &signer_pub,
                &nonce_pub,
                b"blinding-secret",
            )
            .unwrap();
            let sig = hookpay_crypto::blind_sign(&signer, &nonce, &blinded).unwrap();
            hookpay_crypto::unblind(&sig, &factor).unwrap()
        })
    });
}

fn hash_labeled_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("hash_labeled_256B", |b| {
        b.iter(|| hookpay_crypto::hash_labeled("bench", &[black_box(&data[..])]))
    });
}

fn tweak_public_bench(c: &mut Criterion) {
    let base = hookpay_crypto::public_from_private(&hookpay_crypto::random_private_key());

    c.bench_function("tweak_public_key", |b| {
        b.iter(|| hookpay_crypto::tweak_public_key(&base, black_box(b"index")).unwrap())
    });
}

criterion_group!(
    benches,
    schnorr_sign_bench,
    schnorr_verify_bench,
    aggregate_sign_bench,
    blind_roundtrip_bench,
    hash_labeled_bench,
    tweak_public_bench,
);
criterion_main!(benches);
