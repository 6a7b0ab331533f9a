use rand::{Rng, RngCore};
use rand_xoshiro::{Xoshiro256PlusPlus, rand_core::SeedableRng};

use h1frame::{fields::HeaderMap, message::Message};

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];
const REASONS: &[&str] = &["OK", "Not Found", "Moved Permanently", "Internal Server Error"];
const STATUS_CODES: &[u16] = &[200, 301, 404, 500];

/// Generates a request with a random target, header set, and body.
pub fn generate_request(seed: u64) -> Message {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let method = METHODS[rng.random_range(0..METHODS.len())];
    let target = format!("/resource/{}", rng.random_range(0..100_000));
    let body = generate_body(&mut rng);
    let fields = generate_fields(&mut rng, body.len());

    Message::request(method, target, fields, body)
}

/// Generates a response with a random status, header set, and body.
pub fn generate_response(seed: u64) -> Message {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let index = rng.random_range(0..STATUS_CODES.len());
    let body = generate_body(&mut rng);
    let fields = generate_fields(&mut rng, body.len());

    Message::response(STATUS_CODES[index], REASONS[index], fields, body)
}

fn generate_body(rng: &mut Xoshiro256PlusPlus) -> Vec<u8> {
    let length = rng.random_range(0..2000);
    let mut body = vec![0; length];
    rng.fill_bytes(&mut body);
    body
}

fn generate_fields(rng: &mut Xoshiro256PlusPlus, body_len: usize) -> HeaderMap {
    let mut fields = HeaderMap::new();

    for i in 0..rng.random_range(1..8) {
        fields.insert(
            format!("X-Generated-{}", i),
            format!("value {}", rng.random_range(0..100_000)),
        );
    }

    fields.insert("Content-Length", body_len.to_string());

    fields
}
