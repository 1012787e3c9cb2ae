//! Fuzz target for dataset parsing and the readiness barrier
//!
//! # Invariants
//!
//! - Parsing arbitrary bytes never panics
//! - The barrier fires at most once, and only when all four datasets loaded
//! - A failed dataset stays failed

#![no_main]

use arbitrary::Arbitrary;
use greeter_core::{Dataset, DatasetLoader, DatasetPayload, FetchResponse, LoadStatus};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Completion {
    dataset: u8,
    status: u16,
    body: Vec<u8>,
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    requested: [bool; 4],
    completions: Vec<Completion>,
}

fuzz_target!(|input: FuzzInput| {
    let loader = DatasetLoader::new(0);
    for (dataset, requested) in Dataset::ALL.into_iter().zip(input.requested) {
        if requested {
            assert!(loader.request(dataset));
        }
    }

    let mut fired = 0;
    for completion in input.completions {
        let dataset = Dataset::ALL[usize::from(completion.dataset) % Dataset::ALL.len()];
        let _ = DatasetPayload::parse(dataset, &completion.body);

        let failed_before = matches!(loader.status(dataset), LoadStatus::Failed(_));
        let response = if completion.status % 2 == 0 {
            FetchResponse::ok(completion.body)
        } else {
            FetchResponse::status(completion.status)
        };

        if let Ok(Some(datasets)) = loader.complete(dataset, Ok(response)) {
            fired += 1;
            assert_eq!(datasets.generation(), 0);
            assert!(loader.is_ready());
        }

        if failed_before {
            assert!(matches!(loader.status(dataset), LoadStatus::Failed(_)));
        }
    }

    assert!(fired <= 1);
    assert_eq!(fired == 1, loader.has_fired());
});
