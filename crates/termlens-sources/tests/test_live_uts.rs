//! Live calls against UTS and RxNav.
//!
//! Run with: UMLS_API_KEY=... cargo test --package termlens-sources --test test_live_uts -- --ignored --nocapture

use std::sync::Arc;

use termlens_common::{ApiKey, SandboxClient};
use termlens_sources::models::DetailRecords;
use termlens_sources::rxnav::RXNAV_BASE_URL;
use termlens_sources::uts::{UTS_CONTENT_URL, UTS_SEARCH_URL};
use termlens_sources::{DetailKind, ReturnIdType, RxNavClient, UtsClient, UtsEndpoints};

fn uts() -> UtsClient {
    let transport = Arc::new(SandboxClient::new().expect("client"));
    UtsClient::new(transport, UtsEndpoints::new(UTS_SEARCH_URL, UTS_CONTENT_URL).unwrap())
}

fn api_key() -> ApiKey {
    let raw = std::env::var("UMLS_API_KEY").expect("UMLS_API_KEY must be set for live tests");
    ApiKey::parse(&raw).expect("UMLS_API_KEY is blank")
}

#[tokio::test]
#[ignore] // Requires network access and a UTS key
async fn test_live_search_diabetes() {
    let uts = uts();
    let req = uts.prepare_search(&api_key(), "diabetes", ReturnIdType::Concept, &[]);
    println!("GET {}", req.trace());

    let fetched = uts.search(&req).await.expect("UTS search failed");
    println!("Found {} hits", fetched.data.len());
    for hit in &fetched.data {
        println!("{:?} {:?}", hit.ui, hit.name);
    }
    assert!(!fetched.data.is_empty(), "Should find at least one concept");
}

#[tokio::test]
#[ignore] // Requires network access and a UTS key
async fn test_live_atoms_for_diabetes() {
    let uts = uts();
    let req = uts
        .prepare_concept_detail(&api_key(), "C0011849", DetailKind::Atoms)
        .unwrap();
    let fetched = uts.details(&req, DetailKind::Atoms).await.expect("UTS atoms failed");
    assert!(matches!(fetched.data, DetailRecords::Atoms(ref atoms) if !atoms.is_empty()));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_live_rxcui_to_ndc() {
    let transport = Arc::new(SandboxClient::new().expect("client"));
    let rx = RxNavClient::new(transport, RXNAV_BASE_URL).unwrap();
    let result = rx.convert_rxcui("308416").await.expect("RxNav lookup failed");
    println!("{} NDCs for {}", result.ndcs.len(), result.rxcui);
    assert!(!result.ndcs.is_empty());
}
