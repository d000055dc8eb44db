// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap: pinned fetch, auto-fetched checksum, and the full
//! fetch-then-parse round trip.

use sha2::{Digest, Sha256};
use sink_bootstrap::{BootstrapError, BootstrapLoader, FakeFetcher, FakeVerifier};
use sink_config::{parse_config, Bootstrap};

const SHA: &str = "abc0123abc0123abc0123abc0123abc0123abc01";

const REMOTE_BODY: &str = r#"{
    "version": "1.0.0",
    "platforms": [{"os": "linux", "name": "Linux", "install_steps": [
        {"name": "hello", "command": "echo hi"}
    ]}]
}"#;

fn pinned_url() -> String {
    format!("https://raw.githubusercontent.com/o/r/{}/c.json", SHA)
}

fn loader(fetcher: &FakeFetcher) -> BootstrapLoader {
    BootstrapLoader::with_parts(Box::new(fetcher.clone()), Box::new(FakeVerifier::new()))
}

fn policy(url: &str) -> Bootstrap {
    serde_json::from_str(&format!(
        r#"{{
            "security": {{"require_https": true, "require_pinning": true}},
            "remote_configs": [{{"url": "{}", "verification": {{"auto_fetch_checksum": true}}}}]
        }}"#,
        url
    ))
    .unwrap()
}

#[tokio::test]
async fn pinned_url_with_matching_checksum_yields_parseable_config() {
    let url = pinned_url();
    let fetcher = FakeFetcher::new();
    fetcher.serve_bytes(url.clone(), REMOTE_BODY);
    fetcher.serve_bytes(
        format!("{}.sha256", url),
        format!("{}  c.json\n", hex::encode(Sha256::digest(REMOTE_BODY))),
    );

    let body = loader(&fetcher).load(&policy(&url), &url).unwrap();
    let config = parse_config(&String::from_utf8(body).unwrap()).unwrap();
    assert_eq!(config.platforms[0].name, "Linux");
}

#[tokio::test]
async fn flipped_body_byte_is_a_checksum_mismatch() {
    let url = pinned_url();
    let fetcher = FakeFetcher::new();
    let mut tampered = REMOTE_BODY.as_bytes().to_vec();
    tampered[0] ^= 0x01;
    fetcher.serve_bytes(url.clone(), tampered);
    fetcher.serve_bytes(
        format!("{}.sha256", url),
        format!("{}  c.json\n", hex::encode(Sha256::digest(REMOTE_BODY))),
    );

    let err = loader(&fetcher).load(&policy(&url), &url).unwrap_err();
    assert!(matches!(err, BootstrapError::ChecksumMismatch { .. }));
    assert!(err.to_string().contains("checksum mismatch"));
}

#[tokio::test]
async fn branch_ref_is_rejected_under_pinning_before_fetch() {
    let url = "https://raw.githubusercontent.com/o/r/main/c.json";
    let fetcher = FakeFetcher::new();

    let err = loader(&fetcher).load(&policy(url), url).unwrap_err();
    assert!(matches!(err, BootstrapError::PinningRequired { .. }));
    assert!(fetcher.fetched().is_empty());
}

#[tokio::test]
async fn config_level_bootstrap_block_drives_the_loader() {
    // The bootstrap block can itself come from a local config file.
    let url = pinned_url();
    let local = format!(
        r#"{{
            "version": "1.0.0",
            "bootstrap": {{
                "security": {{"require_https": true, "require_pinning": true}},
                "remote_configs": [{{"url": "{}", "verification": {{"auto_fetch_checksum": true}}}}]
            }},
            "platforms": [{{"os": "linux", "name": "Stub", "install_steps": [
                {{"name": "s", "command": "true"}}
            ]}}]
        }}"#,
        url
    );
    let local_config = parse_config(&local).unwrap();
    let bootstrap = local_config.bootstrap.unwrap();

    let fetcher = FakeFetcher::new();
    fetcher.serve_bytes(url.clone(), REMOTE_BODY);
    fetcher.serve_bytes(
        format!("{}.sha256", url),
        format!("{}\n", hex::encode(Sha256::digest(REMOTE_BODY))),
    );

    let body = loader(&fetcher).load(&bootstrap, &url).unwrap();
    assert_eq!(body, REMOTE_BODY.as_bytes());
}
