use std::fs;
use std::path::PathBuf;

use zhaomu::rendering::{BlockGlyphs, CardRenderer};
use zhaomu::DailySummary;

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

#[test]
fn golden_card_matches_fixture() {
    let raw = fs::read_to_string("tests/fixtures/summary_sample.json").expect("read fixture");
    let summary: DailySummary = serde_json::from_str(&raw).expect("parse fixture");

    // Block glyphs keep the output independent of installed fonts
    let mut renderer = CardRenderer::with_engine(BlockGlyphs::new());
    let card = renderer.render(&summary).expect("render");
    let digest = card.digest();

    let expected_path = golden_path("summary_sample.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() || !expected_path.exists() {
        fs::create_dir_all("tests/goldens/expected").expect("create goldens dir");
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Recorded golden {:?}; commit it with the change", expected_path);
    }

    let expected = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, expected.trim());
}

#[test]
fn golden_digest_is_stable_across_renderers() {
    let raw = fs::read_to_string("tests/fixtures/summary_sample.json").expect("read fixture");
    let summary: DailySummary = serde_json::from_str(&raw).expect("parse fixture");

    let a = CardRenderer::with_engine(BlockGlyphs::new()).render(&summary).unwrap();
    let b = CardRenderer::with_engine(BlockGlyphs::new()).render(&summary).unwrap();
    assert_eq!(a.digest(), b.digest());
    assert_eq!(hex::decode(a.digest()).unwrap().len(), 32);
}
