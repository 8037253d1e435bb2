use docqa_core::config::EmbeddingConfig;
use docqa_embed::{default_embedder, Embedder, HashEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(256);
    let v1 = embedder.embed_text("hello world").expect("embed");
    let v2 = embedder.embed_text("hello world").expect("embed");

    assert_eq!(v1.len(), 256, "embedding dim is 256");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn overlapping_text_scores_higher_than_unrelated_text() {
    let embedder = HashEmbedder::new(512);
    let q = embedder.embed_text("water pump maintenance").unwrap();
    let near = embedder.embed_text("maintenance schedule for the water pump").unwrap();
    let far = embedder.embed_text("knitting wool socks").unwrap();
    assert!(dot(&q, &near) > dot(&q, &far));
}

#[test]
fn cjk_text_gets_bigram_signal() {
    let embedder = HashEmbedder::new(512);
    let q = embedder.embed_text("狗喜欢跑步").unwrap();
    let near = embedder.embed_text("狗喜欢跑步。").unwrap();
    let far = embedder.embed_text("鸟喜欢飞翔。").unwrap();
    assert!(dot(&q, &near) > dot(&q, &far));
}

#[test]
fn default_embedder_follows_config() {
    let embedder = default_embedder(&EmbeddingConfig::default()).expect("embedder");
    assert_eq!(embedder.dim(), 384);
    assert_eq!(embedder.embedder_id(), "hash:xxh64:d384");

    let bad = EmbeddingConfig { provider: "remote".to_string(), dimension: 8 };
    assert!(default_embedder(&bad).is_err());
}
