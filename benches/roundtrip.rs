use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lostthing::{codec, compound, Compound, Document, Element};

fn sample_page() -> Document {
    let mut doc = Document::new();
    let root = doc.root_mut();
    let body = root.add_new_child("main");
    for i in 0..100 {
        let card = body.add_new_child("div");
        card.set_attribute("class", Some("card"));
        card.set_attribute("id", Some(&format!("item-{i}")));
        card.add_child(Element::with_content("h2", "Lost item"));
        card.add_child(Element::with_content(
            "p",
            "A reasonably long description of the item, where it was last seen and how to reach the owner.",
        ));
        card.add_new_child("img")
            .set_attribute("src", Some("photo.png"));
    }
    doc
}

fn sample_record() -> Compound {
    let entry = compound! {
        1 => 12345u64,
        2 => "Anna",
        3 => "Liepa",
        4 => "anna.liepa@inbox.lv",
        5 => 0x0123_4567_89ab_cdefu64,
        6 => 0xfedc_ba98_7654_3210u64,
        7 => (0..32u64).collect::<Vec<_>>(),
        8 => (0..32u64).collect::<Vec<_>>(),
    };
    compound! { 1 => vec![entry; 100] }
}

fn document_benches(c: &mut Criterion) {
    let doc = sample_page();
    let text = doc.to_html();

    c.bench_function("document_write", |b| {
        b.iter(|| black_box(&doc).to_html());
    });
    c.bench_function("document_parse", |b| {
        b.iter(|| Document::parse(black_box(&text)).unwrap());
    });
}

fn record_benches(c: &mut Criterion) {
    let record = sample_record();
    let bytes = codec::encode(&record).unwrap();

    c.bench_function("record_encode", |b| {
        b.iter(|| codec::encode(black_box(&record)).unwrap());
    });
    c.bench_function("record_decode", |b| {
        b.iter(|| codec::decode(black_box(&bytes)).unwrap());
    });
}

criterion_group!(benches, document_benches, record_benches);
criterion_main!(benches);
