use codspeed_criterion_compat::{criterion_group, criterion_main, Criterion};
use serde_json::json;

fn bench_validate(c: &mut Criterion) {
    let schema = json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "age": { "type": "integer", "minimum": 0 },
            "tags": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["name"]
    });
    let instance = json!({
        "name": "Alice",
        "age": 30,
        "tags": ["a", "b", "c"]
    });
    let mut context = conforma::Context::new();
    let schema = context.parse(&schema).expect("Invalid schema");

    c.bench_function("validate/object", |b| {
        b.iter(|| schema.validate(&instance).valid())
    });
    c.bench_function("is_valid/object", |b| b.iter(|| schema.is_valid(&instance)));
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
