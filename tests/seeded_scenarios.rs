use job_filter_engine::{compile, eval_expr, eval_match, Config, Value};
use serde_json::json;

fn doc(v: serde_json::Value) -> Value {
    Value::from(v)
}

#[test]
fn scenario_1_flat_field_conjunction() {
    let cfg = Config::default();
    let node = compile(&json!({"data.firstName": "Francis", "data.isActive": true}), &cfg).unwrap();
    let d = doc(json!({"data": {"firstName": "Francis", "isActive": true}}));
    assert!(eval_match(&d, &node, &Default::default()));

    let other = doc(json!({"data": {"firstName": "Ada", "isActive": true}}));
    assert!(!eval_match(&other, &node, &Default::default()));
}

#[test]
fn scenario_2_array_fan_out_aggregate_compare() {
    let cfg = Config::default();
    let node = compile(&json!({"data.grades.mean": {"$gt": 70}}), &cfg).unwrap();
    let d = doc(json!({"data": {"grades": [{"mean": 88}, {"mean": 90}, {"mean": 65}]}}));
    assert!(eval_match(&d, &node, &Default::default()));

    let all_low = doc(json!({"data": {"grades": [{"mean": 50}, {"mean": 60}]}}));
    assert!(!eval_match(&all_low, &node, &Default::default()));
}

#[test]
fn scenario_3_nested_array_fan_out_requires_explicit_indices() {
    let cfg = Config::default();
    let d = doc(json!({
        "data": {
            "key0": [{
                "key1": [
                    [{"key2": {"a": "value2"}}],
                    [{"key2": {"a": "value1"}}]
                ]
            }]
        }
    }));

    let indexed = compile(&json!({"data.key0.key1.0.0.key2.a": "value2"}), &cfg).unwrap();
    assert!(eval_match(&d, &indexed, &Default::default()));

    let unindexed = compile(&json!({"data.key0.key1.key2.a": "value2"}), &cfg).unwrap();
    assert!(!eval_match(&d, &unindexed, &Default::default()));
}

#[test]
fn scenario_4_expr_cond_divide_over_inventory() {
    let cfg = Config::default();
    let node = compile(
        &json!({
            "$expr": {
                "$lt": [
                    {"$cond": {
                        "if": {"$gte": ["$data.qty", 100]},
                        "then": {"$divide": ["$data.price", 2]},
                        "else": {"$divide": ["$data.price", 4]}
                    }},
                    5
                ]
            }
        }),
        &cfg,
    )
    .unwrap();

    let inventory = vec![
        doc(json!({"data": {"item": "almonds", "qty": 50, "price": 24}})),
        doc(json!({"data": {"item": "pecans", "qty": 80, "price": 32}})),
        doc(json!({"data": {"item": "cashews", "qty": 120, "price": 8}})),
        doc(json!({"data": {"item": "walnuts", "qty": 150, "price": 6}})),
    ];

    let matched: Vec<bool> = inventory
        .iter()
        .map(|d| eval_match(d, &node, &Default::default()))
        .collect();
    assert_eq!(matched, vec![false, false, true, true]);
}

#[test]
fn scenario_5_null_matches_present_and_absent() {
    let cfg = Config::default();
    let node = compile(&json!({"data.item": null}), &cfg).unwrap();

    let present_null = doc(json!({"_id": 1, "data": {"item": null}}));
    let absent = doc(json!({"_id": 2, "data": {}}));
    assert!(eval_match(&present_null, &node, &Default::default()));
    assert!(eval_match(&absent, &node, &Default::default()));
}

#[test]
fn scenario_5b_type_and_exists_distinguish_null_from_missing() {
    let cfg = Config::default();
    let present_null = doc(json!({"data": {"item": null}}));
    let absent = doc(json!({"data": {}}));

    let type_null = compile(&json!({"data.item": {"$type": "null"}}), &cfg).unwrap();
    assert!(eval_match(&present_null, &type_null, &Default::default()));
    assert!(!eval_match(&absent, &type_null, &Default::default()));

    let not_exists = compile(&json!({"data.item": {"$exists": false}}), &cfg).unwrap();
    assert!(!eval_match(&present_null, &not_exists, &Default::default()));
    assert!(eval_match(&absent, &not_exists, &Default::default()));
}

#[test]
fn scenario_6_round_and_trunc_at_decimal_place() {
    let cfg = Config::default();
    let round_node = compile_expr_only(&json!({"$round": [-45.39, 1]}), &cfg);
    let trunc_node = compile_expr_only(&json!({"$trunc": [-45.39, 1]}), &cfg);
    let empty = doc(json!({}));

    assert_eq!(eval_expr(&empty, &round_node, &Default::default()).unwrap(), Value::Float(-45.4));
    assert_eq!(eval_expr(&empty, &trunc_node, &Default::default()).unwrap(), Value::Float(-45.3));
}

fn compile_expr_only(v: &serde_json::Value, cfg: &Config) -> job_filter_engine::Node {
    let wrapped = compile(&json!({"$expr": v}), cfg).unwrap();
    match wrapped {
        job_filter_engine::Node::Operator(_, top) => match &top[0] {
            job_filter_engine::Node::Operator(_, inner) => inner[0].clone(),
            other => other.clone(),
        },
        other => other,
    }
}
