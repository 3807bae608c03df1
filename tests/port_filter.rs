use rowfilter::expr::{parse_filter, FilterSyntax, IntersectionList, UnionList};
use rowfilter::processing::{evaluate_aggregate, evaluate_filter, ReduceOp};
use rowfilter::row::{RowModel, StaticRow};
use rowfilter::types::Value;
use rowfilter::{filterable_row, row_model, EvalError};

#[derive(Debug, Clone, PartialEq)]
struct PortEntry {
    id: i32,
    name: String,
    link_state: String,
    admin_state: String,
    tcvr_present: String,
    speed_gbps: f64,
    errors: Option<i64>,
}

filterable_row!(PortEntry {
    "id" => Integer, |p| p.id,
    "name" => String, |p| &p.name,
    "linkState" => Symbolic["Up", "Down"], |p| &p.link_state,
    "adminState" => Symbolic["Enabled", "Disabled"], |p| &p.admin_state,
    "tcvrPresent" => Symbolic["Present", "Absent"], |p| &p.tcvr_present,
    "speed" => Real, |p| p.speed_gbps,
    "errors" => Integer, |p| p.errors,
});

#[derive(Debug, Clone, PartialEq)]
struct ShowPortModel {
    host: String,
    port_entries: Vec<PortEntry>,
}

row_model!(ShowPortModel => port_entries: PortEntry);

fn port(id: i32, link: &str, admin: &str) -> PortEntry {
    PortEntry {
        id,
        name: format!("eth1/{id}/1"),
        link_state: link.to_string(),
        admin_state: admin.to_string(),
        tcvr_present: "Present".to_string(),
        speed_gbps: 100.0 * f64::from(id),
        errors: if id == 2 { None } else { Some(i64::from(id) * 10) },
    }
}

fn model() -> ShowPortModel {
    ShowPortModel {
        host: "rsw1a.p001".to_string(),
        port_entries: vec![
            port(1, "Down", "Enabled"),
            port(2, "Down", "Disabled"),
            port(3, "Up", "Enabled"),
        ],
    }
}

fn filter_ids(filter: &str) -> Vec<i32> {
    let union = parse_filter(filter, &FilterSyntax::default()).unwrap();
    let out = evaluate_filter(model(), &union, &PortEntry::registry().comparators).unwrap();
    assert_eq!(out.host, "rsw1a.p001");
    out.port_entries.iter().map(|p| p.id).collect()
}

fn aggregate(model: &ShowPortModel, column: &str, op: ReduceOp) -> Result<Value, EvalError> {
    evaluate_aggregate(model, column, op, &PortEntry::registry().reducers)
}

#[test]
fn link_state_up() {
    assert_eq!(filter_ids("linkState==Up"), vec![3]);
}

#[test]
fn down_and_disabled() {
    assert_eq!(filter_ids("linkState==Down && adminState==Disabled"), vec![2]);
}

#[test]
fn id_above_two_or_disabled() {
    assert_eq!(filter_ids("id>2 || adminState==Disabled"), vec![2, 3]);
}

#[test]
fn no_rows_match() {
    assert_eq!(filter_ids("id<=0"), Vec::<i32>::new());
}

#[test]
fn both_link_states() {
    assert_eq!(filter_ids("linkState==Down || linkState==Up"), vec![1, 2, 3]);
}

#[test]
fn mixed_kinds_in_one_group() {
    assert_eq!(filter_ids("speed>=200 && name!=eth1/3/1"), vec![2]);
    assert_eq!(filter_ids("tcvrPresent==Present && id<3"), vec![1, 2]);
}

#[test]
fn null_field_never_matches() {
    // port 2 has no error counter
    assert_eq!(filter_ids("errors>=0"), vec![1, 3]);
    assert_eq!(filter_ids("errors!=10"), vec![3]);
}

#[test]
fn survivors_keep_relative_order_and_refiltering_is_stable() {
    let union = parse_filter("id!=2", &FilterSyntax::default()).unwrap();
    let comparators = &PortEntry::registry().comparators;
    let once = evaluate_filter(model(), &union, comparators).unwrap();
    let ids: Vec<i32> = once.rows().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 3]);
    let twice = evaluate_filter(once.clone(), &union, comparators).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn empty_union_passes_everything_through() {
    let comparators = &PortEntry::registry().comparators;
    let out = evaluate_filter(model(), &UnionList::default(), comparators).unwrap();
    assert_eq!(out, model());
    let one_empty_group = UnionList::new(vec![IntersectionList::default()]);
    let out = evaluate_filter(model(), &one_empty_group, comparators).unwrap();
    assert_eq!(out, model());
}

#[test]
fn dnf_survivor_iff_some_group_fully_matches() {
    let filter = "linkState==Down && id>=2 || adminState==Enabled && speed>250";
    let kept = filter_ids(filter);
    for p in model().port_entries {
        let g1 = p.link_state == "Down" && p.id >= 2;
        let g2 = p.admin_state == "Enabled" && p.speed_gbps > 250.0;
        assert_eq!(kept.contains(&p.id), g1 || g2, "port {}", p.id);
    }
}

#[test]
fn evaluation_errors_carry_column_and_literal() {
    let comparators = &PortEntry::registry().comparators;
    let run = |filter: &str| {
        let union = parse_filter(filter, &FilterSyntax::default()).unwrap();
        evaluate_filter(model(), &union, comparators).unwrap_err().to_string()
    };

    let msg = run("portName==eth1/1/1");
    assert!(msg.contains("unknown filter column 'portName'"), "{msg}");
    assert!(msg.contains("linkState"), "{msg}");

    let msg = run("id==abc");
    assert!(msg.contains("'abc'") && msg.contains("'id'"), "{msg}");

    let msg = run("linkState==Flapping");
    assert!(msg.contains("accepted: Up, Down"), "{msg}");

    let msg = run("name>eth1");
    assert_eq!(msg, "operator '>' is not supported on string column 'name'");
}

#[test]
fn aggregates_over_ids() {
    let m = model();
    assert_eq!(aggregate(&m, "id", ReduceOp::Sum), Ok(Value::Int64(6)));
    assert_eq!(aggregate(&m, "id", ReduceOp::Avg), Ok(Value::Float64(2.0)));
    assert_eq!(aggregate(&m, "id", ReduceOp::Count), Ok(Value::Int64(3)));
    assert_eq!(aggregate(&m, "id", ReduceOp::Max), Ok(Value::Int64(3)));
}

#[test]
fn aggregates_respect_nulls_and_kinds() {
    let m = model();
    assert_eq!(aggregate(&m, "errors", ReduceOp::Sum), Ok(Value::Int64(40)));
    assert_eq!(aggregate(&m, "errors", ReduceOp::Avg), Ok(Value::Float64(20.0)));
    assert_eq!(aggregate(&m, "errors", ReduceOp::Count), Ok(Value::Int64(3)));
    assert_eq!(aggregate(&m, "speed", ReduceOp::Min), Ok(Value::Float64(100.0)));
    assert!(matches!(
        aggregate(&m, "linkState", ReduceOp::Max),
        Err(EvalError::UnsupportedAggregate { .. })
    ));
}

#[test]
fn aggregate_after_filter() {
    let union = parse_filter("linkState==Down", &FilterSyntax::default()).unwrap();
    let down = evaluate_filter(model(), &union, &PortEntry::registry().comparators).unwrap();
    assert_eq!(aggregate(&down, "speed", ReduceOp::Sum), Ok(Value::Float64(300.0)));
    assert_eq!(aggregate(&down, "id", ReduceOp::Count), Ok(Value::Int64(2)));
}
