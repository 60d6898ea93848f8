use lazyrt::builder::{int, prim};
use lazyrt::engine::{
    max_stack_depth, set_depth_limit_override, set_step_limit_override, total_reductions, Machine, Operator,
    ReduceConfig,
};
use lazyrt::graph::Value;

// One test: the overrides are process-wide.
#[test]
fn test_limit_overrides() {
    set_depth_limit_override(Some(7));
    set_step_limit_override(Some(9));
    let config = ReduceConfig::from_env();
    assert_eq!(config.depth_limit, 7);
    assert_eq!(config.step_limit, Some(9));

    // zero turns the step limit off
    set_step_limit_override(Some(0));
    assert_eq!(ReduceConfig::from_env().step_limit, None);

    set_depth_limit_override(Some(64));
    set_step_limit_override(Some(500));
    let mut m = Machine::new(vec![]);
    assert_eq!(m.config().depth_limit, 64);
    assert_eq!(m.config().step_limit, Some(500));

    let before = total_reductions();
    let res = m.eval(&prim(Operator::IntAdd, vec![int(1), int(2)])).unwrap();
    assert_eq!(res, Value::int(3));
    assert!(total_reductions() >= before + 2);
    assert!(max_stack_depth() >= 2);

    set_depth_limit_override(None);
    set_step_limit_override(None);
}

#[test]
fn test_default_config() {
    let config = ReduceConfig::default();
    assert_eq!(config.depth_limit, 1000);
    assert_eq!(config.step_limit, None);
}
