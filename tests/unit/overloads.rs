//! Overload resolution through global functions, methods and constructors.

use scriptbind::{CallError, ClassBuilder, Context, Module, Obj, ScriptError, Value};

use super::common::{Vec3, game_context};

fn mixed_context() -> Context {
    let mut ctx = Context::new();
    ctx.install(
        Module::root()
            .function("f", |a: i32, b: u32| format!("int {} {}", a, b))
            .function("f", |a: f32, b: f32| format!("float {} {}", a, b)),
    )
    .unwrap();
    ctx
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn integers_pick_the_integer_overload() {
    let mut ctx = mixed_context();
    let s: String = ctx.call("f", (1, 2)).unwrap();
    assert_eq!(s, "int 1 2");
}

#[test]
fn numbers_pick_the_float_overload() {
    let mut ctx = mixed_context();
    let s: String = ctx.call("f", (1.5, 2.5)).unwrap();
    assert_eq!(s, "float 1.5 2.5");
}

#[test]
fn integral_numbers_still_prefer_floats() {
    let mut ctx = mixed_context();
    let s: String = ctx.call("f", (1.0, 2.0)).unwrap();
    assert_eq!(s, "float 1 2");
}

#[test]
fn out_of_range_rules_out_the_integer_overload() {
    let mut ctx = mixed_context();
    let s: String = ctx.call("f", (1, -2)).unwrap();
    assert_eq!(s, "float 1 -2");
}

#[test]
fn resolution_is_stable_across_calls() {
    let mut ctx = mixed_context();
    for _ in 0..10 {
        let s: String = ctx.call("f", (3, 4)).unwrap();
        assert_eq!(s, "int 3 4");
    }
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn no_match_lists_all_candidates() {
    let mut ctx = mixed_context();
    let err = ctx.call::<String>("f", (true, "x")).unwrap_err();
    assert!(err.is_no_overload_match());
    let ScriptError::Call(CallError::NoOverloadMatch { args, candidates, .. }) = err.root() else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(args, "boolean, string");
    assert_eq!(
        candidates,
        &vec!["f(int, uint)".to_string(), "f(float, float)".to_string()]
    );
}

#[test]
fn equal_costs_are_ambiguous() {
    let mut ctx = Context::new();
    ctx.install(
        Module::root()
            .function("g", |_: i64, _: f64| 1)
            .function("g", |_: f64, _: i64| 2),
    )
    .unwrap();
    let err = ctx.call::<i64>("g", (1, 1)).unwrap_err();
    assert!(err.is_ambiguous_overload());
    let msg = err.to_string();
    assert!(msg.contains("g(int64, double)"), "{msg}");
    assert!(msg.contains("g(double, int64)"), "{msg}");

    // A cheaper candidate breaks the tie.
    let one: i64 = ctx.call("g", (1, 1.5)).unwrap();
    assert_eq!(one, 1);
}

#[test]
fn wrong_argument_count() {
    let mut ctx = mixed_context();
    let err = ctx.call::<String>("f", (1, 2, 3)).unwrap_err();
    assert!(err.is_argument_count_mismatch());
    assert!(err.to_string().contains("expected 2, got 3"), "{err}");
}

#[test]
fn errors_carry_a_traceback() {
    let mut ctx = mixed_context();
    let err = ctx.call::<String>("f", ()).unwrap_err();
    assert!(err.traceback().is_some_and(|t| t.contains("in function 'f'")));
}

// =============================================================================
// Default arguments
// =============================================================================

#[test]
fn two_required_and_one_default() {
    let mut ctx = Context::new();
    ctx.register_function_with_defaults(
        "volume",
        |w: i64, h: i64, d: i64| w * h * d,
        vec![Value::Integer(10)],
    )
    .unwrap();

    let full: i64 = ctx.call("volume", (2, 3, 4)).unwrap();
    let defaulted: i64 = ctx.call("volume", (2, 3)).unwrap();
    assert_eq!(full, 24);
    assert_eq!(defaulted, 60);

    let err = ctx.call::<i64>("volume", 2).unwrap_err();
    assert!(err.is_argument_count_mismatch());
    assert!(err.to_string().contains("expected 2 to 3"), "{err}");
}

#[test]
fn default_on_a_method() {
    let mut ctx = Context::new();
    ctx.register_class(
        ClassBuilder::<Vec3>::new()
            .method_with_defaults(
                "scaled",
                |v: &Vec3, s: f64, offset: f64| Vec3::new(v.x * s + offset, v.y * s, v.z * s),
                vec![Value::Number(0.0)],
            )
            .unwrap(),
    )
    .unwrap();
    let handle = ctx.push_owned(Obj::new(Vec3::new(1.0, 1.0, 1.0))).unwrap();
    let v: Vec3 = ctx.call_method(&handle, "scaled", 2.0).unwrap();
    assert_eq!(v, Vec3::new(2.0, 2.0, 2.0));
    let v: Vec3 = ctx.call_method(&handle, "scaled", (2.0, 1.0)).unwrap();
    assert_eq!(v, Vec3::new(3.0, 2.0, 2.0));
}

// =============================================================================
// Constructors
// =============================================================================

#[test]
fn constructors_resolve_like_functions() {
    let mut ctx = game_context();
    let origin: Vec3 = ctx.call("Vec3.new", ()).unwrap();
    let point: Vec3 = ctx.call("Vec3.new", (1, 2, 3)).unwrap();
    let called: Vec3 = ctx.call("Vec3", (4.0, 5.0, 6.0)).unwrap();
    assert_eq!(origin, Vec3::default());
    assert_eq!(point, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(called, Vec3::new(4.0, 5.0, 6.0));

    let err = ctx.call::<Vec3>("Vec3.new", (1, 2)).unwrap_err();
    assert!(err.is_argument_count_mismatch());
}

#[test]
fn class_without_constructor_refuses_construction() {
    let mut ctx = Context::new();
    ctx.register_class(ClassBuilder::<Vec3>::new()).unwrap();
    let err = ctx.call::<Vec3>("Vec3.new", ()).unwrap_err();
    assert!(err.to_string().contains("no registered constructor"), "{err}");
}

#[test]
fn raw_methods_accept_any_arguments() {
    let mut ctx = Context::new();
    ctx.register_class(ClassBuilder::<Vec3>::new().raw_method("count", |_, args| {
        Ok(vec![Value::Integer(args.len() as i64 - 1)])
    }))
    .unwrap();
    let handle = ctx.push_owned(Obj::new(Vec3::default())).unwrap();
    let n: i64 = ctx.call_method(&handle, "count", (1, 2, 3)).unwrap();
    assert_eq!(n, 3);
}
