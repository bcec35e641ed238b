//! Host-side utilities: namespaces, globals, configuration.

use scriptbind::{
    CallArgs, ContextProperty, Context, Module, ScriptResult, Table, Value, Vm,
};

use super::common::{Vec3, vec3_class};

// =============================================================================
// Modules and namespaces
// =============================================================================

#[test]
fn modules_install_under_nested_namespaces() {
    let mut ctx = Context::new();
    let table = ctx
        .install(
            Module::new(&["game", "ui"])
                .function("scale", |x: f64| x * 2.0)
                .value("TITLE", "Untitled")
                .enumeration("Anchor", &[("Left", 0), ("Center", 1), ("Right", 2)]),
        )
        .unwrap();

    let ui: Table = ctx.get_global("game.ui").unwrap();
    assert!(ui.ptr_eq(&table));

    let scaled: f64 = ctx.call("game.ui.scale", 1.5).unwrap();
    let title: String = ctx.get_global("game.ui.TITLE").unwrap();
    let right: i64 = ctx.get_global("game.ui.Anchor.Right").unwrap();
    assert_eq!(scaled, 3.0);
    assert_eq!(title, "Untitled");
    assert_eq!(right, 2);
}

#[test]
fn namespaces_are_shared_between_modules() {
    let mut ctx = Context::new();
    ctx.install(Module::new(&["game"]).value("A", 1)).unwrap();
    ctx.install(Module::new(&["game", "ui"]).value("B", 2)).unwrap();
    ctx.install(Module::new(&["game"]).value("C", 3)).unwrap();

    let a: i64 = ctx.get_global("game.A").unwrap();
    let b: i64 = ctx.get_global("game.ui.B").unwrap();
    let c: i64 = ctx.get_global("game.C").unwrap();
    assert_eq!((a, b, c), (1, 2, 3));
}

#[test]
fn namespace_over_a_non_table_is_rejected() {
    let mut ctx = Context::new();
    ctx.set_global("game", 5).unwrap();
    let err = ctx.install(Module::new(&["game", "ui"])).unwrap_err();
    assert!(err.to_string().contains("cannot create namespace 'game'"), "{err}");
}

#[test]
fn classes_install_into_their_namespace() {
    let mut ctx = Context::new();
    ctx.install(Module::new(&["math"]).class(vec3_class())).unwrap();
    let v: Vec3 = ctx.call("math.Vec3", (1, 2, 3)).unwrap();
    assert_eq!(v, Vec3::new(1.0, 2.0, 3.0));
    assert!(ctx.globals().get("Vec3").is_nil());
}

#[test]
fn overloads_added_later_reach_existing_references() {
    let mut ctx = Context::new();
    ctx.register_function("describe", |n: i64| format!("int {}", n))
        .unwrap();
    let early: Value = ctx.get_global("describe").unwrap();

    ctx.register_function("describe", |s: String| format!("string {}", s))
        .unwrap();
    let out = ctx
        .vm_mut()
        .call(&early, vec![Value::string("x")])
        .unwrap();
    assert_eq!(out, vec![Value::string("string x")]);
    assert_eq!(ctx.state().function("describe").unwrap().len(), 2);
}

#[test]
fn raw_functions_read_their_own_arguments() {
    fn count_strings(_: &mut Vm, args: CallArgs) -> ScriptResult<i64> {
        Ok(args.values().iter().filter(|v| v.as_str().is_some()).count() as i64)
    }

    let mut ctx = Context::new();
    ctx.install(Module::root().raw_function("count_strings", count_strings))
        .unwrap();
    let n: i64 = ctx
        .call("count_strings", ("a", 1, "b", true))
        .unwrap();
    assert_eq!(n, 2);
}

// =============================================================================
// Globals and registry
// =============================================================================

#[test]
fn globals_round_trip() {
    let mut ctx = Context::new();
    ctx.set_global("answer", 42).unwrap();
    ctx.set_global("name", "scriptbind").unwrap();
    let answer: i64 = ctx.get_global("answer").unwrap();
    let name: String = ctx.get_global("name").unwrap();
    assert_eq!(answer, 42);
    assert_eq!(name, "scriptbind");
    assert_eq!(ctx.globals().get("answer"), Value::Integer(42));
}

#[test]
fn missing_globals_read_as_nil() {
    let mut ctx = Context::new();
    let missing: Option<i64> = ctx.get_global("nothing").unwrap();
    assert_eq!(missing, None);
    let err = ctx.get_global::<Option<i64>>("nothing.here").unwrap_err();
    assert!(err.to_string().contains("attempt to index a nil value"), "{err}");
    let err = ctx.call::<()>("nothing", ()).unwrap_err();
    assert!(err.to_string().contains("attempt to call a nil value"), "{err}");
}

#[test]
fn registry_is_separate_from_globals() {
    let ctx = Context::new();
    ctx.registry().set("private", 1);
    assert!(ctx.globals().get("private").is_nil());
    assert_eq!(ctx.registry().get("private"), Value::Integer(1));
}

#[test]
fn package_path_is_created_on_demand() {
    let mut ctx = Context::new();
    ctx.add_package_path("lib/?.lua").unwrap();
    let path: String = ctx.get_global("package.path").unwrap();
    assert_eq!(path, ";lib/?.lua");
}

#[test]
fn package_path_requires_a_table() {
    let mut ctx = Context::new();
    ctx.set_global("package", true).unwrap();
    let err = ctx.add_package_path("lib/?.lua").unwrap_err();
    assert!(err.is_runtime());
}

// =============================================================================
// Unregistered values
// =============================================================================

struct Opaque(u32);

#[test]
fn unregistered_values_are_opaque_userdata() {
    let mut ctx = Context::new();
    ctx.register_class(vec3_class()).unwrap();
    let value = ctx.push_unregistered(Opaque(9));
    assert_eq!(value.type_name(), "userdata");
    assert!(!ctx.is_of_type::<Vec3>(&value, false));
    assert_eq!(value.as_userdata().unwrap().borrow::<Opaque>().unwrap().0, 9);

    let err = ctx.vm_mut().get_field(&value, "x").unwrap_err();
    assert!(err.is_runtime());
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn properties_can_be_changed() {
    let mut ctx = Context::new();
    for property in ContextProperty::ALL {
        assert_eq!(ctx.property(property), property.default_value());
    }
    ctx.set_property(ContextProperty::MaxCallDepth, 8);
    assert_eq!(ctx.property(ContextProperty::MaxCallDepth), 8);
}

#[test]
fn cast_depth_limits_base_conversions() {
    use super::common::{Entity, Player, entity_class, player_class};
    use scriptbind::Obj;

    let mut ctx = Context::new();
    ctx.register_class(vec3_class()).unwrap();
    ctx.register_class(entity_class()).unwrap();
    ctx.register_class(player_class()).unwrap();
    let handle = ctx
        .push_owned(Obj::new(Player {
            entity: Entity::default(),
            score: 1,
        }))
        .unwrap();
    assert!(ctx.state().convert::<Entity>(&handle).is_some());

    ctx.set_property(ContextProperty::MaxCastDepth, 0);
    assert!(ctx.state().convert::<Entity>(&handle).is_none());
    assert!(ctx.state().convert::<Player>(&handle).is_some());
}
