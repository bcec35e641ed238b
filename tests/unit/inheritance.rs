//! Base classes, casts, attributes and class-level functions.

use scriptbind::{ClassBuilder, ConfigurationError, Context, Obj, ScriptError, Value};

use super::common::{Entity, Player, Vec3, entity_class, game_context, vec3_class};

fn player(name: &str, score: i64) -> Obj<Player> {
    Obj::new(Player {
        entity: Entity {
            name: name.into(),
            position: Vec3::new(1.0, 2.0, 3.0),
        },
        score,
    })
}

// =============================================================================
// Visibility
// =============================================================================

#[test]
fn base_methods_are_visible_on_derived_handles() {
    let mut ctx = game_context();
    let handle = ctx.push_owned(player("ada", 7)).unwrap();
    let text: String = ctx.call_method(&handle, "describe", ()).unwrap();
    assert_eq!(text, "entity ada");
}

#[test]
fn derived_members_hide_base_members() {
    let mut ctx = game_context();
    let p = ctx.push_owned(player("ada", 7)).unwrap();
    let e = ctx.push_owned(Obj::new(Entity::default())).unwrap();
    let pk: String = ctx.call_method(&p, "kind", ()).unwrap();
    let ek: String = ctx.call_method(&e, "kind", ()).unwrap();
    assert_eq!(pk, "player");
    assert_eq!(ek, "entity");
}

#[test]
fn base_attributes_are_visible_on_derived_handles() {
    let mut ctx = game_context();
    let handle = ctx.push_owned(player("grace", 3)).unwrap();
    let vm = ctx.vm_mut();
    assert_eq!(vm.get_field(&handle, "name").unwrap(), Value::string("grace"));
    assert_eq!(vm.get_field(&handle, "score").unwrap(), Value::Integer(3));
}

#[test]
fn derived_objects_pass_as_base_parameters() {
    let mut ctx = game_context();
    ctx.register_function("name_of", |e: Entity| e.name).unwrap();
    let handle = ctx.push_owned(player("linus", 1)).unwrap();
    let name: String = ctx.call("name_of", handle).unwrap();
    assert_eq!(name, "linus");
}

#[test]
fn base_parameter_rejects_unrelated_objects() {
    let mut ctx = game_context();
    ctx.register_function("name_of", |e: Entity| e.name).unwrap();
    let v = ctx.push_owned(Obj::new(Vec3::default())).unwrap();
    let err = ctx.call::<String>("name_of", v).unwrap_err();
    assert!(err.is_no_overload_match());
    assert!(err.to_string().contains("name_of(Vec3)"), "{err}");
}

#[test]
fn closer_types_win_over_bases() {
    let mut ctx = game_context();
    ctx.install(
        scriptbind::Module::root()
            .function("greet", |_: Obj<Entity>| "entity")
            .function("greet", |_: Obj<Player>| "player"),
    )
    .unwrap();
    let p = ctx.push_owned(player("ada", 1)).unwrap();
    let e = ctx.push_owned(Obj::new(Entity::default())).unwrap();
    let a: String = ctx.call("greet", p).unwrap();
    let b: String = ctx.call("greet", e).unwrap();
    assert_eq!(a, "player");
    assert_eq!(b, "entity");
}

// =============================================================================
// Registration errors
// =============================================================================

#[test]
fn derived_before_base_is_rejected() {
    let mut ctx = Context::new();
    let err = ctx
        .register_class(ClassBuilder::<Player>::new().base::<Entity>(|p| &p.entity, |p| &mut p.entity))
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("'Player' extends 'Entity'"), "{err}");
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut ctx = Context::new();
    ctx.register_class(vec3_class()).unwrap();
    let err = ctx.register_class(vec3_class()).unwrap_err();
    assert_eq!(
        err,
        ScriptError::Configuration(ConfigurationError::DuplicateType {
            name: "Vec3".into()
        })
    );
}

#[test]
fn reserved_member_names_are_rejected() {
    let mut ctx = Context::new();
    let err = ctx
        .register_class(ClassBuilder::<Vec3>::new().method("__index", |_: &Vec3| 0))
        .unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Configuration(ConfigurationError::ReservedName { .. })
    ));
}

#[test]
fn pushing_an_unregistered_class_fails() {
    let ctx = Context::new();
    let err = ctx.push_owned(Obj::new(Vec3::default())).unwrap_err();
    assert_eq!(
        err,
        ScriptError::Configuration(ConfigurationError::UnregisteredType {
            type_name: "Vec3".into()
        })
    );
}

// =============================================================================
// Attributes
// =============================================================================

#[test]
fn readonly_attribute_rejects_writes() {
    let mut ctx = game_context();
    let handle = ctx.push_owned(Obj::new(Entity::default())).unwrap();
    let err = ctx
        .vm_mut()
        .set_field(&handle, "name", Value::string("x"))
        .unwrap_err();
    assert!(err.to_string().contains("attribute 'name' of 'Entity' is read-only"), "{err}");
}

#[test]
fn attribute_writes_convert_their_value() {
    let mut ctx = game_context();
    let v = Obj::new(Vec3::default());
    let handle = ctx.push_owned(v.clone()).unwrap();
    ctx.vm_mut().set_field(&handle, "x", Value::Integer(4)).unwrap();
    assert_eq!(v.borrow().unwrap().x, 4.0);

    let err = ctx
        .vm_mut()
        .set_field(&handle, "x", Value::Boolean(true))
        .unwrap_err();
    assert!(err.is_no_overload_match());
}

#[test]
fn object_attributes_alias_the_parent_field() {
    let mut ctx = game_context();
    let p = player("ada", 1);
    let handle = ctx.push_owned(p.clone()).unwrap();
    let vm = ctx.vm_mut();
    let position = vm.get_field(&handle, "position").unwrap();
    vm.set_field(&position, "y", Value::Number(9.5)).unwrap();
    assert_eq!(p.borrow().unwrap().entity.position.y, 9.5);
}

#[test]
fn object_attribute_accepts_a_replacement() {
    let mut ctx = game_context();
    let e = Obj::new(Entity::default());
    let handle = ctx.push_owned(e.clone()).unwrap();
    let v = ctx.push_owned(Obj::new(Vec3::new(7.0, 8.0, 9.0))).unwrap();
    ctx.vm_mut().set_field(&handle, "position", v).unwrap();
    assert_eq!(e.borrow().unwrap().position, Vec3::new(7.0, 8.0, 9.0));
}

// =============================================================================
// Statics, named constructors and casts
// =============================================================================

#[test]
fn statics_and_named_constructors_live_in_the_class_table() {
    let mut ctx = Context::new();
    ctx.register_class(
        vec3_class()
            .named_constructor("splat", |s: f64| Vec3::new(s, s, s))
            .static_fn("dimensions", || 3),
    )
    .unwrap();
    let v: Vec3 = ctx.call("Vec3.splat", 2.0).unwrap();
    let d: i64 = ctx.call("Vec3.dimensions", ()).unwrap();
    assert_eq!(v, Vec3::new(2.0, 2.0, 2.0));
    assert_eq!(d, 3);
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Transform {
    translation: Vec3,
}

impl scriptbind::NativeClass for Transform {
    const NAME: &'static str = "Transform";
}

#[test]
fn custom_casts_convert_arguments() {
    let mut ctx = Context::new();
    ctx.register_class(vec3_class()).unwrap();
    ctx.register_class(
        ClassBuilder::<Transform>::new().cast::<Vec3>(|t| &t.translation, |t| &mut t.translation),
    )
    .unwrap();
    ctx.register_function("len", |v: Vec3| v.length()).unwrap();

    let t = Obj::new(Transform {
        translation: Vec3::new(3.0, 4.0, 0.0),
    });
    let handle = ctx.push_owned(t).unwrap();
    let len: f64 = ctx.call("len", handle.clone()).unwrap();
    assert_eq!(len, 5.0);

    // A cast is a conversion, not a base: members are not inherited.
    let missing = ctx.vm_mut().get_field(&handle, "length").unwrap();
    assert!(missing.is_nil());
}

#[test]
fn entity_class_standalone() {
    let mut ctx = Context::new();
    ctx.register_class(vec3_class()).unwrap();
    ctx.register_class(entity_class()).unwrap();
    let e: Entity = ctx.call("Entity", "solo").unwrap();
    assert_eq!(e.name, "solo");
}
