//! Handle identity, ownership and finalization.

use std::cell::RefCell;
use std::rc::Rc;

use scriptbind::{
    ClassBuilder, ConversionError, Context, Cost, Module, Obj, ObjectWrapper, ScriptError, Value,
    Wrapped,
};

use super::common::{Entity, Player, Tracked, Vec3, dropped, game_context};

fn tracked_context() -> Context {
    let mut ctx = Context::new();
    ctx.register_class(
        ClassBuilder::<Tracked>::new().method("id", |t: &Tracked| t.id),
    )
    .unwrap();
    ctx
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn pushing_twice_yields_the_same_handle() {
    let ctx = game_context();
    let v = Obj::new(Vec3::new(1.0, 2.0, 3.0));
    let a = ctx.push_owned(v.clone()).unwrap();
    let b = ctx.push_owned(v.clone()).unwrap();
    let (Value::UserData(a), Value::UserData(b)) = (a, b) else {
        panic!("expected userdata handles");
    };
    assert!(a.ptr_eq(&b));
    assert_eq!(ctx.state().identity().len(), 1);
}

#[test]
fn distinct_objects_get_distinct_handles() {
    let ctx = game_context();
    let a = ctx.push_owned(Obj::new(Vec3::default())).unwrap();
    let b = ctx.push_owned(Obj::new(Vec3::default())).unwrap();
    assert!(!a.raw_equal(&b));
}

#[test]
fn unowned_pushes_are_never_deduplicated() {
    let ctx = game_context();
    let v = Obj::new(Vec3::default());
    let a = ctx.push_unowned(&v).unwrap();
    let b = ctx.push_unowned(&v).unwrap();
    assert!(!a.raw_equal(&b));
    assert!(ctx.state().identity().is_empty());
}

#[test]
fn identity_survives_a_round_trip_through_a_function() {
    let mut ctx = game_context();
    ctx.register_function("same", |e: Obj<Entity>| e).unwrap();
    let e = Obj::new(Entity::default());
    let handle = ctx.push_owned(e.clone()).unwrap();
    let back: Value = ctx.call("same", handle.clone()).unwrap();
    assert!(back.raw_equal(&handle));
}

// =============================================================================
// Ownership
// =============================================================================

#[test]
fn owned_object_is_destroyed_exactly_once() {
    let ctx = tracked_context();
    let before = dropped();
    let handle = ctx.push_owned(Obj::new(Tracked { id: 1 })).unwrap();
    let alias = handle.clone();
    drop(handle);
    assert_eq!(dropped(), before);
    drop(alias);
    assert_eq!(dropped(), before + 1);
}

#[test]
fn host_owned_object_is_not_destroyed_by_the_runtime() {
    let ctx = tracked_context();
    let before = dropped();
    let host = Obj::new(Tracked { id: 2 });
    let handle = ctx.push_unowned(&host).unwrap();
    drop(handle);
    assert_eq!(dropped(), before);
    drop(host);
    assert_eq!(dropped(), before + 1);
}

#[test]
fn shared_object_outlives_the_handle() {
    let ctx = tracked_context();
    let before = dropped();
    let obj = Obj::new(Tracked { id: 3 });
    let handle = ctx.push_owned(obj.clone()).unwrap();
    drop(handle);
    assert_eq!(dropped(), before);
    assert_eq!(obj.borrow().unwrap().id, 3);
    drop(obj);
    assert_eq!(dropped(), before + 1);
}

#[test]
fn dropping_the_context_releases_globals() {
    let before = dropped();
    {
        let mut ctx = tracked_context();
        ctx.set_global("keep", Obj::new(Tracked { id: 4 })).unwrap();
        assert_eq!(dropped(), before);
    }
    assert_eq!(dropped(), before + 1);
}

#[test]
fn finalizer_runs_for_owned_handles_only() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = Context::new();
    let log = Rc::clone(&seen);
    ctx.register_class(
        ClassBuilder::<Tracked>::new().finalizer(move |t: &mut Tracked| log.borrow_mut().push(t.id)),
    )
    .unwrap();

    let host = Obj::new(Tracked { id: 10 });
    drop(ctx.push_unowned(&host).unwrap());
    drop(ctx.push_owned(Obj::new(Tracked { id: 11 })).unwrap());
    assert_eq!(*seen.borrow(), vec![11]);
}

fn finalizing_context(seen: &Rc<RefCell<Vec<u32>>>) -> Context {
    let mut ctx = Context::new();
    let log = Rc::clone(seen);
    ctx.register_class(
        ClassBuilder::<Tracked>::new().finalizer(move |t: &mut Tracked| log.borrow_mut().push(t.id)),
    )
    .unwrap();
    ctx.register_function("tick", || ()).unwrap();
    ctx
}

#[test]
fn finalizer_waits_for_a_host_borrow() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = finalizing_context(&seen);

    let obj = Obj::new(Tracked { id: 7 });
    ctx.set_global("res", obj.clone()).unwrap();
    let guard = obj.borrow().unwrap();
    ctx.set_global("res", Value::Nil).unwrap();
    assert!(seen.borrow().is_empty());
    assert_eq!(ctx.state().identity().deferred(), 1);
    assert_eq!(guard.id, 7);

    drop(guard);
    ctx.call::<()>("tick", ()).unwrap();
    assert_eq!(*seen.borrow(), vec![7]);
    assert_eq!(ctx.state().identity().deferred(), 0);
    assert_eq!(ctx.run_deferred_finalizers(), 0);
}

#[test]
fn deferred_finalizer_runs_at_teardown() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = finalizing_context(&seen);

    let obj = Obj::new(Tracked { id: 8 });
    ctx.set_global("res", obj.clone()).unwrap();
    let guard = obj.borrow().unwrap();
    ctx.set_global("res", Value::Nil).unwrap();
    drop(guard);
    assert!(seen.borrow().is_empty());

    drop(ctx);
    assert_eq!(*seen.borrow(), vec![8]);
}

#[test]
fn access_after_host_drop_is_expired() {
    let mut ctx = tracked_context();
    let host = Obj::new(Tracked { id: 5 });
    let handle = ctx.push_unowned(&host).unwrap();
    let id: u32 = ctx.call_method(&handle, "id", ()).unwrap();
    assert_eq!(id, 5);

    drop(host);
    let err = ctx.call_method::<u32>(&handle, "id", ()).unwrap_err();
    assert!(matches!(
        err.root(),
        ScriptError::Conversion(ConversionError::Expired { .. })
    ));
}

// =============================================================================
// Wrappers and shared cells
// =============================================================================

struct Pooled(Tracked);

impl ObjectWrapper for Pooled {
    type Target = Tracked;

    fn get(&self) -> &Tracked {
        &self.0
    }

    fn get_mut(&mut self) -> &mut Tracked {
        &mut self.0
    }
}

#[test]
fn wrappers_surface_as_their_target_class() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let mut ctx = Context::new();
    ctx.register_class(
        ClassBuilder::<Tracked>::new()
            .method("id", |t: &Tracked| t.id)
            .finalizer(move |t: &mut Tracked| log.borrow_mut().push(t.id)),
    )
    .unwrap();
    ctx.install(
        Module::root()
            .function("boxed", |id: u32| Wrapped(Box::new(Tracked { id })))
            .function("pooled", |id: u32| Wrapped(Pooled(Tracked { id }))),
    )
    .unwrap();

    let boxed: Value = ctx.call("boxed", 3).unwrap();
    let pooled: Value = ctx.call("pooled", 20).unwrap();
    assert!(ctx.is_of_type::<Tracked>(&boxed, true));
    assert!(ctx.is_of_type::<Tracked>(&pooled, true));
    let a: u32 = ctx.call_method(&boxed, "id", ()).unwrap();
    let b: u32 = ctx.call_method(&pooled, "id", ()).unwrap();
    assert_eq!((a, b), (3, 20));

    drop(boxed);
    drop(pooled);
    assert_eq!(*seen.borrow(), vec![3, 20]);
}

#[test]
fn shared_cells_keep_their_identity() {
    let mut ctx = tracked_context();
    let shared = Rc::new(RefCell::new(Tracked { id: 4 }));
    let keep = Rc::clone(&shared);
    ctx.register_function("shared", move || Rc::clone(&keep))
        .unwrap();

    let a: Value = ctx.call("shared", ()).unwrap();
    let b: Value = ctx.call("shared", ()).unwrap();
    assert!(a.raw_equal(&b));

    shared.borrow_mut().id = 9;
    let id: u32 = ctx.call_method(&a, "id", ()).unwrap();
    assert_eq!(id, 9);
}

// =============================================================================
// Instance storage
// =============================================================================

#[test]
fn unknown_fields_go_to_instance_storage() {
    let mut ctx = game_context();
    let a = ctx.push_owned(Obj::new(Vec3::default())).unwrap();
    let b = ctx.push_owned(Obj::new(Vec3::default())).unwrap();
    let vm = ctx.vm_mut();
    vm.set_field(&a, "tag", Value::string("first")).unwrap();
    assert_eq!(vm.get_field(&a, "tag").unwrap(), Value::string("first"));
    assert!(vm.get_field(&b, "tag").unwrap().is_nil());
}

#[test]
fn storage_follows_the_deduplicated_handle() {
    let mut ctx = game_context();
    let v = Obj::new(Vec3::default());
    let first = ctx.push_owned(v.clone()).unwrap();
    ctx.vm_mut()
        .set_field(&first, "visits", Value::Integer(1))
        .unwrap();
    let second = ctx.push_owned(v).unwrap();
    assert_eq!(
        ctx.vm_mut().get_field(&second, "visits").unwrap(),
        Value::Integer(1)
    );
}

// =============================================================================
// Retyping
// =============================================================================

#[test]
fn pushing_as_a_derived_type_retypes_the_handle() {
    let mut ctx = game_context();
    let player = Obj::new(Player {
        entity: Entity {
            name: "ada".into(),
            ..Entity::default()
        },
        score: 10,
    });

    // An owned handle recorded as the base type.
    let view = ctx.push_unowned(&player).unwrap();
    let (as_entity, cost) = ctx.state().convert::<Entity>(&view).unwrap();
    assert_eq!(cost, Cost::new(1));
    let base_handle = ctx.push_owned(as_entity).unwrap();
    assert!(ctx.is_of_type::<Entity>(&base_handle, true));
    let kind: String = ctx.call_method(&base_handle, "kind", ()).unwrap();
    assert_eq!(kind, "entity");

    // Pushing the same object as the derived type reuses and retypes the handle.
    let derived_handle = ctx.push_owned(player.clone()).unwrap();
    assert!(derived_handle.raw_equal(&base_handle));
    assert!(ctx.is_of_type::<Player>(&base_handle, true));
    let kind: String = ctx.call_method(&base_handle, "kind", ()).unwrap();
    assert_eq!(kind, "player");

    // Pushing it as the base again keeps the more derived type.
    let (again, _) = ctx.state().convert::<Entity>(&derived_handle).unwrap();
    let same = ctx.push_owned(again).unwrap();
    assert!(same.raw_equal(&base_handle));
    assert!(ctx.is_of_type::<Player>(&same, true));
}
