//! The `scriptbind` helper table: script classes and type queries.

use scriptbind::{Function, Obj, Table, Value, Vm};

use super::common::{Entity, Player, Vec3, game_context};

fn new_class(vm: &mut Vm, class: &Function, bases: &[&Table]) -> Table {
    let args = bases.iter().map(|t| Value::Table((*t).clone())).collect();
    let out = vm.call_function(class, args).unwrap();
    out[0].as_table().cloned().unwrap()
}

#[test]
fn script_class_with_init_and_methods() {
    let mut ctx = game_context();
    let class: Function = ctx.get_global("scriptbind.class").unwrap();
    let vm = ctx.vm_mut();

    let counter = new_class(vm, &class, &[]);
    counter.set(
        "__init",
        Function::new("Counter.__init", |vm: &mut Vm, args: Vec<Value>| {
            let start = args.get(1).cloned().unwrap_or(Value::Integer(0));
            vm.set_field(&args[0], "count", start)?;
            Ok(vec![])
        }),
    );
    counter.set(
        "bump",
        Function::new("Counter.bump", |vm: &mut Vm, args: Vec<Value>| {
            let count = vm.get_field(&args[0], "count")?;
            let next = vm.arith(scriptbind::MetaMethod::Add, &count, &Value::Integer(1))?;
            vm.set_field(&args[0], "count", next.clone())?;
            Ok(vec![next])
        }),
    );

    let c = vm
        .call(&Value::Table(counter), vec![Value::Integer(10)])
        .unwrap()
        .remove(0);
    vm.call_method(&c, "bump", vec![]).unwrap();
    let out = vm.call_method(&c, "bump", vec![]).unwrap();
    assert_eq!(out, vec![Value::Integer(12)]);
}

#[test]
fn script_classes_inherit_from_script_classes() {
    let mut ctx = game_context();
    let class: Function = ctx.get_global("scriptbind.class").unwrap();
    let is_instance: Function = ctx.get_global("scriptbind.isInstanceOf").unwrap();
    let vm = ctx.vm_mut();

    let shape = new_class(vm, &class, &[]);
    shape.set("sides", 0);
    shape.set("name", "shape");
    let square = new_class(vm, &class, &[&shape]);
    square.set("sides", 4);

    let sq = vm.call(&Value::Table(square.clone()), vec![]).unwrap().remove(0);
    assert_eq!(vm.get_field(&sq, "sides").unwrap(), Value::Integer(4));
    assert_eq!(vm.get_field(&sq, "name").unwrap(), Value::string("shape"));

    let yes = vm
        .call_function(&is_instance, vec![sq.clone(), Value::Table(shape.clone())])
        .unwrap();
    assert_eq!(yes, vec![Value::Boolean(true)]);

    let plain = vm.call(&Value::Table(shape), vec![]).unwrap().remove(0);
    let no = vm
        .call_function(&is_instance, vec![plain, Value::Table(square)])
        .unwrap();
    assert_eq!(no, vec![Value::Boolean(false)]);
}

#[test]
fn helpers_understand_host_classes() {
    let mut ctx = game_context();
    let entity: Table = ctx.get_global("Entity").unwrap();
    let player: Table = ctx.get_global("Player").unwrap();
    let vec3: Table = ctx.get_global("Vec3").unwrap();

    assert!(scriptbind::is_base_of(&entity, &player));
    assert!(!scriptbind::is_base_of(&player, &entity));

    let p = ctx
        .push_owned(Obj::new(Player {
            entity: Entity::default(),
            score: 0,
        }))
        .unwrap();
    assert!(scriptbind::is_instance_of(ctx.vm(), &p, &entity));
    assert!(scriptbind::is_instance_of(ctx.vm(), &p, &player));
    assert!(!scriptbind::is_instance_of(ctx.vm(), &p, &vec3));

    let v = ctx.push_owned(Obj::new(Vec3::default())).unwrap();
    let is_instance: Function = ctx.get_global("scriptbind.isInstanceOf").unwrap();
    let out = ctx
        .vm_mut()
        .call_function(&is_instance, vec![v, Value::Table(vec3)])
        .unwrap();
    assert_eq!(out, vec![Value::Boolean(true)]);
}

#[test]
fn script_class_can_extend_a_host_class_table() {
    let mut ctx = game_context();
    let class: Function = ctx.get_global("scriptbind.class").unwrap();
    let entity: Table = ctx.get_global("Entity").unwrap();
    let vm = ctx.vm_mut();

    let npc = new_class(vm, &class, &[&entity]);
    assert!(scriptbind::is_base_of(&entity, &npc));
    assert!(!npc.get("describe").is_nil());
    assert!(npc.get("__typeID").is_nil());
    assert!(npc.get("__newindex").is_nil());
    assert!(!npc.get("__index").raw_equal(&entity.get("__index")));
}
