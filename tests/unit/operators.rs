//! Operators registered on classes and dispatched through metamethods.

use scriptbind::{Context, MetaMethod, Obj, Value};

use super::common::{Vec3, vec3_class};

fn context() -> Context {
    let mut ctx = Context::new();
    ctx.register_class(
        vec3_class()
            .operator_fn(MetaMethod::Mul, |s: f64, v: Vec3| {
                Vec3::new(v.x * s, v.y * s, v.z * s)
            })
            .operator(MetaMethod::Unm, |v: &Vec3| Vec3::new(-v.x, -v.y, -v.z))
            .operator(MetaMethod::Len, |_: &Vec3| 3)
            .operator(MetaMethod::Lt, |a: &Vec3, b: Vec3| a.length() < b.length()),
    )
    .unwrap();
    ctx
}

fn vec(ctx: &Context, x: f64, y: f64, z: f64) -> Value {
    ctx.push_owned(Obj::new(Vec3::new(x, y, z))).unwrap()
}

fn read(ctx: &Context, value: &Value) -> Vec3 {
    let (obj, _) = ctx.state().convert::<Vec3>(value).unwrap();
    let v = *obj.borrow().unwrap();
    v
}

#[test]
fn addition_of_two_objects() {
    let mut ctx = context();
    let a = vec(&ctx, 1.0, 2.0, 3.0);
    let b = vec(&ctx, 4.0, 5.0, 6.0);
    let sum = ctx.vm_mut().arith(MetaMethod::Add, &a, &b).unwrap();
    assert_eq!(read(&ctx, &sum), Vec3::new(5.0, 7.0, 9.0));
}

#[test]
fn scaling_works_in_both_operand_orders() {
    let mut ctx = context();
    let v = vec(&ctx, 1.0, 2.0, 3.0);
    let right = ctx
        .vm_mut()
        .arith(MetaMethod::Mul, &v, &Value::Integer(2))
        .unwrap();
    let left = ctx
        .vm_mut()
        .arith(MetaMethod::Mul, &Value::Number(0.5), &v)
        .unwrap();
    assert_eq!(read(&ctx, &right), Vec3::new(2.0, 4.0, 6.0));
    assert_eq!(read(&ctx, &left), Vec3::new(0.5, 1.0, 1.5));
}

#[test]
fn unsupported_operand_is_reported() {
    let mut ctx = context();
    let v = vec(&ctx, 1.0, 2.0, 3.0);
    let err = ctx
        .vm_mut()
        .arith(MetaMethod::Add, &v, &Value::Integer(1))
        .unwrap_err();
    assert!(err.is_no_overload_match(), "{err}");
    assert!(err.to_string().contains("__add"), "{err}");

    let err = ctx
        .vm_mut()
        .arith(MetaMethod::Sub, &v, &v)
        .unwrap_err();
    assert!(err.to_string().contains("perform arithmetic on a userdata value"), "{err}");
}

#[test]
fn unary_minus_and_length() {
    let mut ctx = context();
    let v = vec(&ctx, 1.0, -2.0, 3.0);
    let neg = ctx.vm_mut().arith(MetaMethod::Unm, &v, &v).unwrap();
    assert_eq!(read(&ctx, &neg), Vec3::new(-1.0, 2.0, -3.0));
    assert_eq!(ctx.vm_mut().len(&v).unwrap(), Value::Integer(3));
}

#[test]
fn equality_compares_contents() {
    let mut ctx = context();
    let a = vec(&ctx, 1.0, 2.0, 3.0);
    let b = vec(&ctx, 1.0, 2.0, 3.0);
    let c = vec(&ctx, 0.0, 0.0, 0.0);
    let vm = ctx.vm_mut();
    assert!(vm.compare(MetaMethod::Eq, &a, &b).unwrap());
    assert!(!vm.compare(MetaMethod::Eq, &a, &c).unwrap());
    // Mixed kinds never reach `__eq`.
    assert!(!vm.compare(MetaMethod::Eq, &a, &Value::Integer(1)).unwrap());
}

#[test]
fn ordering_uses_lt() {
    let mut ctx = context();
    let short = vec(&ctx, 1.0, 0.0, 0.0);
    let long = vec(&ctx, 0.0, 5.0, 0.0);
    let vm = ctx.vm_mut();
    assert!(vm.compare(MetaMethod::Lt, &short, &long).unwrap());
    assert!(!vm.compare(MetaMethod::Lt, &long, &short).unwrap());
}

#[test]
fn tostring_formats_the_object() {
    let mut ctx = context();
    let v = vec(&ctx, 1.0, 2.0, 3.0);
    assert_eq!(ctx.vm_mut().to_string(&v).unwrap(), "Vec3(1, 2, 3)");
}

#[test]
fn operators_are_plain_class_entries() {
    let mut ctx = context();
    let v = vec(&ctx, 2.0, 0.0, 0.0);
    let doubled: Vec3 = ctx.call_method(&v, "__mul", 2.0).unwrap();
    assert_eq!(doubled, Vec3::new(4.0, 0.0, 0.0));
}
