//! Value conversion between host types and dynamic values.

use std::borrow::Cow;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use scriptbind::{
    ContextState, ConversionError, Context, Cost, Enum, FromScript, HostError, IntoScript,
    Module, MultiValue, ScriptError, ScriptIter, ScriptResult, Table, Value, Variant2, Variant3,
};

/// A user type marshaled as a `{x, y}` table rather than a handle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl FromScript for Point {
    fn score(value: &Value, _: &ContextState) -> Cost {
        match value.as_table() {
            Some(t) if t.len() == 2 => Cost::EXACT,
            _ => Cost::IMPOSSIBLE,
        }
    }

    fn from_script(value: &Value, state: &ContextState) -> Result<Self, ConversionError> {
        let table = value
            .as_table()
            .ok_or_else(|| ConversionError::mismatch("Point", value.type_name()))?;
        if table.len() != 2 {
            return Err(ConversionError::failure(
                "Point",
                format!("expected 2 components, got {}", table.len()),
            ));
        }
        Ok(Point {
            x: f64::from_script(&table.get_index(1), state)?,
            y: f64::from_script(&table.get_index(2), state)?,
        })
    }

    fn type_label() -> Cow<'static, str> {
        "Point".into()
    }
}

impl IntoScript for Point {
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        Ok(Value::Table(Table::from_sequence([
            Value::Number(self.x),
            Value::Number(self.y),
        ])))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
enum Team {
    Red = 1,
    Blue = 2,
}

fn context() -> Context {
    let mut ctx = Context::new();
    ctx.install(
        Module::root()
            .function("mirror", |p: Point| Point { x: -p.x, y: p.y })
            .function("sum", |xs: Vec<i64>| xs.iter().sum::<i64>())
            .function("maybe", |x: Option<i64>| x.map(|v| v * 2))
            .function("pick", |v: Variant3<i64, f64, String>| match v {
                Variant3::A(i) => format!("int {}", i),
                Variant3::B(f) => format!("float {}", f),
                Variant3::C(s) => format!("string {}", s),
            })
            .function("opponent", |t: Enum<Team>| match t.into_inner() {
                Team::Red => Enum(Team::Blue),
                Team::Blue => Enum(Team::Red),
            })
            .function("parse", |s: String| {
                s.parse::<i64>().map_err(|e| {
                    HostError::new("parse failed")
                        .with_description(e.to_string())
                        .with_category("input")
                })
            })
            .function("split", |s: String| {
                let (a, b) = s.split_once(',').unwrap_or((s.as_str(), ""));
                (a.to_string(), b.to_string())
            })
            .function("words", |s: String| {
                let words: Vec<String> = s.split_whitespace().map(str::to_string).collect();
                ScriptIter(words.into_iter())
            })
            .function("byte", |b: u8| b),
    )
    .unwrap();
    ctx
}

// =============================================================================
// User value converters
// =============================================================================

#[test]
fn value_converter_round_trip() {
    let mut ctx = context();
    let p: Point = ctx.call("mirror", Point { x: 1.5, y: -2.0 }).unwrap();
    assert_eq!(p, Point { x: -1.5, y: -2.0 });
}

#[test]
fn value_converter_failure_is_a_conversion_error() {
    let mut ctx = context();
    let err = ctx.get_global::<Point>("package").unwrap_err();
    assert!(err.is_conversion());

    ctx.set_global("bad", Table::from_sequence([Value::string("a"), Value::Nil]))
        .unwrap();
    let err = ctx.get_global::<Point>("bad").unwrap_err();
    assert!(err.is_conversion());
}

// =============================================================================
// Containers
// =============================================================================

#[test]
fn vectors_read_sequence_tables() {
    let mut ctx = context();
    let seq = Table::from_sequence([Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
    let total: i64 = ctx.call("sum", seq).unwrap();
    assert_eq!(total, 6);

    let mixed = Table::from_sequence([Value::Integer(1), Value::Boolean(true)]);
    let err = ctx.call::<i64>("sum", mixed).unwrap_err();
    assert!(err.is_no_overload_match());
}

#[test]
fn vectors_push_sequence_tables() {
    let mut ctx = context();
    ctx.set_global("list", vec!["a", "b"]).unwrap();
    let back: Vec<String> = ctx.get_global("list").unwrap();
    assert_eq!(back, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn options_map_to_nil() {
    let mut ctx = context();
    let some: Option<i64> = ctx.call("maybe", 4).unwrap();
    let none: Option<i64> = ctx.call("maybe", Value::Nil).unwrap();
    assert_eq!(some, Some(8));
    assert_eq!(none, None);
}

#[test]
fn variants_take_the_cheapest_alternative() {
    let mut ctx = context();
    let a: String = ctx.call("pick", 3).unwrap();
    let b: String = ctx.call("pick", 2.5).unwrap();
    let c: String = ctx.call("pick", "x").unwrap();
    assert_eq!(a, "int 3");
    assert_eq!(b, "float 2.5");
    assert_eq!(c, "string x");
}

#[test]
fn variants_read_back_on_the_host() {
    let mut ctx = context();
    ctx.set_global("v", 1.25).unwrap();
    let v: Variant2<i64, f64> = ctx.get_global("v").unwrap();
    assert_eq!(v, Variant2::B(1.25));
}

#[test]
fn enums_marshal_as_integers() {
    let mut ctx = context();
    let t: Enum<Team> = ctx.call("opponent", Enum(Team::Red)).unwrap();
    assert_eq!(t.into_inner(), Team::Blue);

    let err = ctx.call::<Enum<Team>>("opponent", 7).unwrap_err();
    assert!(err.is_no_overload_match() || err.is_conversion(), "{err}");
}

#[test]
fn integer_range_is_checked() {
    let mut ctx = context();
    let b: u8 = ctx.call("byte", 255).unwrap();
    assert_eq!(b, 255);
    let err = ctx.call::<u8>("byte", 256).unwrap_err();
    assert!(err.is_no_overload_match());
}

// =============================================================================
// Errors and multiple returns
// =============================================================================

#[test]
fn host_errors_return_nil_and_a_table() {
    let mut ctx = context();
    let (value, err): (Option<i64>, Option<HostError>) = ctx.call("parse", "42").unwrap();
    assert_eq!(value, Some(42));
    assert!(err.is_none());

    let (value, err): (Option<i64>, Option<HostError>) = ctx.call("parse", "nope").unwrap();
    assert_eq!(value, None);
    let err = err.unwrap();
    assert_eq!(err.message, "parse failed");
    assert_eq!(err.category.as_deref(), Some("input"));
    assert!(err.description.is_some());
    assert!(err.file.is_none());
}

#[test]
fn host_error_fields_are_optional() {
    let mut ctx = context();
    let table = Table::new();
    table.set("message", "only a message");
    ctx.set_global("e", table).unwrap();
    let err: HostError = ctx.get_global("e").unwrap();
    assert_eq!(err, HostError::new("only a message"));
}

#[test]
fn tuples_return_multiple_values() {
    let mut ctx = context();
    let MultiValue(values) = ctx.call("split", "left,right").unwrap();
    assert_eq!(values, vec![Value::string("left"), Value::string("right")]);
}

#[test]
fn iterators_yield_until_nil() {
    let mut ctx = context();
    let iter: Value = ctx.call("words", "a bb ccc").unwrap();
    let vm = ctx.vm_mut();
    let mut seen = Vec::new();
    loop {
        let out = vm.call(&iter, vec![]).unwrap();
        match out.into_iter().next() {
            Some(Value::String(s)) => seen.push(s.to_string()),
            _ => break,
        }
    }
    assert_eq!(seen, vec!["a", "bb", "ccc"]);
}

#[test]
fn script_results_raise() {
    let mut ctx = Context::new();
    ctx.register_function("fail", || -> ScriptResult<i64> {
        Err(ScriptError::runtime("boom"))
    })
    .unwrap();
    let err = ctx.call::<i64>("fail", ()).unwrap_err();
    assert!(err.is_runtime());
    assert!(err.to_string().contains("boom"));
}
